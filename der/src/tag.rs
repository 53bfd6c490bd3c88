use std::fmt::{Display, Formatter};

/// ASN.1 identifier octet.
///
/// Only single-byte tags are representable: tag numbers of 31 and above use
/// the multi-byte form, which the parser rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

const CONSTRUCTED: u8 = 0x20;
const CONTEXT_SPECIFIC: u8 = 0x80;

impl Tag {
    pub const END_OF_CONTENTS: Tag = Tag(0x00);
    pub const BOOLEAN: Tag = Tag(0x01);
    pub const INTEGER: Tag = Tag(0x02);
    pub const BIT_STRING: Tag = Tag(0x03);
    pub const OCTET_STRING: Tag = Tag(0x04);
    pub const NULL: Tag = Tag(0x05);
    pub const OBJECT_IDENTIFIER: Tag = Tag(0x06);
    pub const UTF8_STRING: Tag = Tag(0x0c);
    pub const PRINTABLE_STRING: Tag = Tag(0x13);
    pub const T61_STRING: Tag = Tag(0x14);
    pub const IA5_STRING: Tag = Tag(0x16);
    pub const UTC_TIME: Tag = Tag(0x17);
    pub const GENERALIZED_TIME: Tag = Tag(0x18);
    pub const UNIVERSAL_STRING: Tag = Tag(0x1c);
    pub const BMP_STRING: Tag = Tag(0x1e);
    pub const SEQUENCE: Tag = Tag(0x30);
    pub const SET: Tag = Tag(0x31);

    pub const fn new(byte: u8) -> Self {
        Tag(byte)
    }

    /// Context-specific tag `[number]`.
    pub const fn context(number: u8, constructed: bool) -> Self {
        let form = if constructed { CONSTRUCTED } else { 0 };
        Tag(CONTEXT_SPECIFIC | form | (number & 0x1f))
    }

    pub const fn byte(self) -> u8 {
        self.0
    }

    pub const fn number(self) -> u8 {
        self.0 & 0x1f
    }

    pub const fn is_constructed(self) -> bool {
        self.0 & CONSTRUCTED != 0
    }

    pub fn class(self) -> TagClass {
        match self.0 >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    pub fn is_context(self, number: u8) -> bool {
        self.class() == TagClass::ContextSpecific && self.number() == number
    }

    /// Same class and number with the given form.
    pub const fn with_constructed(self, constructed: bool) -> Self {
        if constructed {
            Tag(self.0 | CONSTRUCTED)
        } else {
            Tag(self.0 & !CONSTRUCTED)
        }
    }
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        Tag(value)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            Tag::END_OF_CONTENTS => "END-OF-CONTENTS",
            Tag::BOOLEAN => "BOOLEAN",
            Tag::INTEGER => "INTEGER",
            Tag::BIT_STRING => "BIT STRING",
            Tag::OCTET_STRING => "OCTET STRING",
            Tag::NULL => "NULL",
            Tag::OBJECT_IDENTIFIER => "OBJECT IDENTIFIER",
            Tag::UTF8_STRING => "UTF8String",
            Tag::PRINTABLE_STRING => "PrintableString",
            Tag::T61_STRING => "T61String",
            Tag::IA5_STRING => "IA5String",
            Tag::UTC_TIME => "UTCTime",
            Tag::GENERALIZED_TIME => "GeneralizedTime",
            Tag::UNIVERSAL_STRING => "UniversalString",
            Tag::BMP_STRING => "BMPString",
            Tag::SEQUENCE => "SEQUENCE",
            Tag::SET => "SET",
            tag => {
                return match tag.class() {
                    TagClass::ContextSpecific => write!(f, "[{}]", tag.number()),
                    TagClass::Application => write!(f, "[APPLICATION {}]", tag.number()),
                    TagClass::Private => write!(f, "[PRIVATE {}]", tag.number()),
                    TagClass::Universal => write!(f, "tag {:#04x}", tag.0),
                };
            }
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Tag, TagClass};

    #[rstest(
        byte,
        class,
        constructed,
        number,
        case(0x02, TagClass::Universal, false, 2),
        case(0x30, TagClass::Universal, true, 16),
        case(0xa0, TagClass::ContextSpecific, true, 0),
        case(0x81, TagClass::ContextSpecific, false, 1),
        case(0x61, TagClass::Application, true, 1),
        case(0xc4, TagClass::Private, false, 4)
    )]
    fn test_tag_fields(byte: u8, class: TagClass, constructed: bool, number: u8) {
        let tag = Tag::new(byte);
        assert_eq!(class, tag.class());
        assert_eq!(constructed, tag.is_constructed());
        assert_eq!(number, tag.number());
    }

    #[rstest(
        number,
        constructed,
        expected,
        case(0, true, 0xa0),
        case(1, true, 0xa1),
        case(0, false, 0x80)
    )]
    fn test_context_tag(number: u8, constructed: bool, expected: u8) {
        assert_eq!(expected, Tag::context(number, constructed).byte());
    }

    #[test]
    fn test_display() {
        assert_eq!("SEQUENCE", Tag::SEQUENCE.to_string());
        assert_eq!("[0]", Tag::context(0, true).to_string());
    }
}
