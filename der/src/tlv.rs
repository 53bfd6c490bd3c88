use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::oid::ObjectIdentifier;
use crate::parse::{encode_length, parse_node};
use crate::reader::SequenceReader;
use crate::set_of::sort_canonical;
use crate::tag::Tag;

/// One tag-length-value node.
///
/// `content` holds the content octets. A primitive node keeps the bytes as
/// read. A constructed node holds the definite encodings of its children,
/// whatever lengths the input used at any depth, so `to_der` always yields
/// a definite-length encoding.
///
/// Equality is structural: constructed nodes compare their children,
/// primitive nodes their content.
#[derive(Debug, Clone)]
pub struct Tlv {
    tag: Tag,
    content: Vec<u8>,
    children: Vec<Tlv>,
}

impl PartialEq for Tlv {
    fn eq(&self, other: &Self) -> bool {
        if self.tag != other.tag {
            return false;
        }
        if self.tag.is_constructed() {
            self.children == other.children
        } else {
            self.content == other.content
        }
    }
}

impl Eq for Tlv {}

/// Decodes the TLV starting at `offset`.
///
/// Returns the node and the number of bytes it occupies.
pub fn decode_tlv(bytes: &[u8], offset: usize) -> Result<(Tlv, usize)> {
    decode_tlv_with_limits(bytes, offset, &Limits::default())
}

pub fn decode_tlv_with_limits(bytes: &[u8], offset: usize, limits: &Limits) -> Result<(Tlv, usize)> {
    let input = bytes.get(offset..).ok_or(Error::Truncated)?;
    let (rest, tlv) = Tlv::parse_with_limits(input, limits)?;
    Ok((tlv, input.len() - rest.len()))
}

/// Encodes `content` under `tag` with a minimal definite length.
pub fn encode_tlv(tag: Tag, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    out.push(tag.byte());
    encode_length(content.len(), &mut out);
    out.extend_from_slice(content);
    out
}

impl Tlv {
    pub(crate) fn from_parts(tag: Tag, content: Vec<u8>, children: Vec<Tlv>) -> Self {
        Tlv {
            tag,
            content,
            children,
        }
    }

    pub(crate) fn end_of_contents() -> Self {
        Tlv::from_parts(Tag::END_OF_CONTENTS, Vec::new(), Vec::new())
    }

    pub(crate) fn is_end_of_contents(&self) -> bool {
        self.tag == Tag::END_OF_CONTENTS && self.content.is_empty()
    }

    /// Parses one TLV from the front of `input` with the default limits.
    pub fn parse(input: &[u8]) -> Result<(&[u8], Tlv)> {
        Self::parse_with_limits(input, &Limits::default())
    }

    pub fn parse_with_limits<'a>(input: &'a [u8], limits: &Limits) -> Result<(&'a [u8], Tlv)> {
        let (rest, tlv) = parse_node(input, 0, limits)?;
        if tlv.is_end_of_contents() {
            return Err(Error::UnexpectedEndOfContents);
        }
        if input.len() - rest.len() > limits.max_size {
            return Err(Error::TooLarge(limits.max_size));
        }
        Ok((rest, tlv))
    }

    /// Parses `input`, which must hold exactly one TLV.
    pub fn from_bytes(input: &[u8]) -> Result<Tlv> {
        Self::from_bytes_with_limits(input, &Limits::default())
    }

    pub fn from_bytes_with_limits(input: &[u8], limits: &Limits) -> Result<Tlv> {
        let (rest, tlv) = Self::parse_with_limits(input, limits)?;
        if !rest.is_empty() {
            return Err(Error::TrailingData(rest.len()));
        }
        Ok(tlv)
    }

    pub fn primitive(tag: Tag, content: Vec<u8>) -> Self {
        Tlv::from_parts(tag.with_constructed(false), content, Vec::new())
    }

    pub fn constructed(tag: Tag, children: Vec<Tlv>) -> Self {
        let mut content = Vec::new();
        for child in &children {
            child.write_der(&mut content);
        }
        Tlv::from_parts(tag.with_constructed(true), content, children)
    }

    pub fn sequence(children: Vec<Tlv>) -> Self {
        Tlv::constructed(Tag::SEQUENCE, children)
    }

    /// SET OF with the elements in canonical (sorted encoding) order.
    pub fn set_of(mut children: Vec<Tlv>) -> Self {
        sort_canonical(&mut children);
        Tlv::constructed(Tag::SET, children)
    }

    /// `[number] EXPLICIT` wrapper around `inner`.
    pub fn explicit(number: u8, inner: Tlv) -> Self {
        Tlv::constructed(Tag::context(number, true), vec![inner])
    }

    /// Replaces the tag by `[number]`, keeping the encoding form.
    pub fn implicit(self, number: u8) -> Self {
        let tag = Tag::context(number, self.tag.is_constructed());
        Tlv { tag, ..self }
    }

    /// Replaces the tag, keeping the encoding form.
    pub fn retagged(&self, tag: Tag) -> Self {
        Tlv {
            tag: tag.with_constructed(self.tag.is_constructed()),
            ..self.clone()
        }
    }

    pub fn octet_string(data: &[u8]) -> Self {
        Tlv::primitive(Tag::OCTET_STRING, data.to_vec())
    }

    pub fn null() -> Self {
        Tlv::primitive(Tag::NULL, Vec::new())
    }

    pub fn object_identifier(oid: &ObjectIdentifier) -> Self {
        Tlv::primitive(Tag::OBJECT_IDENTIFIER, oid.to_der_content())
    }

    pub fn small_integer(value: u64) -> Self {
        Tlv::unsigned_integer(&value.to_be_bytes())
    }

    /// INTEGER holding the unsigned big-endian `magnitude`.
    pub fn unsigned_integer(magnitude: &[u8]) -> Self {
        let skip = magnitude.iter().take_while(|&&b| b == 0).count();
        let significant = &magnitude[skip..];
        let mut content = Vec::with_capacity(significant.len() + 1);
        if significant.first().is_none_or(|&b| b & 0x80 != 0) {
            content.push(0);
        }
        content.extend_from_slice(significant);
        Tlv::primitive(Tag::INTEGER, content)
    }

    /// INTEGER with already encoded two's complement content.
    pub fn integer_from_content(content: &[u8]) -> Self {
        Tlv::primitive(Tag::INTEGER, content.to_vec())
    }

    pub fn bit_string(data: &[u8]) -> Self {
        let mut content = Vec::with_capacity(data.len() + 1);
        content.push(0);
        content.extend_from_slice(data);
        Tlv::primitive(Tag::BIT_STRING, content)
    }

    pub fn utf8_string(value: &str) -> Self {
        Tlv::primitive(Tag::UTF8_STRING, value.as_bytes().to_vec())
    }

    pub fn bmp_string(value: &str) -> Self {
        let content = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
        Tlv::primitive(Tag::BMP_STRING, content)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn length(&self) -> usize {
        self.content.len()
    }

    pub fn children(&self) -> &[Tlv] {
        &self.children
    }

    pub fn write_der(&self, out: &mut Vec<u8>) {
        out.push(self.tag.byte());
        encode_length(self.content.len(), out);
        out.extend_from_slice(&self.content);
    }

    pub fn to_der(&self) -> Vec<u8> {
        encode_tlv(self.tag, &self.content)
    }

    pub fn expect_tag(&self, tag: Tag) -> Result<&Self> {
        if self.tag != tag {
            return Err(Error::UnexpectedTag {
                expected: tag,
                actual: self.tag,
            });
        }
        Ok(self)
    }

    pub fn as_sequence(&self) -> Result<&[Tlv]> {
        Ok(&self.expect_tag(Tag::SEQUENCE)?.children)
    }

    pub fn as_set(&self) -> Result<&[Tlv]> {
        Ok(&self.expect_tag(Tag::SET)?.children)
    }

    /// Cursor over the elements of a SEQUENCE. `context` names the
    /// structure in error messages.
    pub fn sequence_reader(&self, context: &'static str) -> Result<SequenceReader<'_>> {
        Ok(SequenceReader::new(self.as_sequence()?, context))
    }

    /// Inner value of a `[number] EXPLICIT` wrapper.
    pub fn explicit_inner(&self, number: u8) -> Result<&Tlv> {
        let expected = Tag::context(number, true);
        self.expect_tag(expected)?;
        match self.children.as_slice() {
            [inner] => Ok(inner),
            [] => Err(Error::MissingElement("explicitly tagged value")),
            _ => Err(Error::TrailingElements("explicitly tagged value")),
        }
    }

    pub fn as_object_identifier(&self) -> Result<ObjectIdentifier> {
        ObjectIdentifier::from_der_content(&self.expect_tag(Tag::OBJECT_IDENTIFIER)?.content)
    }

    /// Raw two's complement content of an INTEGER.
    pub fn as_integer_content(&self) -> Result<&[u8]> {
        let content = &self.expect_tag(Tag::INTEGER)?.content;
        if content.is_empty() {
            return Err(Error::InvalidInteger("empty content"));
        }
        Ok(content)
    }

    /// Non-negative INTEGER that fits in 64 bits.
    pub fn as_u64(&self) -> Result<u64> {
        let content = self.as_integer_content()?;
        if content[0] & 0x80 != 0 {
            return Err(Error::InvalidInteger("negative value"));
        }
        let skip = content.iter().take_while(|&&b| b == 0).count();
        let significant = &content[skip..];
        if significant.len() > 8 {
            return Err(Error::InvalidInteger("value wider than 64 bits"));
        }
        Ok(significant.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Content octets of an OCTET STRING, flattening the BER constructed form.
    pub fn as_octet_string(&self) -> Result<Vec<u8>> {
        if self.tag.with_constructed(false) != Tag::OCTET_STRING {
            return Err(Error::UnexpectedTag {
                expected: Tag::OCTET_STRING,
                actual: self.tag,
            });
        }
        self.octets()
    }

    /// Content octets regardless of tag, for implicitly tagged strings.
    /// Constructed segments must themselves be OCTET STRINGs.
    pub fn octets(&self) -> Result<Vec<u8>> {
        if !self.tag.is_constructed() {
            return Ok(self.content.clone());
        }
        let mut out = Vec::new();
        for segment in &self.children {
            out.extend(segment.as_octet_string()?);
        }
        Ok(out)
    }

    /// Data bits of a BIT STRING with no unused bits.
    pub fn as_bit_string(&self) -> Result<&[u8]> {
        let content = &self.expect_tag(Tag::BIT_STRING)?.content;
        match content.split_first() {
            Some((0, data)) => Ok(data),
            Some(_) => Err(Error::InvalidBitString("unused bits are not supported")),
            None => Err(Error::InvalidBitString("empty content")),
        }
    }

    pub fn as_null(&self) -> Result<()> {
        if !self.expect_tag(Tag::NULL)?.content.is_empty() {
            return Err(Error::InvalidString("NULL with content".into()));
        }
        Ok(())
    }

    pub fn as_bmp_string(&self) -> Result<String> {
        let content = &self.expect_tag(Tag::BMP_STRING)?.content;
        decode_bmp(content)
    }

    /// Any of the character string types.
    pub fn as_string(&self) -> Result<String> {
        match self.tag {
            Tag::UTF8_STRING | Tag::PRINTABLE_STRING | Tag::IA5_STRING => {
                String::from_utf8(self.content.clone())
                    .map_err(|e| Error::InvalidString(e.to_string()))
            }
            // T61 is treated as Latin-1
            Tag::T61_STRING => Ok(self.content.iter().map(|&b| b as char).collect()),
            Tag::BMP_STRING => decode_bmp(&self.content),
            Tag::UNIVERSAL_STRING => {
                if self.content.len() % 4 != 0 {
                    return Err(Error::InvalidString("odd UniversalString length".into()));
                }
                self.content
                    .chunks_exact(4)
                    .map(|c| {
                        let code = u32::from_be_bytes([c[0], c[1], c[2], c[3]]);
                        char::from_u32(code)
                            .ok_or_else(|| Error::InvalidString(format!("code point {code:#x}")))
                    })
                    .collect()
            }
            actual => Err(Error::UnexpectedTag {
                expected: Tag::UTF8_STRING,
                actual,
            }),
        }
    }
}

fn decode_bmp(content: &[u8]) -> Result<String> {
    if content.len() % 2 != 0 {
        return Err(Error::InvalidString("odd BMPString length".into()));
    }
    let units: Vec<u16> = content
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| Error::InvalidString(e.to_string()))
}

impl DecodableFrom<&[u8]> for Tlv {}

impl Decoder<&[u8], Tlv> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<Tlv> {
        Tlv::from_bytes(self)
    }
}

impl DecodableFrom<Vec<u8>> for Tlv {}

impl Decoder<Vec<u8>, Tlv> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Tlv> {
        Tlv::from_bytes(self)
    }
}

impl EncodableTo<Tlv> for Vec<u8> {}

impl Encoder<Tlv, Vec<u8>> for Tlv {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_der())
    }
}

#[cfg(test)]
mod tests {
    use kura::decoder::Decoder;
    use kura::encoder::Encoder;
    use rstest::rstest;

    use super::{Tlv, decode_tlv};
    use crate::error::Error;
    use crate::limits::Limits;
    use crate::tag::Tag;

    #[rstest(input, tag, content,
        case(vec![0x02, 0x01, 0x01], Tag::INTEGER, vec![0x01]),
        case(vec![0x13, 0x02, 0x68, 0x69], Tag::PRINTABLE_STRING, vec![0x68, 0x69]),
        case(vec![0x0c, 0x04, 0xf0, 0x9f, 0x98, 0x8e], Tag::UTF8_STRING, vec![0xf0, 0x9f, 0x98, 0x8e]),
        case(vec![0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b], Tag::OBJECT_IDENTIFIER, vec![0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b]),
        case(vec![0x05, 0x00], Tag::NULL, vec![]),
        case(vec![0x04, 0x04, 0x03, 0x02, 0x06, 0xa0], Tag::OCTET_STRING, vec![0x03, 0x02, 0x06, 0xa0])
    )]
    fn test_tlv_parse_primitive(input: Vec<u8>, tag: Tag, content: Vec<u8>) {
        let actual: Tlv = input.decode().unwrap();
        assert_eq!(tag, actual.tag());
        assert_eq!(content, actual.content());
        assert!(actual.children().is_empty());
    }

    #[test]
    fn test_tlv_parse_structured() {
        let input = vec![0x30, 0x09, 0x02, 0x01, 0x07, 0x02, 0x01, 0x08, 0x02, 0x01, 0x09];
        let actual = Tlv::from_bytes(&input).unwrap();
        let values: Vec<u64> = actual
            .as_sequence()
            .unwrap()
            .iter()
            .map(|c| c.as_u64().unwrap())
            .collect();
        assert_eq!(vec![7, 8, 9], values);
        assert_eq!(input, actual.to_der());
    }

    #[rstest(size, case(127), case(128), case(255), case(256), case(65535), case(65536))]
    fn test_length_boundaries_roundtrip(size: usize) {
        let original = Tlv::octet_string(&vec![0x5a; size]);
        let encoded: Vec<u8> = original.encode().unwrap();
        let decoded = Tlv::from_bytes(&encoded).unwrap();
        assert_eq!(original, decoded);
        assert_eq!(size, decoded.length());
        assert_eq!(encoded, decoded.to_der());
    }

    #[test]
    fn test_indefinite_equals_definite() {
        let indefinite = vec![
            0x30, 0x80, 0x02, 0x01, 0x05, 0x04, 0x02, 0xaa, 0xbb, 0x00, 0x00,
        ];
        let definite = vec![0x30, 0x07, 0x02, 0x01, 0x05, 0x04, 0x02, 0xaa, 0xbb];

        let a = Tlv::from_bytes(&indefinite).unwrap();
        let b = Tlv::from_bytes(&definite).unwrap();
        assert_eq!(a, b);
        assert_eq!(definite, a.to_der());
    }

    #[test]
    fn test_nested_indefinite() {
        let input = vec![
            0x30, 0x80, 0xa0, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        let tlv = Tlv::from_bytes(&input).unwrap();
        let inner = tlv.as_sequence().unwrap()[0].explicit_inner(0).unwrap();
        assert_eq!(1, inner.as_u64().unwrap());
    }

    #[rstest]
    #[case::indefinite_inside_definite(
        vec![0x30, 0x80, 0x30, 0x04, 0x30, 0x80, 0x00, 0x00, 0x00, 0x00],
        vec![0x30, 0x04, 0x30, 0x02, 0x30, 0x00]
    )]
    #[case::definite_outer(
        vec![0x31, 0x06, 0xa0, 0x80, 0x05, 0x00, 0x00, 0x00],
        vec![0x31, 0x04, 0xa0, 0x02, 0x05, 0x00]
    )]
    #[case::long_form_length(
        vec![0x30, 0x81, 0x03, 0x02, 0x01, 0x05],
        vec![0x30, 0x03, 0x02, 0x01, 0x05]
    )]
    #[case::long_form_child(
        vec![0x30, 0x04, 0x04, 0x81, 0x01, 0xaa],
        vec![0x30, 0x03, 0x04, 0x01, 0xaa]
    )]
    fn test_to_der_is_definite_at_every_depth(#[case] input: Vec<u8>, #[case] expected: Vec<u8>) {
        let tlv = Tlv::from_bytes(&input).unwrap();
        assert_eq!(expected, tlv.to_der());
        assert_eq!(tlv, Tlv::from_bytes(&expected).unwrap());
    }

    #[rstest(input, case(vec![0x04, 0x80, 0x00, 0x00]))]
    fn test_indefinite_primitive_rejected(input: Vec<u8>) {
        assert!(matches!(
            Tlv::from_bytes(&input),
            Err(Error::IndefinitePrimitive(Tag::OCTET_STRING))
        ));
    }

    #[test]
    fn test_missing_end_of_contents() {
        let input = vec![0x30, 0x80, 0x02, 0x01, 0x05];
        assert!(matches!(Tlv::from_bytes(&input), Err(Error::MissingEndOfContents)));
    }

    #[test]
    fn test_length_exceeds_buffer() {
        let input = vec![0x04, 0x05, 0x01, 0x02];
        assert!(matches!(
            Tlv::from_bytes(&input),
            Err(Error::LengthOverflow { length: 5, remaining: 2 })
        ));
    }

    #[test]
    fn test_children_must_consume_content() {
        // the inner INTEGER claims 2 bytes but the SEQUENCE only holds 1
        let input = vec![0x30, 0x03, 0x02, 0x02, 0x01];
        assert!(Tlv::from_bytes(&input).is_err());
    }

    #[test]
    fn test_trailing_data() {
        let input = vec![0x05, 0x00, 0x05, 0x00];
        assert!(matches!(Tlv::from_bytes(&input), Err(Error::TrailingData(2))));
    }

    #[test]
    fn test_decode_tlv_at_offset() {
        let input = vec![0x05, 0x00, 0x02, 0x01, 0x2a, 0xff];
        let (tlv, consumed) = decode_tlv(&input, 2).unwrap();
        assert_eq!(3, consumed);
        assert_eq!(42, tlv.as_u64().unwrap());
    }

    #[test]
    fn test_nesting_limit() {
        let mut input = Vec::new();
        for _ in 0..10 {
            input.extend_from_slice(&[0x30, 0x80]);
        }
        for _ in 0..10 {
            input.extend_from_slice(&[0x00, 0x00]);
        }
        let limits = Limits {
            max_depth: 4,
            ..Limits::default()
        };
        assert!(matches!(
            Tlv::from_bytes_with_limits(&input, &limits),
            Err(Error::NestingTooDeep(4))
        ));
        assert!(Tlv::from_bytes(&input).is_ok());
    }

    #[test]
    fn test_size_limit() {
        let input = Tlv::octet_string(&[0u8; 64]).to_der();
        let limits = Limits {
            max_size: 32,
            ..Limits::default()
        };
        assert!(matches!(
            Tlv::from_bytes_with_limits(&input, &limits),
            Err(Error::TooLarge(32))
        ));
    }

    #[test]
    fn test_constructed_octet_string_is_flattened() {
        let input = vec![
            0x24, 0x80, 0x04, 0x02, 0x01, 0x02, 0x04, 0x01, 0x03, 0x00, 0x00,
        ];
        let tlv = Tlv::from_bytes(&input).unwrap();
        assert_eq!(vec![1, 2, 3], tlv.as_octet_string().unwrap());
    }

    #[rstest(magnitude, expected,
        case(vec![0x00], vec![0x02, 0x01, 0x00]),
        case(vec![0x7f], vec![0x02, 0x01, 0x7f]),
        case(vec![0x80], vec![0x02, 0x02, 0x00, 0x80]),
        case(vec![0x00, 0x00, 0x01, 0x00], vec![0x02, 0x02, 0x01, 0x00])
    )]
    fn test_unsigned_integer(magnitude: Vec<u8>, expected: Vec<u8>) {
        assert_eq!(expected, Tlv::unsigned_integer(&magnitude).to_der());
    }

    #[test]
    fn test_bmp_string_roundtrip() {
        let tlv = Tlv::bmp_string("alice");
        assert_eq!(
            vec![0x1e, 0x0a, 0x00, 0x61, 0x00, 0x6c, 0x00, 0x69, 0x00, 0x63, 0x00, 0x65],
            tlv.to_der()
        );
        assert_eq!("alice", tlv.as_bmp_string().unwrap());
    }

    #[test]
    fn test_explicit_and_implicit() {
        let explicit = Tlv::explicit(0, Tlv::small_integer(3));
        assert_eq!(vec![0xa0, 0x03, 0x02, 0x01, 0x03], explicit.to_der());
        assert_eq!(3, explicit.explicit_inner(0).unwrap().as_u64().unwrap());

        let implicit = Tlv::set_of(vec![Tlv::null()]).implicit(1);
        assert_eq!(vec![0xa1, 0x02, 0x05, 0x00], implicit.to_der());
    }
}
