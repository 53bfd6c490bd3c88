use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};
use kura_der::{ObjectIdentifier, Tag, Tlv};

use crate::oids;
use crate::pkcs7::error::{Error, Result};

/*
https://datatracker.ietf.org/doc/html/rfc2315#section-7

ContentInfo ::= SEQUENCE {
    contentType ContentType,
    content [0] EXPLICIT ANY DEFINED BY contentType OPTIONAL
}

ContentType ::= OBJECT IDENTIFIER
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    pub content_type: ObjectIdentifier,
    /// The content without its `[0]` wrapper.
    pub content: Option<Tlv>,
}

impl ContentInfo {
    pub fn new(content_type: ObjectIdentifier, content: Option<Tlv>) -> Self {
        ContentInfo {
            content_type,
            content,
        }
    }

    /// `data` content holding `bytes` in an OCTET STRING.
    pub fn data(bytes: &[u8]) -> Self {
        Self::new(oids::DATA, Some(Tlv::octet_string(bytes)))
    }

    /// `data` content type with no content, as used by detached signatures
    /// and certificate-only SignedData.
    pub fn empty_data() -> Self {
        Self::new(oids::DATA, None)
    }

    /// Old signers put the content directly after the type, without the
    /// `[0]` wrapper.
    pub fn decode_legacy(tlv: &Tlv) -> Result<Self> {
        let mut reader = tlv.sequence_reader("ContentInfo")?;
        let content_type = reader.read()?.as_object_identifier()?;
        let content = if reader.remaining() > 0 {
            Some(reader.read()?.clone())
        } else {
            None
        };
        reader.finish()?;
        Ok(Self::new(content_type, content))
    }

    /// The content octets: the payload of an OCTET STRING (flattening the
    /// BER constructed form), otherwise the content octets of the value.
    pub fn content_bytes(&self) -> Result<Option<Vec<u8>>> {
        let Some(content) = &self.content else {
            return Ok(None);
        };
        if content.tag().with_constructed(false) == Tag::OCTET_STRING {
            return Ok(Some(content.as_octet_string()?));
        }
        Ok(Some(content.content().to_vec()))
    }

    pub fn to_tlv(&self) -> Tlv {
        let mut children = vec![Tlv::object_identifier(&self.content_type)];
        if let Some(content) = &self.content {
            children.push(Tlv::explicit(0, content.clone()));
        }
        Tlv::sequence(children)
    }
}

impl DecodableFrom<Tlv> for ContentInfo {}

impl Decoder<Tlv, ContentInfo> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<ContentInfo> {
        let mut reader = self.sequence_reader("ContentInfo")?;
        let content_type = reader.read()?.as_object_identifier()?;
        let content = match reader.read_optional(Tag::context(0, true)) {
            Some(wrapper) => Some(wrapper.explicit_inner(0)?.clone()),
            None => None,
        };
        if reader.remaining() != 0 {
            return Err(Error::InvalidContentInfo(format!(
                "unexpected element after {} content",
                oids::describe(&content_type)
            )));
        }
        Ok(ContentInfo::new(content_type, content))
    }
}

impl EncodableTo<ContentInfo> for Tlv {}

impl Encoder<ContentInfo, Tlv> for ContentInfo {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(self.to_tlv())
    }
}

#[cfg(test)]
mod tests {
    use kura::decoder::Decoder;
    use kura_der::{Tag, Tlv};
    use rstest::rstest;

    use super::ContentInfo;
    use crate::oids;
    use crate::pkcs7::error::Error;

    #[test]
    fn test_modern_content_info() {
        let info = ContentInfo::data(b"hello");
        let tlv = info.to_tlv();
        assert_eq!(Tag::context(0, true), tlv.children()[1].tag());
        let decoded: ContentInfo = tlv.decode().unwrap();
        assert_eq!(info, decoded);
        assert_eq!(Some(b"hello".to_vec()), decoded.content_bytes().unwrap());
    }

    #[test]
    fn test_legacy_content_info() {
        let tlv = Tlv::sequence(vec![
            Tlv::object_identifier(&oids::DATA),
            Tlv::octet_string(b"old"),
        ]);
        let decoded = ContentInfo::decode_legacy(&tlv).unwrap();
        assert_eq!(Some(b"old".to_vec()), decoded.content_bytes().unwrap());

        let modern: Result<ContentInfo, Error> = tlv.decode();
        assert!(modern.is_err());
    }

    #[test]
    fn test_constructed_octet_string_content() {
        let segments = Tlv::constructed(
            Tag::OCTET_STRING,
            vec![Tlv::octet_string(b"hel"), Tlv::octet_string(b"lo")],
        );
        let info = ContentInfo::new(oids::DATA, Some(segments));
        assert_eq!(Some(b"hello".to_vec()), info.content_bytes().unwrap());
    }

    #[rstest(info, case(ContentInfo::empty_data()), case(ContentInfo::data(&[])))]
    fn test_round_trip(info: ContentInfo) {
        let decoded: ContentInfo = info.to_tlv().decode().unwrap();
        assert_eq!(info, decoded);
    }
}
