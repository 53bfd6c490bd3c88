//! PKCS#9 contentType attribute (OID: 1.2.840.113549.1.9.3)
//!
//! Defined in RFC 2985 Section 5.3.1
//!
//! ```asn1
//! contentType ATTRIBUTE ::= {
//!     WITH SYNTAX ContentType
//!     EQUALITY MATCHING RULE objectIdentifierMatch
//!     SINGLE VALUE TRUE
//!     ID pkcs-9-at-contentType
//! }
//!
//! ContentType ::= OBJECT IDENTIFIER
//! ```
//!
//! Required in a PKCS#7 signer whenever authenticated attributes are
//! present; it must name the type of the signed content.

use std::fmt;

use kura_der::{ObjectIdentifier, Tlv};
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::oids;
use crate::pkcs9::error::Result;

use super::Attribute;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    content_type: ObjectIdentifier,
}

impl ContentType {
    pub fn new(content_type: ObjectIdentifier) -> Self {
        Self { content_type }
    }

    pub fn content_type(&self) -> &ObjectIdentifier {
        &self.content_type
    }
}

impl Attribute for ContentType {
    const OID: ObjectIdentifier = oids::CONTENT_TYPE;

    fn parse_value(value: &Tlv) -> Result<Self> {
        Ok(Self::new(value.as_object_identifier()?))
    }

    fn to_value(&self) -> Tlv {
        Tlv::object_identifier(&self.content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", oids::describe(&self.content_type))
    }
}

impl Serialize for ContentType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ContentType", 1)?;
        state.serialize_field("contentType", &self.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use kura_der::{ObjectIdentifier, Tlv};
    use rstest::rstest;

    use super::ContentType;
    use crate::pkcs9::attribute::Attribute;

    #[rstest]
    #[case::data("1.2.840.113549.1.7.1", "data")]
    #[case::signed_data("1.2.840.113549.1.7.2", "signedData")]
    #[case::unknown("1.2.3.4", "1.2.3.4")]
    fn test_content_type_parse(#[case] oid: &str, #[case] display: &str) {
        let oid = ObjectIdentifier::from_str(oid).unwrap();
        let parsed = ContentType::parse_value(&Tlv::object_identifier(&oid)).unwrap();
        assert_eq!(&oid, parsed.content_type());
        assert_eq!(display, parsed.to_string());
        assert_eq!(Tlv::object_identifier(&oid), parsed.to_value());
    }

    #[test]
    fn test_content_type_rejects_other_types() {
        assert!(ContentType::parse_value(&Tlv::octet_string(b"data")).is_err());
    }

    #[test]
    fn test_content_type_serialize() {
        let oid = ObjectIdentifier::from_str("1.2.840.113549.1.7.1").unwrap();
        let json = serde_json::to_string(&ContentType::new(oid)).unwrap();
        assert_eq!(r#"{"contentType":"data"}"#, json);
    }
}
