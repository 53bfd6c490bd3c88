//! PKCS#9: Selected Object Classes and Attribute Types
//!
//! Attribute sets as they appear in PKCS#7 signer infos and PKCS#12 bags
//! ([RFC 2985](https://datatracker.ietf.org/doc/html/rfc2985)).
//!
//! [`Pkcs9Attributes`] keeps the set exactly as received, because a PKCS#7
//! signature covers the original encoding of the authenticated attributes.
//!
//! ```
//! use kura_pkcs::pkcs9::Pkcs9Attributes;
//! use kura_pkcs::pkcs9::attribute::{Attribute, FriendlyName};
//!
//! let name = FriendlyName::new("alice").unwrap();
//! let attributes = Pkcs9Attributes::new(vec![name.to_raw()]).unwrap();
//! let parsed: Option<FriendlyName> = attributes.attribute().unwrap();
//! assert_eq!("alice", parsed.unwrap().name());
//! ```

pub mod attribute;
pub mod error;

use kura::decoder::Decoder;
use kura::encoder::Encoder;
use kura_der::{ObjectIdentifier, Tag, Tlv};

pub use attribute::{Attribute, RawAttribute};
pub use error::{Error, Result};

use crate::oids;

const SUPPORTED: [ObjectIdentifier; 17] = [
    oids::EMAIL_ADDRESS,
    oids::UNSTRUCTURED_NAME,
    oids::CONTENT_TYPE,
    oids::MESSAGE_DIGEST,
    oids::SIGNING_TIME,
    oids::COUNTERSIGNATURE,
    oids::CHALLENGE_PASSWORD,
    oids::UNSTRUCTURED_ADDRESS,
    oids::EXTENDED_CERTIFICATE_ATTRIBUTES,
    oids::EXTENSION_REQUEST,
    oids::SMIME_CAPABILITIES,
    oids::SIGNING_CERTIFICATE,
    oids::SIGNATURE_TIMESTAMP_TOKEN,
    oids::SIGNING_CERTIFICATE_V2,
    oids::FRIENDLY_NAME,
    oids::LOCAL_KEY_ID,
    oids::X509_CERTIFICATE,
];

/// Whether `oid` is one of the PKCS#9 attribute types this crate knows.
pub fn is_supported(oid: &ObjectIdentifier) -> bool {
    SUPPORTED.contains(oid)
}

/// A decoded attribute set together with its original encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkcs9Attributes {
    attributes: Vec<RawAttribute>,
    raw: Tlv,
}

impl Pkcs9Attributes {
    /// Decodes a SET OF Attribute, which may carry an implicit tag.
    ///
    /// Unknown attribute types fail with `UnsupportedAttribute` unless
    /// `ignore_unsupported` is set, in which case they are left out of the
    /// decoded view, repeated or not. A repeated known type always fails.
    pub fn decode(tlv: &Tlv, ignore_unsupported: bool) -> Result<Self> {
        if !tlv.tag().is_constructed() {
            return Err(Error::InvalidAttribute(format!(
                "attribute set must be constructed, got {}",
                tlv.tag()
            )));
        }
        let mut attributes: Vec<RawAttribute> = Vec::with_capacity(tlv.children().len());
        for child in tlv.children() {
            let attribute: RawAttribute = child.decode()?;
            let oid = attribute.attribute_type();
            if !is_supported(oid) {
                if !ignore_unsupported {
                    return Err(Error::UnsupportedAttribute(oid.clone()));
                }
                tracing::debug!(attribute = %oid, "ignoring unsupported attribute");
                continue;
            }
            if attributes.iter().any(|a| a.attribute_type() == oid) {
                return Err(Error::DuplicateAttribute(oid.clone()));
            }
            attributes.push(attribute);
        }
        Ok(Pkcs9Attributes {
            attributes,
            raw: tlv.clone(),
        })
    }

    /// Builds a set in canonical order. The decoded view follows the same
    /// order, so a set equals its own decoding.
    pub fn new(attributes: Vec<RawAttribute>) -> Result<Self> {
        let mut encoded: Vec<(Vec<u8>, Tlv, RawAttribute)> = Vec::with_capacity(attributes.len());
        for (i, attribute) in attributes.iter().enumerate() {
            let oid = attribute.attribute_type();
            if attributes[..i].iter().any(|a| a.attribute_type() == oid) {
                return Err(Error::DuplicateAttribute(oid.clone()));
            }
            let tlv: Tlv = attribute.encode()?;
            encoded.push((tlv.to_der(), tlv, attribute.clone()));
        }
        encoded.sort_by(|a, b| a.0.cmp(&b.0));
        let (tlvs, attributes): (Vec<Tlv>, Vec<RawAttribute>) = encoded
            .into_iter()
            .map(|(_, tlv, attribute)| (tlv, attribute))
            .unzip();
        Ok(Pkcs9Attributes {
            attributes,
            raw: Tlv::set_of(tlvs),
        })
    }

    pub fn get(&self, oid: &ObjectIdentifier) -> Option<&RawAttribute> {
        self.attributes.iter().find(|a| a.attribute_type() == oid)
    }

    /// The attribute of type `T`, if present.
    pub fn attribute<T: Attribute>(&self) -> Result<Option<T>> {
        self.get(&T::OID).map(RawAttribute::parse).transpose()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawAttribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The set as received, including its original tag.
    pub fn as_tlv(&self) -> &Tlv {
        &self.raw
    }

    /// The received set re-encoded under the universal SET tag. This is
    /// the input of a PKCS#7 signature over authenticated attributes.
    pub fn to_set_der(&self) -> Vec<u8> {
        self.raw.retagged(Tag::SET).to_der()
    }

    /// The set under `[number] IMPLICIT`.
    pub fn to_implicit(&self, number: u8) -> Tlv {
        self.raw.retagged(Tag::context(number, true))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use kura_der::{ObjectIdentifier, Tag, Tlv};
    use rstest::rstest;

    use super::Pkcs9Attributes;
    use super::attribute::{Attribute, ContentType, FriendlyName, LocalKeyId, MessageDigest};
    use super::error::Error;
    use crate::oids;

    fn unknown() -> Tlv {
        Tlv::sequence(vec![
            Tlv::object_identifier(&ObjectIdentifier::from_str("1.2.3.4").unwrap()),
            Tlv::set_of(vec![Tlv::null()]),
        ])
    }

    fn attribute_tlv<T: Attribute>(value: &T) -> Tlv {
        Tlv::sequence(vec![
            Tlv::object_identifier(&T::OID),
            Tlv::set_of(vec![value.to_value()]),
        ])
    }

    #[test]
    fn test_decode_implicit_set() {
        let set = Tlv::constructed(
            Tag::context(0, true),
            vec![
                attribute_tlv(&ContentType::new(oids::DATA)),
                attribute_tlv(&MessageDigest::new(vec![1, 2, 3]).unwrap()),
            ],
        );
        let attributes = Pkcs9Attributes::decode(&set, false).unwrap();
        assert_eq!(2, attributes.len());
        let content_type: ContentType = attributes.attribute().unwrap().unwrap();
        assert_eq!(&oids::DATA, content_type.content_type());
        assert_eq!(Tag::SET.byte(), attributes.to_set_der()[0]);
        assert_eq!(set, *attributes.as_tlv());
    }

    #[rstest(ignore, expected, case(true, Some(1)), case(false, None))]
    fn test_unsupported(ignore: bool, expected: Option<usize>) {
        let set = Tlv::set_of(vec![
            unknown(),
            attribute_tlv(&FriendlyName::new("key").unwrap()),
        ]);
        match Pkcs9Attributes::decode(&set, ignore) {
            Ok(attributes) => {
                assert_eq!(expected, Some(attributes.len()));
                assert_eq!(set.to_der(), attributes.to_set_der());
            }
            Err(e) => {
                assert!(expected.is_none());
                assert!(matches!(e, Error::UnsupportedAttribute(_)));
            }
        }
    }

    #[test]
    fn test_duplicate() {
        let id = attribute_tlv(&LocalKeyId::new(b"01".to_vec()).unwrap());
        let other = attribute_tlv(&LocalKeyId::new(b"02".to_vec()).unwrap());
        let set = Tlv::set_of(vec![id, other]);
        assert!(matches!(
            Pkcs9Attributes::decode(&set, true),
            Err(Error::DuplicateAttribute(oid)) if oid == oids::LOCAL_KEY_ID
        ));
    }

    #[rstest(ignore, case(true), case(false))]
    fn test_repeated_unsupported(ignore: bool) {
        let set = Tlv::set_of(vec![
            unknown(),
            unknown(),
            attribute_tlv(&FriendlyName::new("key").unwrap()),
        ]);
        match Pkcs9Attributes::decode(&set, ignore) {
            Ok(attributes) => {
                assert!(ignore);
                assert_eq!(1, attributes.len());
                assert_eq!(set.to_der(), attributes.to_set_der());
            }
            Err(e) => {
                assert!(!ignore);
                assert!(matches!(e, Error::UnsupportedAttribute(_)));
            }
        }
    }

    #[test]
    fn test_new_matches_decoded_order() {
        let name = FriendlyName::new("key").unwrap().to_raw();
        let key_id = LocalKeyId::new(b"01".to_vec()).unwrap().to_raw();
        let built = Pkcs9Attributes::new(vec![name.clone(), key_id.clone()]).unwrap();
        let reversed = Pkcs9Attributes::new(vec![key_id, name]).unwrap();
        assert_eq!(built, reversed);

        let decoded = Pkcs9Attributes::decode(
            &Tlv::from_bytes(&built.to_set_der()).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(built, decoded);
        let order: Vec<_> = decoded.iter().map(|a| a.attribute_type().clone()).collect();
        assert_eq!(vec![oids::LOCAL_KEY_ID, oids::FRIENDLY_NAME], order);
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let name = FriendlyName::new("a").unwrap().to_raw();
        assert!(matches!(
            Pkcs9Attributes::new(vec![name.clone(), name]),
            Err(Error::DuplicateAttribute(_))
        ));
    }

    #[test]
    fn test_missing_attribute() {
        let attributes =
            Pkcs9Attributes::new(vec![FriendlyName::new("a").unwrap().to_raw()]).unwrap();
        let key_id: Option<LocalKeyId> = attributes.attribute().unwrap();
        assert!(key_id.is_none());
    }
}
