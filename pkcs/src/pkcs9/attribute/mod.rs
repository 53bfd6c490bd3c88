//! PKCS#9 attributes (RFC 2985) used by PKCS#7 signers and PKCS#12 bags.

use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};
use kura_der::{ObjectIdentifier, Tag, Tlv};

use crate::pkcs9::error::{Error, Result};

pub mod content_type;
pub mod friendly_name;
pub mod local_key_id;
pub mod message_digest;
pub mod signing_time;

pub use content_type::ContentType;
pub use friendly_name::FriendlyName;
pub use local_key_id::LocalKeyId;
pub use message_digest::MessageDigest;
pub use signing_time::SigningTime;

/*
https://datatracker.ietf.org/doc/html/rfc2985#section-5

Attribute ::= SEQUENCE {
    type    OBJECT IDENTIFIER,
    values  SET SIZE (1..MAX) OF AttributeValue
}
 */

/// One attribute with its values left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    attribute_type: ObjectIdentifier,
    values: Vec<Tlv>,
}

impl RawAttribute {
    pub fn new(attribute_type: ObjectIdentifier, values: Vec<Tlv>) -> Self {
        RawAttribute {
            attribute_type,
            values,
        }
    }

    pub fn attribute_type(&self) -> &ObjectIdentifier {
        &self.attribute_type
    }

    pub fn values(&self) -> &[Tlv] {
        &self.values
    }

    /// The value of a SINGLE VALUE attribute.
    pub fn single_value(&self) -> Result<&Tlv> {
        match self.values.as_slice() {
            [value] => Ok(value),
            [] => Err(Error::InvalidAttribute(format!(
                "{} has no value",
                self.attribute_type
            ))),
            _ => Err(Error::InvalidAttribute(format!(
                "{} is single valued, got {} values",
                self.attribute_type,
                self.values.len()
            ))),
        }
    }

    /// Parses the value as the typed attribute `T`.
    pub fn parse<T: Attribute>(&self) -> Result<T> {
        if self.attribute_type != T::OID {
            return Err(Error::OidMismatch {
                expected: T::OID,
                actual: self.attribute_type.clone(),
            });
        }
        T::parse_value(self.single_value()?)
    }
}

impl DecodableFrom<Tlv> for RawAttribute {}

impl Decoder<Tlv, RawAttribute> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<RawAttribute> {
        let [attribute_type, values] = self.as_sequence()? else {
            return Err(Error::InvalidAttribute(
                "Attribute SEQUENCE must have 2 elements".into(),
            ));
        };
        let attribute_type = attribute_type.as_object_identifier()?;
        let values = values.as_set()?;
        if values.is_empty() {
            return Err(Error::InvalidAttribute(format!(
                "{attribute_type} has an empty value set"
            )));
        }
        Ok(RawAttribute {
            attribute_type,
            values: values.to_vec(),
        })
    }
}

impl EncodableTo<RawAttribute> for Tlv {}

impl Encoder<RawAttribute, Tlv> for RawAttribute {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(Tlv::sequence(vec![
            Tlv::object_identifier(&self.attribute_type),
            Tlv::set_of(self.values.clone()),
        ]))
    }
}

/// Typed single valued attribute.
pub trait Attribute: Sized {
    const OID: ObjectIdentifier;

    fn parse_value(value: &Tlv) -> Result<Self>;

    fn to_value(&self) -> Tlv;

    fn to_raw(&self) -> RawAttribute {
        RawAttribute::new(Self::OID, vec![self.to_value()])
    }
}

pub(crate) fn expect_tag(value: &Tlv, tag: Tag, name: &'static str) -> Result<()> {
    if value.tag() != tag {
        return Err(Error::InvalidAttribute(format!(
            "{name} must be {tag}, got {}",
            value.tag()
        )));
    }
    Ok(())
}
