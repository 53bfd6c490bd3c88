//! PKCS#9 friendlyName attribute (OID: 1.2.840.113549.1.9.20)
//!
//! Defined in RFC 2985 Section 5.5.1
//!
//! ```asn1
//! friendlyName ATTRIBUTE ::= {
//!     WITH SYNTAX BMPString (SIZE(1..pkcs-9-ub-friendlyName))
//!     EQUALITY MATCHING RULE caseIgnoreMatch
//!     SINGLE VALUE TRUE
//!     ID pkcs-9-at-friendlyName
//! }
//! ```
//!
//! PKCS#12 uses it for the alias of keys and certificates.

use std::fmt;

use kura_der::{ObjectIdentifier, Tag, Tlv};
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::oids;
use crate::pkcs9::error::{Error, Result};

use super::{Attribute, expect_tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyName {
    name: String,
}

impl FriendlyName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyValue("friendlyName"));
        }
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Attribute for FriendlyName {
    const OID: ObjectIdentifier = oids::FRIENDLY_NAME;

    fn parse_value(value: &Tlv) -> Result<Self> {
        expect_tag(value, Tag::BMP_STRING, "friendlyName")?;
        Self::new(value.as_bmp_string()?)
    }

    fn to_value(&self) -> Tlv {
        Tlv::bmp_string(&self.name)
    }
}

impl fmt::Display for FriendlyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Serialize for FriendlyName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("FriendlyName", 1)?;
        state.serialize_field("friendlyName", &self.name)?;
        state.end()
    }
}
