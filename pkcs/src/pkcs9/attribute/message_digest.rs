//! PKCS#9 messageDigest attribute (OID: 1.2.840.113549.1.9.4)
//!
//! Defined in RFC 2985 Section 5.3.2
//!
//! ```asn1
//! messageDigest ATTRIBUTE ::= {
//!     WITH SYNTAX MessageDigest
//!     EQUALITY MATCHING RULE octetStringMatch
//!     SINGLE VALUE TRUE
//!     ID pkcs-9-at-messageDigest
//! }
//!
//! MessageDigest ::= OCTET STRING
//! ```

use std::fmt;

use kura_der::{ObjectIdentifier, Tlv};
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::oids;
use crate::pkcs9::error::{Error, Result};

use super::Attribute;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDigest {
    digest: Vec<u8>,
}

impl MessageDigest {
    pub fn new(digest: Vec<u8>) -> Result<Self> {
        if digest.is_empty() {
            return Err(Error::EmptyValue("messageDigest"));
        }
        Ok(Self { digest })
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl Attribute for MessageDigest {
    const OID: ObjectIdentifier = oids::MESSAGE_DIGEST;

    fn parse_value(value: &Tlv) -> Result<Self> {
        Self::new(value.as_octet_string()?)
    }

    fn to_value(&self) -> Tlv {
        Tlv::octet_string(&self.digest)
    }
}

impl fmt::Display for MessageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.digest))
    }
}

impl Serialize for MessageDigest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("MessageDigest", 1)?;
        state.serialize_field("messageDigest", &hex::encode(&self.digest))?;
        state.end()
    }
}
