//! PKCS#9 localKeyId attribute (OID: 1.2.840.113549.1.9.21)
//!
//! Defined in RFC 2985 Section 5.5.2
//!
//! ```asn1
//! localKeyId ATTRIBUTE ::= {
//!     WITH SYNTAX OCTET STRING
//!     EQUALITY MATCHING RULE octetStringMatch
//!     SINGLE VALUE TRUE
//!     ID pkcs-9-at-localKeyId
//! }
//! ```
//!
//! Links a private key bag with the certificate bag of its leaf.

use std::fmt;

use kura_der::{ObjectIdentifier, Tlv};
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::oids;
use crate::pkcs9::error::{Error, Result};

use super::Attribute;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalKeyId {
    key_id: Vec<u8>,
}

impl LocalKeyId {
    pub fn new(key_id: Vec<u8>) -> Result<Self> {
        if key_id.is_empty() {
            return Err(Error::EmptyValue("localKeyId"));
        }
        Ok(Self { key_id })
    }

    pub fn key_id(&self) -> Vec<u8> {
        self.key_id.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key_id
    }
}

impl Attribute for LocalKeyId {
    const OID: ObjectIdentifier = oids::LOCAL_KEY_ID;

    fn parse_value(value: &Tlv) -> Result<Self> {
        Self::new(value.as_octet_string()?)
    }

    fn to_value(&self) -> Tlv {
        Tlv::octet_string(&self.key_id)
    }
}

impl fmt::Display for LocalKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.key_id.iter().map(|b| format!("{b:02x}")).collect();
        write!(f, "{}", hex.join(":"))
    }
}

impl Serialize for LocalKeyId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("LocalKeyId", 1)?;
        state.serialize_field("localKeyId", &hex::encode(&self.key_id))?;
        state.end()
    }
}
