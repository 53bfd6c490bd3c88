//! Error types for PKCS#9

use kura_der::ObjectIdentifier;
use thiserror::Error;

/// Result type for PKCS#9 operations
pub type Result<T> = std::result::Result<T, Error>;

/// PKCS#9 error types
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid PKCS#9 attribute structure
    #[error("invalid PKCS#9 attribute: {0}")]
    InvalidAttribute(String),

    /// Attribute type outside the supported set, in strict mode
    #[error("unsupported attribute type {0}")]
    UnsupportedAttribute(ObjectIdentifier),

    /// The same attribute type appears twice in one set
    #[error("duplicate attribute {0}")]
    DuplicateAttribute(ObjectIdentifier),

    /// Attribute carries no value
    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),

    #[error("invalid signingTime: {0}")]
    InvalidSigningTime(String),

    /// OID mismatch between expected and actual
    #[error("OID mismatch: expected {expected}, got {actual}")]
    OidMismatch {
        expected: ObjectIdentifier,
        actual: ObjectIdentifier,
    },

    #[error("DER error: {0}")]
    Der(#[from] kura_der::Error),
}
