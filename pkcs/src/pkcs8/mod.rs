//! PKCS#8: Private-Key Information Syntax Specification
//!
//! Encrypted private keys as specified by
//! [RFC 5958](https://datatracker.ietf.org/doc/html/rfc5958), which
//! obsoletes RFC 5208 (PKCS#8 v1.2). Keys stay opaque: a PrivateKeyInfo is
//! carried as its DER encoding and only checked to be a SEQUENCE.

pub mod encrypted;
pub mod error;
pub mod protector;

pub use encrypted::EncryptedPrivateKeyInfo;
pub use error::{Error, Result};
pub use protector::KeyProtector;
