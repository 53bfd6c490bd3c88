//! # kura-pkcs
//!
//! Certificate and key containers on top of `kura-der`:
//!
//! - [`pkcs7`]: SignedData parsing, encoding and signature verification,
//! - [`pkcs8`]: password protected private keys,
//! - [`pkcs9`]: attribute sets,
//! - [`pkcs12`]: the PFX keystore,
//! - [`certpath`]: PkiPath and PKCS#7 certificate paths.
//!
//! Cryptography and certificate parsing are reached through the
//! `kura-crypto` and `kura-x509` traits only.

#![forbid(unsafe_code)]

pub mod certpath;
pub mod error;
pub mod oids;
pub mod pbe;
pub mod pkcs12;
pub mod pkcs7;
pub mod pkcs8;
pub mod pkcs9;

pub use certpath::{CertPath, CertPathEncoding};
pub use error::{Error, Result};
pub use pkcs7::Pkcs7;
pub use pkcs12::Pkcs12KeyStore;
