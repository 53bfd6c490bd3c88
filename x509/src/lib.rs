//! # kura-x509
//!
//! The certificate side of kura:
//!
//! - [`Certificate`] is the capability the container engines rely on,
//!   [`X509Certificate`] the structural X.509 implementation.
//! - [`Name`] compares prepared attribute values and renders in RFC 2253
//!   form.
//! - [`CertificateDecoder`] turns bytes into shared certificate objects;
//!   [`X509Decoder`] memoizes them in an [`IdentityCache`].
//!
//! ```
//! use kura_x509::name::{COMMON_NAME, ORGANIZATION_NAME};
//! use kura_x509::Name;
//!
//! let name = Name::from_attributes(&[(ORGANIZATION_NAME, "Example"), (COMMON_NAME, "leaf")]);
//! assert_eq!("CN=leaf,O=Example", name.to_string());
//! ```

#![forbid(unsafe_code)]

pub mod algorithm;
pub mod cache;
pub mod certificate;
pub mod decoder;
pub mod error;
pub mod name;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use algorithm::AlgorithmIdentifier;
pub use cache::{EvictionPolicy, IdentityCache};
pub use certificate::{Certificate, Validity, X509Certificate};
pub use decoder::{CertificateDecoder, X509Decoder};
pub use error::{Error, Result};
pub use name::Name;
