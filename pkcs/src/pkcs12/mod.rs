//! PKCS#12 (PFX) keystores, RFC 7292.
//!
//! [`Pkcs12KeyStore`] loads and writes password protected files holding
//! private keys and their certificate chains. The wire structures are
//! exposed for callers assembling files by hand:
//!
//! - [`Pfx`] and [`MacData`] for the outer layer,
//! - [`EncryptedData`] for password encrypted SafeContents,
//! - [`SafeBag`] for keys, certificates and their attributes.

pub mod entry;
pub mod error;
pub mod kdf;
pub mod keystore;
pub mod mac;
pub mod options;
pub mod pfx;
pub mod safe_bag;

mod load;
mod store;

pub use entry::KeyEntry;
pub use error::{Error, Result};
pub use keystore::Pkcs12KeyStore;
pub use load::PLACEHOLDER_KEY_ID;
pub use mac::MacData;
pub use options::{Pkcs12ParsingParams, StoreOptions};
pub use pfx::{EncryptedData, Pfx, encode_authenticated_safe};
pub use safe_bag::{SafeBag, decode_safe_contents, encode_safe_contents};
