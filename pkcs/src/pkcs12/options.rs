use kura_crypto::DigestAlgorithm;
use kura_der::Limits;
use serde::{Deserialize, Serialize};

use crate::pbe::PbeAlgorithm;
use crate::pkcs8::KeyProtector;

/// How a PKCS#12 file is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pkcs12ParsingParams {
    pub limits: Limits,
    /// Upper bound on any PBE or MAC iteration count in the input.
    pub max_iterations: u32,
    /// Skip undecodable certificates and unsupported encrypted contents
    /// instead of failing the load.
    pub lenient: bool,
}

impl Pkcs12ParsingParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 5_000_000;
}

impl Default for Pkcs12ParsingParams {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            lenient: false,
        }
    }
}

/// How a PKCS#12 file is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Encryption of the certificate SafeContents; `None` leaves it in
    /// plaintext.
    pub certificate_protection: Option<PbeAlgorithm>,
    pub certificate_iterations: u32,
    pub certificate_salt_len: usize,
    pub mac_algorithm: DigestAlgorithm,
    pub mac_iterations: u32,
    pub mac_salt_len: usize,
    /// Protection of keys handed to `set_key_entry`.
    pub key_protection: KeyProtector,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            certificate_protection: Some(PbeAlgorithm::Sha1AndDesEde),
            certificate_iterations: 1024,
            certificate_salt_len: 20,
            mac_algorithm: DigestAlgorithm::Sha1,
            mac_iterations: 1024,
            mac_salt_len: 20,
            key_protection: KeyProtector::default(),
        }
    }
}
