//! # kura-crypto
//!
//! The container engines never call a cipher, hash or signature scheme
//! directly. They go through the narrow traits below, bundled in
//! [`Primitives`]. [`rust_crypto::RustCrypto`] implements all of them on
//! top of the RustCrypto crates and is the default.
//!
//! ```
//! use kura_crypto::{DigestAlgorithm, Primitives};
//!
//! let primitives = Primitives::default();
//! let digest = primitives.digest.digest(DigestAlgorithm::Sha256, b"abc").unwrap();
//! assert_eq!(32, digest.len());
//! ```

#![forbid(unsafe_code)]

pub mod algorithm;
pub mod error;
pub mod rust_crypto;

use std::fmt;
use std::sync::Arc;

pub use algorithm::{CipherAlgorithm, CipherMode, DigestAlgorithm, SignatureAlgorithm};
pub use error::{Error, Result};

pub trait DigestPrimitive: Send + Sync {
    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>>;
}

pub trait MacPrimitive: Send + Sync {
    fn hmac(&self, algorithm: DigestAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// PBKDF2 with HMAC-`prf` (RFC 8018, section 5.2).
    fn pbkdf2_hmac(
        &self,
        prf: DigestAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        output_len: usize,
    ) -> Result<Vec<u8>>;
}

/// One-shot CBC encryption or decryption with PKCS#7 padding.
pub trait CipherPrimitive: Send + Sync {
    fn apply(
        &self,
        mode: CipherMode,
        algorithm: CipherAlgorithm,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>>;
}

pub trait RandomSource: Send + Sync {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()>;

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.fill_bytes(&mut out)?;
        Ok(out)
    }
}

pub trait SignatureVerifier: Send + Sync {
    /// Checks `signature` over `message` with the key in the DER
    /// SubjectPublicKeyInfo `public_key_info`.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` when the key type or algorithm is not
    /// handled, `SignatureMismatch` when the signature is wrong.
    fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        public_key_info: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<()>;
}

/// The set of collaborators handed to the container engines.
#[derive(Clone)]
pub struct Primitives {
    pub digest: Arc<dyn DigestPrimitive>,
    pub mac: Arc<dyn MacPrimitive>,
    pub cipher: Arc<dyn CipherPrimitive>,
    pub random: Arc<dyn RandomSource>,
    pub verifier: Arc<dyn SignatureVerifier>,
}

impl Primitives {
    pub fn rust_crypto() -> Self {
        let backend = Arc::new(rust_crypto::RustCrypto);
        Primitives {
            digest: backend.clone(),
            mac: backend.clone(),
            cipher: backend.clone(),
            random: backend.clone(),
            verifier: backend,
        }
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }
}

impl Default for Primitives {
    fn default() -> Self {
        Self::rust_crypto()
    }
}

impl fmt::Debug for Primitives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitives").finish_non_exhaustive()
    }
}
