use kura_der::ObjectIdentifier;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported PFX version {0}")]
    InvalidVersion(u64),

    #[error("unsupported content type {0}")]
    UnsupportedContentType(ObjectIdentifier),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid {structure}: {reason}")]
    InvalidStructure {
        structure: &'static str,
        reason: String,
    },

    /// The MAC over the AuthenticatedSafe does not match.
    #[error("integrity check failed: {0}")]
    IntegrityCheckFailed(String),

    /// Decrypting encrypted contents failed while no MAC could vouch for
    /// the password.
    #[error("incorrect password")]
    IncorrectPassword,

    #[error("unrecoverable key for alias {alias}: {reason}")]
    UnrecoverableKey { alias: String, reason: String },

    #[error("iteration count {count} exceeds the limit of {limit}")]
    TooManyIterations { count: u32, limit: u32 },

    #[error("invalid certificate chain: {0}")]
    InvalidChain(String),

    #[error("no entry for alias {0}")]
    EntryNotFound(String),

    #[error("DER error: {0}")]
    Der(#[from] kura_der::Error),

    #[error("certificate error: {0}")]
    Certificate(#[from] kura_x509::Error),

    #[error("PKCS#7 error: {0}")]
    Pkcs7(#[from] crate::pkcs7::Error),

    #[error("PKCS#8 error: {0}")]
    Pkcs8(#[from] crate::pkcs8::Error),

    #[error("PKCS#9 attribute error: {0}")]
    Pkcs9(#[from] crate::pkcs9::Error),

    #[error("PBE error: {0}")]
    Pbe(crate::pbe::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] kura_crypto::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::pbe::Error> for Error {
    fn from(err: crate::pbe::Error) -> Self {
        match err {
            crate::pbe::Error::UnsupportedAlgorithm(alg) => Error::UnsupportedAlgorithm(alg),
            other => Error::Pbe(other),
        }
    }
}
