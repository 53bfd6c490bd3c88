use kura_pem::Label;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    #[error("unexpected PEM label {0}")]
    UnexpectedLabel(Label),

    /// Decryption failed or did not produce a PrivateKeyInfo, usually
    /// because of a wrong password.
    #[error("unrecoverable key: {0}")]
    UnrecoverableKey(String),

    #[error("PBE error: {0}")]
    Pbe(#[from] crate::pbe::Error),

    #[error("DER error: {0}")]
    Der(#[from] kura_der::Error),

    #[error("invalid algorithm identifier: {0}")]
    AlgorithmIdentifier(#[from] kura_x509::Error),
}
