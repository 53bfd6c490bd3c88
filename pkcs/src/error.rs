use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("DER error: {0}")]
    Der(#[from] kura_der::Error),

    #[error("PEM error: {0}")]
    Pem(#[from] kura_pem::error::Error),

    #[error("certificate error: {0}")]
    Certificate(#[from] kura_x509::Error),

    #[error("PBE error: {0}")]
    Pbe(#[from] crate::pbe::Error),

    #[error("PKCS#7 error: {0}")]
    Pkcs7(#[from] crate::pkcs7::Error),

    #[error("PKCS#8 error: {0}")]
    Pkcs8(#[from] crate::pkcs8::Error),

    #[error("PKCS#9 error: {0}")]
    Pkcs9(#[from] crate::pkcs9::Error),

    #[error("PKCS#12 error: {0}")]
    Pkcs12(#[from] crate::pkcs12::Error),

    #[error("certificate {0} appears twice in the path")]
    DuplicateCertificate(String),

    #[error("unsupported certificate path encoding {0}")]
    UnsupportedEncoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Error, Result};

    fn parse_pem(text: &str) -> Result<kura_pem::Pem> {
        Ok(text.parse::<kura_pem::Pem>()?)
    }

    #[rstest(
        text,
        case("no boundary"),
        case("-----BEGIN PKCS7-----\nMAA=\n-----END CERTIFICATE-----\n")
    )]
    fn test_pem_error_converts(text: &str) {
        assert!(matches!(parse_pem(text), Err(Error::Pem(_))));
    }
}
