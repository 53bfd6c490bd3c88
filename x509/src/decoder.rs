use std::sync::Arc;

use crate::cache::{IdentityCache, certificate_cache};
use crate::certificate::{Certificate, X509Certificate};
use crate::error::Result;

/// Turns encoded certificates into certificate objects.
pub trait CertificateDecoder: Send + Sync {
    fn decode_certificate(&self, encoded: &[u8]) -> Result<Arc<dyn Certificate>>;
}

/// X.509 decoder backed by an identity cache, the process-wide one unless
/// another is injected.
#[derive(Debug, Clone)]
pub struct X509Decoder {
    cache: Arc<IdentityCache<dyn Certificate>>,
}

impl X509Decoder {
    pub fn new() -> Self {
        Self::with_cache(certificate_cache())
    }

    pub fn with_cache(cache: Arc<IdentityCache<dyn Certificate>>) -> Self {
        X509Decoder { cache }
    }

    pub fn cache(&self) -> &Arc<IdentityCache<dyn Certificate>> {
        &self.cache
    }
}

impl Default for X509Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateDecoder for X509Decoder {
    fn decode_certificate(&self, encoded: &[u8]) -> Result<Arc<dyn Certificate>> {
        self.cache.get_or_try_insert_with(encoded, || {
            let certificate = X509Certificate::from_der(encoded)?;
            tracing::debug!(subject = %certificate.subject(), "decoded certificate");
            Ok(Arc::new(certificate) as Arc<dyn Certificate>)
        })
    }
}
