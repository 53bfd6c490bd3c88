use std::sync::Arc;

use chrono::{DateTime, Utc};
use kura_x509::Certificate;

use crate::pkcs8::EncryptedPrivateKeyInfo;

/// A private key with its certificate chain.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    /// Lower case.
    pub alias: String,
    pub creation_date: DateTime<Utc>,
    pub protected_key: EncryptedPrivateKeyInfo,
    /// Leaf first.
    pub chain: Vec<Arc<dyn Certificate>>,
    pub key_id: Vec<u8>,
}

impl KeyEntry {
    pub fn leaf(&self) -> Option<&Arc<dyn Certificate>> {
        self.chain.first()
    }
}
