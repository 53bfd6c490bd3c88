use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kura_crypto::Primitives;
use kura_der::block::read_one_block_with_limits;
use kura_x509::{Certificate, CertificateDecoder, X509Decoder};
use parking_lot::Mutex;
use zeroize::Zeroizing;

use super::entry::KeyEntry;
use super::error::{Error, Result};
use super::load::Loader;
use super::options::{Pkcs12ParsingParams, StoreOptions};
use super::store::Writer;
use crate::pkcs8::{EncryptedPrivateKeyInfo, KeyProtector};

/// A PKCS#12 keystore of private key entries.
///
/// Aliases are case insensitive and kept in lower case. The entry table is
/// replaced as a whole by [`load`](Self::load), so a failed load leaves the
/// previous entries untouched.
pub struct Pkcs12KeyStore {
    entries: Mutex<BTreeMap<String, KeyEntry>>,
    primitives: Primitives,
    decoder: Arc<dyn CertificateDecoder>,
    params: Pkcs12ParsingParams,
    options: StoreOptions,
}

impl Default for Pkcs12KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pkcs12KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pkcs12KeyStore")
            .field("aliases", &self.aliases())
            .field("params", &self.params)
            .field("options", &self.options)
            .finish()
    }
}

impl Pkcs12KeyStore {
    pub fn new() -> Self {
        Self::with_collaborators(Primitives::default(), Arc::new(X509Decoder::new()))
    }

    pub fn with_collaborators(primitives: Primitives, decoder: Arc<dyn CertificateDecoder>) -> Self {
        Pkcs12KeyStore {
            entries: Mutex::new(BTreeMap::new()),
            primitives,
            decoder,
            params: Pkcs12ParsingParams::default(),
            options: StoreOptions::default(),
        }
    }

    pub fn with_params(mut self, params: Pkcs12ParsingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_store_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn from_bytes(bytes: &[u8], password: Option<&str>) -> Result<Self> {
        let store = Self::new();
        store.load(bytes, password)?;
        Ok(store)
    }

    /// Replaces the entries with the content of a DER PFX.
    ///
    /// With a password the MAC is verified before anything is decrypted.
    /// Without one the integrity is not checked and encrypted contents are
    /// skipped.
    pub fn load(&self, bytes: &[u8], password: Option<&str>) -> Result<()> {
        let loader = Loader {
            primitives: &self.primitives,
            decoder: self.decoder.as_ref(),
            params: &self.params,
        };
        let entries = loader.load(bytes, password)?;
        tracing::debug!(entries = entries.len(), "loaded PKCS#12 keystore");
        *self.entries.lock() = entries;
        Ok(())
    }

    /// Reads one DER or PEM block from `reader` and loads it.
    pub fn load_reader<R: Read>(&self, reader: &mut R, password: Option<&str>) -> Result<()> {
        let Some(bytes) = read_one_block_with_limits(reader, &self.params.limits)? else {
            return Err(Error::InvalidStructure {
                structure: "PFX",
                reason: "empty input".into(),
            });
        };
        self.load(&bytes, password)
    }

    /// Encodes all entries as a DER PFX protected by `password`.
    pub fn store(&self, password: &str) -> Result<Vec<u8>> {
        let entries = self.entries.lock().clone();
        Writer {
            primitives: &self.primitives,
            options: &self.options,
        }
        .store(&entries, password)
    }

    pub fn store_to<W: Write>(&self, writer: &mut W, password: &str) -> Result<()> {
        let der = self.store(password)?;
        writer.write_all(&der)?;
        Ok(())
    }

    /// Protects a DER PrivateKeyInfo with `password` and stores it under
    /// `alias` with its chain, leaf first.
    pub fn set_key_entry(
        &self,
        alias: &str,
        private_key_info: &[u8],
        password: &str,
        chain: Vec<Arc<dyn Certificate>>,
    ) -> Result<()> {
        let protected_key =
            self.options
                .key_protection
                .protect(&self.primitives, password, private_key_info)?;
        self.set_protected_key_entry(alias, protected_key, chain)
    }

    pub fn set_protected_key_entry(
        &self,
        alias: &str,
        protected_key: EncryptedPrivateKeyInfo,
        chain: Vec<Arc<dyn Certificate>>,
    ) -> Result<()> {
        validate_chain(&chain)?;
        let alias = alias.to_lowercase();
        let mut entries = self.entries.lock();
        let key_id = unique_key_id(&entries, &alias);
        tracing::debug!(%alias, chain = chain.len(), "set key entry");
        entries.insert(
            alias.clone(),
            KeyEntry {
                alias,
                creation_date: Utc::now(),
                protected_key,
                chain,
                key_id,
            },
        );
        Ok(())
    }

    /// The decrypted PrivateKeyInfo of `alias`, `None` without such entry.
    pub fn key(&self, alias: &str, password: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let Some(entry) = self.entry(alias) else {
            return Ok(None);
        };
        KeyProtector::recover(&self.primitives, &entry.protected_key, password)
            .map(Some)
            .map_err(|e| Error::UnrecoverableKey {
                alias: entry.alias,
                reason: e.to_string(),
            })
    }

    pub fn entry(&self, alias: &str) -> Option<KeyEntry> {
        self.entries.lock().get(&alias.to_lowercase()).cloned()
    }

    pub fn certificate_chain(&self, alias: &str) -> Option<Vec<Arc<dyn Certificate>>> {
        self.entries
            .lock()
            .get(&alias.to_lowercase())
            .map(|entry| entry.chain.clone())
    }

    pub fn certificate(&self, alias: &str) -> Option<Arc<dyn Certificate>> {
        self.entries
            .lock()
            .get(&alias.to_lowercase())
            .and_then(|entry| entry.leaf().cloned())
    }

    pub fn creation_date(&self, alias: &str) -> Option<DateTime<Utc>> {
        self.entries
            .lock()
            .get(&alias.to_lowercase())
            .map(|entry| entry.creation_date)
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entries.lock().contains_key(&alias.to_lowercase())
    }

    pub fn delete_entry(&self, alias: &str) -> Result<()> {
        match self.entries.lock().remove(&alias.to_lowercase()) {
            Some(_) => Ok(()),
            None => Err(Error::EntryNotFound(alias.to_string())),
        }
    }

    pub fn aliases(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Alias of the first entry whose leaf is `certificate`.
    pub fn certificate_alias(&self, certificate: &dyn Certificate) -> Option<String> {
        self.entries
            .lock()
            .values()
            .find(|entry| {
                entry
                    .leaf()
                    .is_some_and(|leaf| leaf.encoded() == certificate.encoded())
            })
            .map(|entry| entry.alias.clone())
    }
}

/// Non-empty, and each certificate issued by the next one.
fn validate_chain(chain: &[Arc<dyn Certificate>]) -> Result<()> {
    if chain.is_empty() {
        return Err(Error::InvalidChain("a key entry needs a certificate".into()));
    }
    for pair in chain.windows(2) {
        if pair[0].issuer() != pair[1].subject() {
            return Err(Error::InvalidChain(format!(
                "{} is not issued by {}",
                pair[0].subject(),
                pair[1].subject()
            )));
        }
    }
    Ok(())
}

/// "Time <millis>", kept unique among the other entries.
fn unique_key_id(entries: &BTreeMap<String, KeyEntry>, alias: &str) -> Vec<u8> {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let key_id = format!("Time {millis}").into_bytes();
        let taken = entries
            .values()
            .any(|entry| entry.alias != alias && entry.key_id == key_id);
        if !taken {
            return key_id;
        }
        millis += 1;
    }
}
