use std::collections::BTreeMap;

use kura_crypto::Primitives;

use super::entry::KeyEntry;
use super::error::Result;
use super::mac::MacData;
use super::options::StoreOptions;
use super::pfx::{EncryptedData, Pfx, encode_authenticated_safe};
use super::safe_bag::{SafeBag, encode_safe_contents};
use crate::pbe::PbeScheme;
use crate::pkcs7::ContentInfo;

pub(crate) struct Writer<'a> {
    pub primitives: &'a Primitives,
    pub options: &'a StoreOptions,
}

impl Writer<'_> {
    /// Keys in a plaintext SafeContents (each key is already shrouded),
    /// certificates in a second one that is encrypted unless disabled.
    pub fn store(&self, entries: &BTreeMap<String, KeyEntry>, password: &str) -> Result<Vec<u8>> {
        let mut key_bags = Vec::with_capacity(entries.len());
        let mut cert_bags = Vec::new();
        for entry in entries.values() {
            key_bags.push(SafeBag::shrouded_key(
                &entry.protected_key,
                Some(&entry.alias),
                Some(&entry.key_id),
            )?);
            for (index, certificate) in entry.chain.iter().enumerate() {
                let bag = if index == 0 {
                    SafeBag::certificate(
                        certificate.encoded(),
                        Some(&entry.alias),
                        Some(&entry.key_id),
                    )?
                } else {
                    let subject = certificate.subject().to_string();
                    SafeBag::certificate(certificate.encoded(), Some(&subject), None)?
                };
                cert_bags.push(bag);
            }
        }

        let mut contents = vec![ContentInfo::data(&encode_safe_contents(&key_bags))];
        let certificates = encode_safe_contents(&cert_bags);
        contents.push(match self.options.certificate_protection {
            Some(algorithm) => {
                let scheme = PbeScheme::generate(
                    algorithm,
                    self.primitives.random.as_ref(),
                    self.options.certificate_iterations,
                    self.options.certificate_salt_len,
                )?;
                EncryptedData::encrypt(self.primitives, &scheme, password, &certificates)?
                    .to_content_info()
            }
            None => ContentInfo::data(&certificates),
        });

        let auth_safe = encode_authenticated_safe(&contents);
        let salt = self
            .primitives
            .random
            .random_bytes(self.options.mac_salt_len)?;
        let mac_data = MacData::compute(
            self.primitives,
            self.options.mac_algorithm,
            password,
            salt,
            self.options.mac_iterations,
            &auth_safe,
        )?;
        tracing::debug!(
            entries = entries.len(),
            certificates = cert_bags.len(),
            "stored PKCS#12"
        );
        Ok(Pfx {
            auth_safe,
            mac_data: Some(mac_data),
        }
        .to_der())
    }
}
