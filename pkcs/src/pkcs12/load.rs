//! The load pass: decode, verify, decrypt, then associate keys with
//! certificate chains. Nothing here touches a live keystore; the result is
//! a complete entry table or an error.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use kura::decoder::Decoder;
use kura_crypto::Primitives;
use kura_x509::{Certificate, CertificateDecoder, Name};

use super::entry::KeyEntry;
use super::error::{Error, Result};
use super::options::Pkcs12ParsingParams;
use super::pfx::{EncryptedData, Pfx};
use super::safe_bag::{SafeBag, decode_safe_contents, decode_safe_contents_tlv};
use crate::oids;
use crate::pbe;
use crate::pkcs7::ContentInfo;
use crate::pkcs8::EncryptedPrivateKeyInfo;

/// Key id given to the only key of a file and its leaf certificate when
/// the file carries no key ids at all.
pub const PLACEHOLDER_KEY_ID: &[u8] = b"01";

struct PendingKey {
    info: EncryptedPrivateKeyInfo,
    key_id: Vec<u8>,
    alias: String,
}

struct CertRecord {
    certificate: Arc<dyn Certificate>,
    key_id: Option<Vec<u8>>,
    /// Lowercased like key aliases.
    alias: Option<String>,
}

pub(crate) struct Loader<'a> {
    pub primitives: &'a Primitives,
    pub decoder: &'a dyn CertificateDecoder,
    pub params: &'a Pkcs12ParsingParams,
}

impl Loader<'_> {
    pub fn load(&self, bytes: &[u8], password: Option<&str>) -> Result<BTreeMap<String, KeyEntry>> {
        let limits = &self.params.limits;
        let pfx = Pfx::from_der(bytes, limits)?;

        match (password, &pfx.mac_data) {
            (Some(password), Some(mac_data)) => {
                self.check_iterations(mac_data.iterations)?;
                mac_data.verify(self.primitives, password, &pfx.auth_safe)?;
            }
            (Some(_), None) => tracing::debug!("PFX without MacData, integrity not checked"),
            (None, _) => tracing::debug!("no password, integrity not checked"),
        }
        let mac_verified = password.is_some() && pfx.mac_data.is_some();

        let mut safe_contents = Vec::new();
        for content in pfx.contents(limits)? {
            if let Some(bags) = self.open(&content, password, mac_verified)? {
                flatten(bags, &mut safe_contents)?;
            }
        }
        self.associate(safe_contents)
    }

    /// The SafeBags of one AuthenticatedSafe element, `None` when it is
    /// skipped.
    fn open(
        &self,
        content: &ContentInfo,
        password: Option<&str>,
        mac_verified: bool,
    ) -> Result<Option<Vec<SafeBag>>> {
        let content_type = &content.content_type;
        if *content_type == oids::DATA {
            let bytes = content.content_bytes()?.unwrap_or_default();
            return Ok(Some(decode_safe_contents(&bytes, &self.params.limits)?));
        }
        if *content_type != oids::ENCRYPTED_DATA {
            if self.params.lenient {
                tracing::warn!(content_type = %oids::describe(content_type), "skipping unsupported content");
                return Ok(None);
            }
            return Err(Error::UnsupportedContentType(content_type.clone()));
        }
        let Some(password) = password else {
            tracing::debug!("no password, skipping encrypted contents");
            return Ok(None);
        };

        let Some(encrypted) = &content.content else {
            return Err(Error::InvalidStructure {
                structure: "encryptedData",
                reason: "missing content".into(),
            });
        };
        let encrypted: EncryptedData = encrypted.decode()?;
        let scheme = match encrypted.scheme() {
            Ok(scheme) => scheme,
            Err(Error::UnsupportedAlgorithm(algorithm)) if self.params.lenient => {
                tracing::warn!(%algorithm, "skipping contents encrypted with unsupported algorithm");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.check_iterations(scheme.iterations())?;

        let plain = match scheme.decrypt(self.primitives, password, &encrypted.encrypted_content) {
            Ok(plain) => plain,
            Err(pbe::Error::Crypto(e)) => {
                tracing::debug!(error = %e, "decrypting SafeContents failed");
                return Err(Error::IncorrectPassword);
            }
            Err(e) => return Err(e.into()),
        };
        match decode_safe_contents(&plain, &self.params.limits) {
            Ok(bags) => Ok(Some(bags)),
            // padding can survive a wrong password by chance
            Err(Error::Der(_)) if !mac_verified => Err(Error::IncorrectPassword),
            Err(e) => Err(e),
        }
    }

    fn check_iterations(&self, count: u32) -> Result<()> {
        if count > self.params.max_iterations {
            return Err(Error::TooManyIterations {
                count,
                limit: self.params.max_iterations,
            });
        }
        Ok(())
    }

    fn associate(&self, safe_contents: Vec<Vec<SafeBag>>) -> Result<BTreeMap<String, KeyEntry>> {
        let key_count = safe_contents
            .iter()
            .flatten()
            .filter(|bag| bag.bag_id == oids::PKCS8_SHROUDED_KEY_BAG)
            .count();

        let mut keys = Vec::new();
        let mut certs = Vec::new();
        let mut subjects: HashMap<Name, Arc<dyn Certificate>> = HashMap::new();
        let mut counter = 0usize;
        let mut unfriendly_name = || {
            let name = counter.to_string();
            counter += 1;
            name
        };

        for bags in &safe_contents {
            for (index, bag) in bags.iter().enumerate() {
                if bag.bag_id == oids::PKCS8_SHROUDED_KEY_BAG {
                    let key_id = match bag.local_key_id()? {
                        Some(key_id) => key_id,
                        None if key_count == 1 => PLACEHOLDER_KEY_ID.to_vec(),
                        None => {
                            tracing::warn!(keys = key_count, "dropping key without key id");
                            continue;
                        }
                    };
                    let alias = bag
                        .friendly_name()?
                        .unwrap_or_else(&mut unfriendly_name)
                        .to_lowercase();
                    keys.push(PendingKey {
                        info: bag.key_info()?,
                        key_id,
                        alias,
                    });
                } else if bag.bag_id == oids::CERT_BAG {
                    let Some(encoded) = bag.certificate_der()? else {
                        continue;
                    };
                    let certificate = match self.decoder.decode_certificate(&encoded) {
                        Ok(certificate) => certificate,
                        Err(e) if self.params.lenient => {
                            tracing::warn!(error = %e, "skipping undecodable certificate");
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    };
                    let key_id = match bag.local_key_id()? {
                        None if key_count == 1 && index == 0 => Some(PLACEHOLDER_KEY_ID.to_vec()),
                        key_id => key_id,
                    };
                    subjects
                        .entry(certificate.subject().clone())
                        .or_insert_with(|| certificate.clone());
                    certs.push(CertRecord {
                        certificate,
                        key_id,
                        alias: bag.friendly_name()?.map(|alias| alias.to_lowercase()),
                    });
                } else {
                    tracing::debug!(bag = %oids::describe(&bag.bag_id), "ignoring bag");
                }
            }
        }

        let creation_date = Utc::now();
        let mut entries = BTreeMap::new();
        for key in keys {
            let chain = match find_leaf(&key, &certs) {
                Some(leaf) => build_chain(leaf, &subjects),
                None => {
                    tracing::warn!(alias = %key.alias, "no certificate for key");
                    Vec::new()
                }
            };
            tracing::debug!(alias = %key.alias, chain = chain.len(), "loaded key entry");
            let entry = KeyEntry {
                alias: key.alias.clone(),
                creation_date,
                protected_key: key.info,
                chain,
                key_id: key.key_id,
            };
            if let Some(previous) = entries.insert(key.alias, entry) {
                tracing::warn!(alias = %previous.alias, "alias collision, later entry wins");
            }
        }
        Ok(entries)
    }
}

/// Expands nested SafeContents bags into their own lists.
fn flatten(bags: Vec<SafeBag>, out: &mut Vec<Vec<SafeBag>>) -> Result<()> {
    let mut direct = Vec::with_capacity(bags.len());
    let mut nested = Vec::new();
    for bag in bags {
        if bag.bag_id == oids::SAFE_CONTENTS_BAG {
            nested.push(decode_safe_contents_tlv(&bag.value)?);
        } else {
            direct.push(bag);
        }
    }
    out.push(direct);
    for bags in nested {
        flatten(bags, out)?;
    }
    Ok(())
}

/// Key id and alias first, then the last key id match, then the last
/// alias match.
fn find_leaf<'a>(key: &PendingKey, certs: &'a [CertRecord]) -> Option<&'a CertRecord> {
    let mut key_id_match = None;
    let mut alias_match = None;
    for cert in certs {
        let same_alias = cert.alias.as_deref() == Some(key.alias.as_str());
        if cert.key_id.as_deref() == Some(key.key_id.as_slice()) {
            if same_alias {
                return Some(cert);
            }
            key_id_match = Some(cert);
        } else if same_alias {
            alias_match = Some(cert);
        }
    }
    key_id_match.or(alias_match)
}

/// Leaf first. Stops at a self-issued certificate, an unknown issuer or a
/// certificate already in the chain.
fn build_chain(
    leaf: &CertRecord,
    subjects: &HashMap<Name, Arc<dyn Certificate>>,
) -> Vec<Arc<dyn Certificate>> {
    let mut chain = vec![leaf.certificate.clone()];
    let mut seen: HashSet<&[u8]> = HashSet::from([leaf.certificate.encoded()]);
    let mut current = &leaf.certificate;
    while !current.is_self_issued() {
        let Some(issuer) = subjects.get(current.issuer()) else {
            break;
        };
        if !seen.insert(issuer.encoded()) {
            tracing::warn!(subject = %issuer.subject(), "certificate loop in chain");
            break;
        }
        chain.push(issuer.clone());
        current = issuer;
    }
    chain
}
