//! Password-based encryption schemes used by PKCS#8 and PKCS#12: the
//! PKCS#12 PBE identifiers (RFC 7292 appendix C) and PBES2 with PBKDF2
//! (RFC 8018).

use std::fmt::{self, Display, Formatter};

use kura::decoder::Decoder;
use kura_crypto::{CipherAlgorithm, CipherMode, DigestAlgorithm, Primitives, RandomSource};
use kura_der::{Tag, Tlv};
use kura_x509::AlgorithmIdentifier;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::oids;
use crate::pkcs12::kdf::{self, KeyMaterial};

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported PBE algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid PBE parameters: {0}")]
    InvalidParameters(String),
    #[error("invalid algorithm identifier: {0}")]
    AlgorithmIdentifier(#[from] kura_x509::Error),
    #[error("DER error: {0}")]
    Der(#[from] kura_der::Error),
    #[error("crypto error: {0}")]
    Crypto(#[from] kura_crypto::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A password-based encryption algorithm, without per-use parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PbeAlgorithm {
    /// pbeWithSHAAnd3-KeyTripleDES-CBC
    #[default]
    Sha1AndDesEde,
    /// pbeWithSHAAnd40BitRC2-CBC
    Sha1AndRc2_40,
    /// pbeWithSHAAnd128BitRC2-CBC
    Sha1AndRc2_128,
    Pbes2 {
        prf: DigestAlgorithm,
        cipher: CipherAlgorithm,
    },
}

impl PbeAlgorithm {
    fn pkcs12_cipher(self) -> Option<CipherAlgorithm> {
        match self {
            PbeAlgorithm::Sha1AndDesEde => Some(CipherAlgorithm::DesEde3Cbc),
            PbeAlgorithm::Sha1AndRc2_40 => Some(CipherAlgorithm::Rc2Cbc {
                effective_key_bits: 40,
            }),
            PbeAlgorithm::Sha1AndRc2_128 => Some(CipherAlgorithm::Rc2Cbc {
                effective_key_bits: 128,
            }),
            PbeAlgorithm::Pbes2 { .. } => None,
        }
    }
}

impl Display for PbeAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PbeAlgorithm::Sha1AndDesEde => write!(f, "PBEWithSHA1AndDESede"),
            PbeAlgorithm::Sha1AndRc2_40 => write!(f, "PBEWithSHA1AndRC2_40"),
            PbeAlgorithm::Sha1AndRc2_128 => write!(f, "PBEWithSHA1AndRC2_128"),
            PbeAlgorithm::Pbes2 { prf, cipher } => write!(f, "PBES2(PBKDF2-Hmac{prf}, {cipher})"),
        }
    }
}

/*
https://datatracker.ietf.org/doc/html/rfc7292#appendix-C

pkcs-12PbeParams ::= SEQUENCE {
    salt        OCTET STRING,
    iterations  INTEGER
}

https://datatracker.ietf.org/doc/html/rfc8018#appendix-A.2

PBES2-params ::= SEQUENCE {
    keyDerivationFunc AlgorithmIdentifier {{PBES2-KDFs}},
    encryptionScheme AlgorithmIdentifier {{PBES2-Encs}}
}

PBKDF2-params ::= SEQUENCE {
    salt CHOICE {
        specified OCTET STRING,
        otherSource AlgorithmIdentifier {{PBKDF2-SaltSources}}
    },
    iterationCount INTEGER (1..MAX),
    keyLength INTEGER (1..MAX) OPTIONAL,
    prf AlgorithmIdentifier {{PBKDF2-PRFs}} DEFAULT algid-hmacWithSHA1
}
 */

/// A password-based encryption algorithm together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbeScheme {
    Pkcs12 {
        cipher: CipherAlgorithm,
        salt: Vec<u8>,
        iterations: u32,
    },
    Pbes2 {
        prf: DigestAlgorithm,
        salt: Vec<u8>,
        iterations: u32,
        key_length: Option<usize>,
        cipher: CipherAlgorithm,
        iv: Vec<u8>,
    },
}

impl PbeScheme {
    /// Fresh parameters for `algorithm` with a random salt (and IV).
    pub fn generate(
        algorithm: PbeAlgorithm,
        random: &dyn RandomSource,
        iterations: u32,
        salt_len: usize,
    ) -> Result<Self> {
        let salt = random.random_bytes(salt_len)?;
        Ok(match algorithm {
            PbeAlgorithm::Pbes2 { prf, cipher } => PbeScheme::Pbes2 {
                prf,
                salt,
                iterations,
                key_length: None,
                cipher,
                iv: random.random_bytes(cipher.iv_size())?,
            },
            pkcs12 => PbeScheme::Pkcs12 {
                cipher: pkcs12.pkcs12_cipher().ok_or_else(|| {
                    Error::UnsupportedAlgorithm(pkcs12.to_string())
                })?,
                salt,
                iterations,
            },
        })
    }

    pub fn iterations(&self) -> u32 {
        match self {
            PbeScheme::Pkcs12 { iterations, .. } | PbeScheme::Pbes2 { iterations, .. } => {
                *iterations
            }
        }
    }

    pub fn salt(&self) -> &[u8] {
        match self {
            PbeScheme::Pkcs12 { salt, .. } | PbeScheme::Pbes2 { salt, .. } => salt,
        }
    }

    pub fn algorithm(&self) -> PbeAlgorithm {
        match self {
            PbeScheme::Pkcs12 { cipher, .. } => match cipher {
                CipherAlgorithm::Rc2Cbc {
                    effective_key_bits: 40,
                } => PbeAlgorithm::Sha1AndRc2_40,
                CipherAlgorithm::Rc2Cbc { .. } => PbeAlgorithm::Sha1AndRc2_128,
                _ => PbeAlgorithm::Sha1AndDesEde,
            },
            PbeScheme::Pbes2 { prf, cipher, .. } => PbeAlgorithm::Pbes2 {
                prf: *prf,
                cipher: *cipher,
            },
        }
    }

    pub fn from_algorithm_identifier(identifier: &AlgorithmIdentifier) -> Result<Self> {
        let oid = &identifier.algorithm;
        let parameters = || {
            identifier.parameters().ok_or_else(|| {
                Error::InvalidParameters(format!("{} without parameters", oids::describe(oid)))
            })
        };

        let cipher = if *oid == oids::PBE_SHA1_DES_EDE {
            CipherAlgorithm::DesEde3Cbc
        } else if *oid == oids::PBE_SHA1_RC2_128 {
            CipherAlgorithm::Rc2Cbc {
                effective_key_bits: 128,
            }
        } else if *oid == oids::PBE_SHA1_RC2_40 {
            CipherAlgorithm::Rc2Cbc {
                effective_key_bits: 40,
            }
        } else if *oid == oids::PBES2 {
            return Self::decode_pbes2(parameters()?);
        } else {
            return Err(Error::UnsupportedAlgorithm(oids::describe(oid)));
        };

        let mut reader = parameters()?.sequence_reader("pkcs-12PbeParams")?;
        let salt = reader.read()?.as_octet_string()?;
        let iterations = iteration_count(reader.read()?)?;
        reader.finish()?;
        Ok(PbeScheme::Pkcs12 {
            cipher,
            salt,
            iterations,
        })
    }

    fn decode_pbes2(parameters: &Tlv) -> Result<Self> {
        let [derivation, encryption] = parameters.as_sequence()? else {
            return Err(Error::InvalidParameters(
                "PBES2-params must have 2 elements".into(),
            ));
        };
        let derivation: AlgorithmIdentifier = derivation.decode()?;
        if derivation.algorithm != oids::PBKDF2 {
            return Err(Error::UnsupportedAlgorithm(format!(
                "key derivation {}",
                oids::describe(&derivation.algorithm)
            )));
        }
        let kdf_parameters = derivation
            .parameters()
            .ok_or_else(|| Error::InvalidParameters("PBKDF2 without parameters".into()))?;
        let mut reader = kdf_parameters.sequence_reader("PBKDF2-params")?;
        let salt = reader.read()?;
        if salt.tag() != Tag::OCTET_STRING {
            return Err(Error::UnsupportedAlgorithm("PBKDF2 salt source".into()));
        }
        let salt = salt.as_octet_string()?;
        let iterations = iteration_count(reader.read()?)?;
        let key_length = reader
            .read_optional(Tag::INTEGER)
            .map(derived_key_length)
            .transpose()?;
        let prf = match reader.read_optional(Tag::SEQUENCE) {
            Some(prf) => {
                let prf: AlgorithmIdentifier = prf.decode()?;
                DigestAlgorithm::from_hmac_oid(&prf.algorithm).ok_or_else(|| {
                    Error::UnsupportedAlgorithm(format!("PRF {}", prf.algorithm))
                })?
            }
            None => DigestAlgorithm::Sha1,
        };
        reader.finish()?;

        let encryption: AlgorithmIdentifier = encryption.decode()?;
        let cipher = CipherAlgorithm::from_oid(&encryption.algorithm).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("cipher {}", encryption.algorithm))
        })?;
        let iv = encryption
            .parameters()
            .ok_or_else(|| Error::InvalidParameters(format!("{cipher} without IV")))?
            .as_octet_string()?;
        if iv.len() != cipher.iv_size() {
            return Err(Error::InvalidParameters(format!(
                "IV of {} bytes for {cipher}",
                iv.len()
            )));
        }
        Ok(PbeScheme::Pbes2 {
            prf,
            salt,
            iterations,
            key_length,
            cipher,
            iv,
        })
    }

    pub fn to_algorithm_identifier(&self) -> Result<AlgorithmIdentifier> {
        match self {
            PbeScheme::Pkcs12 {
                cipher,
                salt,
                iterations,
            } => {
                let oid = match cipher {
                    CipherAlgorithm::DesEde3Cbc => oids::PBE_SHA1_DES_EDE,
                    CipherAlgorithm::Rc2Cbc {
                        effective_key_bits: 40,
                    } => oids::PBE_SHA1_RC2_40,
                    CipherAlgorithm::Rc2Cbc {
                        effective_key_bits: 128,
                    } => oids::PBE_SHA1_RC2_128,
                    other => {
                        return Err(Error::UnsupportedAlgorithm(format!(
                            "PKCS#12 PBE with {other}"
                        )));
                    }
                };
                let parameters = Tlv::sequence(vec![
                    Tlv::octet_string(salt),
                    Tlv::small_integer(*iterations as u64),
                ]);
                Ok(AlgorithmIdentifier::new(oid, Some(parameters)))
            }
            PbeScheme::Pbes2 {
                prf,
                salt,
                iterations,
                key_length,
                cipher,
                iv,
            } => {
                let mut pbkdf2 = vec![
                    Tlv::octet_string(salt),
                    Tlv::small_integer(*iterations as u64),
                ];
                if let Some(length) = key_length {
                    pbkdf2.push(Tlv::small_integer(*length as u64));
                }
                if *prf != DigestAlgorithm::Sha1 {
                    pbkdf2.push(AlgorithmIdentifier::with_null_parameters(prf.hmac_oid()).to_tlv());
                }
                let cipher_oid = cipher.oid().ok_or_else(|| {
                    Error::UnsupportedAlgorithm(format!("PBES2 with {cipher}"))
                })?;
                let parameters = Tlv::sequence(vec![
                    AlgorithmIdentifier::new(oids::PBKDF2, Some(Tlv::sequence(pbkdf2))).to_tlv(),
                    AlgorithmIdentifier::new(cipher_oid, Some(Tlv::octet_string(iv))).to_tlv(),
                ]);
                Ok(AlgorithmIdentifier::new(oids::PBES2, Some(parameters)))
            }
        }
    }

    pub fn encrypt(&self, primitives: &Primitives, password: &str, data: &[u8]) -> Result<Vec<u8>> {
        self.apply(CipherMode::Encrypt, primitives, password, data)
    }

    pub fn decrypt(&self, primitives: &Primitives, password: &str, data: &[u8]) -> Result<Vec<u8>> {
        self.apply(CipherMode::Decrypt, primitives, password, data)
    }

    fn apply(
        &self,
        mode: CipherMode,
        primitives: &Primitives,
        password: &str,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        match self {
            PbeScheme::Pkcs12 {
                cipher,
                salt,
                iterations,
            } => {
                let password = kdf::bmp_password(password);
                let derive = |purpose, len| {
                    kdf::derive(
                        primitives.digest.as_ref(),
                        DigestAlgorithm::Sha1,
                        &password,
                        salt,
                        *iterations,
                        purpose,
                        len,
                    )
                };
                let key = derive(KeyMaterial::Key, cipher.key_size())?;
                let iv = derive(KeyMaterial::Iv, cipher.iv_size())?;
                Ok(primitives.cipher.apply(mode, *cipher, &key, &iv, data)?)
            }
            PbeScheme::Pbes2 {
                prf,
                salt,
                iterations,
                key_length,
                cipher,
                iv,
            } => {
                let length = key_length.unwrap_or(cipher.key_size());
                if length != cipher.key_size() {
                    return Err(Error::InvalidParameters(format!(
                        "key length {length} for {cipher}"
                    )));
                }
                let key = Zeroizing::new(primitives.mac.pbkdf2_hmac(
                    *prf,
                    password.as_bytes(),
                    salt,
                    *iterations,
                    length,
                )?);
                Ok(primitives.cipher.apply(mode, *cipher, &key, iv, data)?)
            }
        }
    }
}

fn iteration_count(tlv: &Tlv) -> Result<u32> {
    let count = tlv.as_u64()?;
    match u32::try_from(count) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(Error::InvalidParameters(format!("iteration count {count}"))),
    }
}

fn derived_key_length(tlv: &Tlv) -> Result<usize> {
    let length = tlv.as_u64()?;
    usize::try_from(length).map_err(|_| Error::InvalidParameters(format!("key length {length}")))
}
