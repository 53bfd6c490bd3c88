//! Algorithm names and their object identifiers.

use std::fmt::{Display, Formatter};

use kura_der::ObjectIdentifier;
use serde::{Deserialize, Serialize};

const SHA1: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 3, 14, 3, 2, 26]);
const SHA224: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 16, 840, 1, 101, 3, 4, 2, 4]);
const SHA256: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 16, 840, 1, 101, 3, 4, 2, 1]);
const SHA384: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 16, 840, 1, 101, 3, 4, 2, 2]);
const SHA512: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 16, 840, 1, 101, 3, 4, 2, 3]);

const HMAC_SHA1: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 2, 7]);
const HMAC_SHA224: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 2, 8]);
const HMAC_SHA256: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 2, 9]);
const HMAC_SHA384: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 2, 10]);
const HMAC_SHA512: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 2, 11]);

const DES_EDE3_CBC: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 3, 7]);
const AES128_CBC: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 16, 840, 1, 101, 3, 4, 1, 2]);
const AES192_CBC: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 16, 840, 1, 101, 3, 4, 1, 22]);
const AES256_CBC: ObjectIdentifier = ObjectIdentifier::from_static(&[2, 16, 840, 1, 101, 3, 4, 1, 42]);

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 1, 1]);
const SHA1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 1, 5]);
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 1, 11]);
const SHA384_WITH_RSA: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 1, 12]);
const SHA512_WITH_RSA: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 1, 13]);
const SHA224_WITH_RSA: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 113549, 1, 1, 14]);

const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 2, 1]);
const ECDSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 4, 1]);
const ECDSA_WITH_SHA224: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 4, 3, 1]);
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 4, 3, 2]);
const ECDSA_WITH_SHA384: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 4, 3, 3]);
const ECDSA_WITH_SHA512: ObjectIdentifier = ObjectIdentifier::from_static(&[1, 2, 840, 10045, 4, 3, 4]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub const fn output_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Input block size in bytes.
    pub const fn block_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 | DigestAlgorithm::Sha224 | DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Sha384 | DigestAlgorithm::Sha512 => 128,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha224 => "SHA-224",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha1 => SHA1,
            DigestAlgorithm::Sha224 => SHA224,
            DigestAlgorithm::Sha256 => SHA256,
            DigestAlgorithm::Sha384 => SHA384,
            DigestAlgorithm::Sha512 => SHA512,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.oid() == *oid)
    }

    /// PBKDF2 pseudo random function identifier (RFC 8018).
    pub fn hmac_oid(self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha1 => HMAC_SHA1,
            DigestAlgorithm::Sha224 => HMAC_SHA224,
            DigestAlgorithm::Sha256 => HMAC_SHA256,
            DigestAlgorithm::Sha384 => HMAC_SHA384,
            DigestAlgorithm::Sha512 => HMAC_SHA512,
        }
    }

    pub fn from_hmac_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.hmac_oid() == *oid)
    }

    const ALL: [DigestAlgorithm; 5] = [
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ];
}

impl Display for DigestAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    Encrypt,
    Decrypt,
}

/// CBC block ciphers with PKCS#7 padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    DesEde3Cbc,
    Rc2Cbc { effective_key_bits: u16 },
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl CipherAlgorithm {
    pub const fn key_size(self) -> usize {
        match self {
            CipherAlgorithm::DesEde3Cbc => 24,
            CipherAlgorithm::Rc2Cbc { effective_key_bits } => effective_key_bits as usize / 8,
            CipherAlgorithm::Aes128Cbc => 16,
            CipherAlgorithm::Aes192Cbc => 24,
            CipherAlgorithm::Aes256Cbc => 32,
        }
    }

    pub const fn iv_size(self) -> usize {
        match self {
            CipherAlgorithm::DesEde3Cbc | CipherAlgorithm::Rc2Cbc { .. } => 8,
            CipherAlgorithm::Aes128Cbc | CipherAlgorithm::Aes192Cbc | CipherAlgorithm::Aes256Cbc => 16,
        }
    }

    /// Identifier used as a PBES2 encryption scheme. RC2 has none here.
    pub fn oid(self) -> Option<ObjectIdentifier> {
        match self {
            CipherAlgorithm::DesEde3Cbc => Some(DES_EDE3_CBC),
            CipherAlgorithm::Rc2Cbc { .. } => None,
            CipherAlgorithm::Aes128Cbc => Some(AES128_CBC),
            CipherAlgorithm::Aes192Cbc => Some(AES192_CBC),
            CipherAlgorithm::Aes256Cbc => Some(AES256_CBC),
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        [
            CipherAlgorithm::DesEde3Cbc,
            CipherAlgorithm::Aes128Cbc,
            CipherAlgorithm::Aes192Cbc,
            CipherAlgorithm::Aes256Cbc,
        ]
        .into_iter()
        .find(|alg| alg.oid().as_ref() == Some(oid))
    }
}

impl Display for CipherAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CipherAlgorithm::DesEde3Cbc => write!(f, "DESede/CBC"),
            CipherAlgorithm::Rc2Cbc { effective_key_bits } => {
                write!(f, "RC2-{}/CBC", effective_key_bits)
            }
            CipherAlgorithm::Aes128Cbc => write!(f, "AES-128/CBC"),
            CipherAlgorithm::Aes192Cbc => write!(f, "AES-192/CBC"),
            CipherAlgorithm::Aes256Cbc => write!(f, "AES-256/CBC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    RsaPkcs1v15(DigestAlgorithm),
    Ecdsa(DigestAlgorithm),
}

impl SignatureAlgorithm {
    const TABLE: [(SignatureAlgorithm, ObjectIdentifier); 10] = [
        (SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha1), SHA1_WITH_RSA),
        (SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha224), SHA224_WITH_RSA),
        (SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha256), SHA256_WITH_RSA),
        (SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha384), SHA384_WITH_RSA),
        (SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha512), SHA512_WITH_RSA),
        (SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha1), ECDSA_WITH_SHA1),
        (SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha224), ECDSA_WITH_SHA224),
        (SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha256), ECDSA_WITH_SHA256),
        (SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha384), ECDSA_WITH_SHA384),
        (SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha512), ECDSA_WITH_SHA512),
    ];

    /// Combined signature algorithm identifier, e.g. sha256WithRSAEncryption.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::TABLE
            .into_iter()
            .find(|(_, candidate)| candidate == oid)
            .map(|(alg, _)| alg)
    }

    /// Signature algorithm of a PKCS#7 signer: the digest comes from the
    /// digest algorithm field, the key type or combined algorithm from the
    /// digest encryption algorithm field.
    pub fn from_parts(digest: DigestAlgorithm, encryption: &ObjectIdentifier) -> Option<Self> {
        if *encryption == RSA_ENCRYPTION {
            return Some(SignatureAlgorithm::RsaPkcs1v15(digest));
        }
        if *encryption == EC_PUBLIC_KEY {
            return Some(SignatureAlgorithm::Ecdsa(digest));
        }
        Self::from_oid(encryption)
    }

    pub fn oid(self) -> ObjectIdentifier {
        Self::TABLE
            .into_iter()
            .find(|(alg, _)| *alg == self)
            .map(|(_, oid)| oid)
            .unwrap_or(RSA_ENCRYPTION)
    }

    pub fn digest(self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::RsaPkcs1v15(digest) | SignatureAlgorithm::Ecdsa(digest) => digest,
        }
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureAlgorithm::RsaPkcs1v15(digest) => write!(f, "{}withRSA", digest.name()),
            SignatureAlgorithm::Ecdsa(digest) => write!(f, "{}withECDSA", digest.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use kura_der::ObjectIdentifier;
    use rstest::rstest;

    use super::{CipherAlgorithm, DigestAlgorithm, SignatureAlgorithm};

    #[rstest(
        oid,
        expected,
        case("1.3.14.3.2.26", DigestAlgorithm::Sha1),
        case("2.16.840.1.101.3.4.2.1", DigestAlgorithm::Sha256),
        case("2.16.840.1.101.3.4.2.3", DigestAlgorithm::Sha512)
    )]
    fn test_digest_from_oid(oid: &str, expected: DigestAlgorithm) {
        let oid = ObjectIdentifier::from_str(oid).unwrap();
        assert_eq!(Some(expected), DigestAlgorithm::from_oid(&oid));
    }

    #[rstest(
        oid,
        expected,
        case("1.2.840.113549.1.1.11", SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha256)),
        case("1.2.840.10045.4.3.2", SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha256)),
        case("1.2.840.10045.4.3.3", SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha384))
    )]
    fn test_signature_from_oid(oid: &str, expected: SignatureAlgorithm) {
        let parsed = ObjectIdentifier::from_str(oid).unwrap();
        assert_eq!(Some(expected), SignatureAlgorithm::from_oid(&parsed));
        assert_eq!(oid, expected.oid().to_string());
    }

    #[test]
    fn test_signature_from_parts() {
        let rsa = ObjectIdentifier::from_str("1.2.840.113549.1.1.1").unwrap();
        assert_eq!(
            Some(SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha1)),
            SignatureAlgorithm::from_parts(DigestAlgorithm::Sha1, &rsa)
        );
        let unknown = ObjectIdentifier::from_str("1.2.3.4").unwrap();
        assert_eq!(None, SignatureAlgorithm::from_parts(DigestAlgorithm::Sha1, &unknown));
    }

    #[rstest(
        alg,
        key,
        iv,
        case(CipherAlgorithm::DesEde3Cbc, 24, 8),
        case(CipherAlgorithm::Rc2Cbc { effective_key_bits: 40 }, 5, 8),
        case(CipherAlgorithm::Rc2Cbc { effective_key_bits: 128 }, 16, 8),
        case(CipherAlgorithm::Aes256Cbc, 32, 16)
    )]
    fn test_cipher_sizes(alg: CipherAlgorithm, key: usize, iv: usize) {
        assert_eq!(key, alg.key_size());
        assert_eq!(iv, alg.iv_size());
    }
}
