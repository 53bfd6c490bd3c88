use kura_crypto::Primitives;
use kura_der::{Limits, Tag, Tlv};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::encrypted::EncryptedPrivateKeyInfo;
use super::error::{Error, Result};
use crate::pbe::{self, PbeAlgorithm, PbeScheme};

/// Password protection of PrivateKeyInfo encodings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyProtector {
    pub algorithm: PbeAlgorithm,
    pub iterations: u32,
    pub salt_len: usize,
}

impl Default for KeyProtector {
    fn default() -> Self {
        KeyProtector {
            algorithm: PbeAlgorithm::Sha1AndDesEde,
            iterations: 1024,
            salt_len: 20,
        }
    }
}

impl KeyProtector {
    /// Encrypts a DER PrivateKeyInfo under `password` with a fresh salt.
    pub fn protect(
        &self,
        primitives: &Primitives,
        password: &str,
        private_key_info: &[u8],
    ) -> Result<EncryptedPrivateKeyInfo> {
        check_private_key_info(private_key_info)
            .map_err(|e| Error::InvalidStructure(format!("not a PrivateKeyInfo: {e}")))?;
        let scheme = PbeScheme::generate(
            self.algorithm,
            primitives.random.as_ref(),
            self.iterations,
            self.salt_len,
        )?;
        let encrypted_data = scheme.encrypt(primitives, password, private_key_info)?;
        tracing::debug!(algorithm = %self.algorithm, iterations = self.iterations, "protected private key");
        Ok(EncryptedPrivateKeyInfo::new(
            scheme.to_algorithm_identifier()?,
            encrypted_data,
        ))
    }

    /// Decrypts the PrivateKeyInfo. A wrong password shows up as
    /// `UnrecoverableKey`, whether the padding or the decoded structure
    /// gives it away.
    pub fn recover(
        primitives: &Primitives,
        info: &EncryptedPrivateKeyInfo,
        password: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let scheme = info.scheme()?;
        let plain = match scheme.decrypt(primitives, password, &info.encrypted_data) {
            Ok(plain) => Zeroizing::new(plain),
            Err(pbe::Error::Crypto(e)) => return Err(Error::UnrecoverableKey(e.to_string())),
            Err(e) => return Err(e.into()),
        };
        check_private_key_info(&plain)
            .map_err(|e| Error::UnrecoverableKey(format!("decrypted data is not a key: {e}")))?;
        Ok(plain)
    }
}

fn check_private_key_info(der: &[u8]) -> kura_der::Result<()> {
    let tlv = Tlv::from_bytes_with_limits(der, &Limits::default())?;
    tlv.expect_tag(Tag::SEQUENCE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use kura::decoder::Decoder;
    use kura_crypto::{CipherAlgorithm, DigestAlgorithm, Primitives};
    use kura_der::{ObjectIdentifier, Tag, Tlv};
    use kura_x509::AlgorithmIdentifier;
    use rstest::rstest;

    use super::KeyProtector;
    use crate::oids;
    use crate::pbe::PbeAlgorithm;
    use crate::pkcs8::encrypted::EncryptedPrivateKeyInfo;
    use crate::pkcs8::encrypted::tests::{ENCRYPTED_EC_PKCS8_PEM, ENCRYPTED_RSA_PKCS8_PEM};
    use crate::pkcs8::error::Error;

    fn private_key_info() -> Vec<u8> {
        Tlv::sequence(vec![
            Tlv::small_integer(0),
            Tlv::sequence(vec![Tlv::object_identifier(&oids::DATA), Tlv::null()]),
            Tlv::octet_string(&[0x42; 48]),
        ])
        .to_der()
    }

    #[rstest]
    #[case::rsa(ENCRYPTED_RSA_PKCS8_PEM, 1218, "1.2.840.113549.1.1.1")]
    // explicit prime256v1 parameters
    #[case::ec(ENCRYPTED_EC_PKCS8_PEM, 381, "1.2.840.10045.2.1")]
    fn test_recover_openssl_key(
        #[case] pem_data: &str,
        #[case] expected_len: usize,
        #[case] key_algorithm: &str,
    ) {
        let info: EncryptedPrivateKeyInfo = pem_data.parse().unwrap();
        let key = KeyProtector::recover(&Primitives::default(), &info, "test").unwrap();
        assert_eq!(expected_len, key.len());

        let tlv = Tlv::from_bytes(&key).unwrap();
        let [version, algorithm, private_key] = tlv.as_sequence().unwrap() else {
            panic!("PrivateKeyInfo without attributes expected");
        };
        assert_eq!(0, version.as_u64().unwrap());
        let algorithm: AlgorithmIdentifier = algorithm.decode().unwrap();
        assert_eq!(ObjectIdentifier::from_str(key_algorithm).unwrap(), algorithm.algorithm);
        assert!(!private_key.as_octet_string().unwrap().is_empty());
    }

    #[rstest]
    #[case(ENCRYPTED_RSA_PKCS8_PEM)]
    #[case(ENCRYPTED_EC_PKCS8_PEM)]
    fn test_recover_wrong_password(#[case] pem_data: &str) {
        let info: EncryptedPrivateKeyInfo = pem_data.parse().unwrap();
        assert!(matches!(
            KeyProtector::recover(&Primitives::default(), &info, "not the password"),
            Err(Error::UnrecoverableKey(_))
        ));
    }

    #[rstest(
        algorithm,
        case(PbeAlgorithm::Sha1AndDesEde),
        case(PbeAlgorithm::Sha1AndRc2_40),
        case(PbeAlgorithm::Pbes2 { prf: DigestAlgorithm::Sha256, cipher: CipherAlgorithm::Aes256Cbc })
    )]
    fn test_protect_recover(algorithm: PbeAlgorithm) {
        let primitives = Primitives::default();
        let protector = KeyProtector {
            algorithm,
            iterations: 32,
            ..KeyProtector::default()
        };
        let info = protector
            .protect(&primitives, "changeit", &private_key_info())
            .unwrap();
        let reparsed = EncryptedPrivateKeyInfo::from_der(&info.to_der()).unwrap();
        let key = KeyProtector::recover(&primitives, &reparsed, "changeit").unwrap();
        assert_eq!(private_key_info(), *key);
    }

    #[test]
    fn test_protect_rejects_non_sequence() {
        let not_a_key = Tlv::octet_string(b"key").to_der();
        assert_eq!(Tag::OCTET_STRING.byte(), not_a_key[0]);
        assert!(matches!(
            KeyProtector::default().protect(&Primitives::default(), "pw", &not_a_key),
            Err(Error::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_default_protection() {
        let protector = KeyProtector::default();
        assert_eq!(PbeAlgorithm::Sha1AndDesEde, protector.algorithm);
        let info = protector
            .protect(&Primitives::default(), "pw", &private_key_info())
            .unwrap();
        assert_eq!(oids::PBE_SHA1_DES_EDE, info.encryption_algorithm.algorithm);
    }
}
