//! Backend built on the RustCrypto crates.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyInit};
use digest::Digest;
use digest::core_api::BlockSizeUser;
use hmac::{Mac, SimpleHmac};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use rand::RngCore;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::algorithm::{CipherAlgorithm, CipherMode, DigestAlgorithm, SignatureAlgorithm};
use crate::error::{Error, Result};
use crate::{CipherPrimitive, DigestPrimitive, MacPrimitive, RandomSource, SignatureVerifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct RustCrypto;

fn digest_with<D: Digest>(data: &[u8]) -> Vec<u8> {
    D::digest(data).to_vec()
}

fn hmac_with<D: Digest + BlockSizeUser>(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(key).map_err(|_| {
        Error::InvalidKeyLength {
            algorithm: "HMAC".to_string(),
            length: key.len(),
        }
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn run_cbc<C>(cipher: C, mode: CipherMode, iv: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockEncryptMut + BlockDecryptMut,
{
    let invalid_iv = || Error::InvalidIvLength {
        algorithm: "CBC".to_string(),
        length: iv.len(),
    };
    match mode {
        CipherMode::Encrypt => {
            let encryptor =
                cbc::Encryptor::<C>::inner_iv_slice_init(cipher, iv).map_err(|_| invalid_iv())?;
            Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(data))
        }
        CipherMode::Decrypt => {
            let decryptor =
                cbc::Decryptor::<C>::inner_iv_slice_init(cipher, iv).map_err(|_| invalid_iv())?;
            decryptor
                .decrypt_padded_vec_mut::<Pkcs7>(data)
                .map_err(|_| Error::BadPadding)
        }
    }
}

impl DigestPrimitive for RustCrypto {
    fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        Ok(match algorithm {
            DigestAlgorithm::Sha1 => digest_with::<Sha1>(data),
            DigestAlgorithm::Sha224 => digest_with::<Sha224>(data),
            DigestAlgorithm::Sha256 => digest_with::<Sha256>(data),
            DigestAlgorithm::Sha384 => digest_with::<Sha384>(data),
            DigestAlgorithm::Sha512 => digest_with::<Sha512>(data),
        })
    }
}

impl MacPrimitive for RustCrypto {
    fn hmac(&self, algorithm: DigestAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        match algorithm {
            DigestAlgorithm::Sha1 => hmac_with::<Sha1>(key, data),
            DigestAlgorithm::Sha224 => hmac_with::<Sha224>(key, data),
            DigestAlgorithm::Sha256 => hmac_with::<Sha256>(key, data),
            DigestAlgorithm::Sha384 => hmac_with::<Sha384>(key, data),
            DigestAlgorithm::Sha512 => hmac_with::<Sha512>(key, data),
        }
    }

    fn pbkdf2_hmac(
        &self,
        prf: DigestAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        output_len: usize,
    ) -> Result<Vec<u8>> {
        let mut out = vec![0u8; output_len];
        match prf {
            DigestAlgorithm::Sha1 => pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut out),
            DigestAlgorithm::Sha224 => {
                pbkdf2::pbkdf2_hmac::<Sha224>(password, salt, iterations, &mut out)
            }
            DigestAlgorithm::Sha256 => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out)
            }
            DigestAlgorithm::Sha384 => {
                pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, iterations, &mut out)
            }
            DigestAlgorithm::Sha512 => {
                pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out)
            }
        }
        Ok(out)
    }
}

impl CipherPrimitive for RustCrypto {
    fn apply(
        &self,
        mode: CipherMode,
        algorithm: CipherAlgorithm,
        key: &[u8],
        iv: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>> {
        if key.len() != algorithm.key_size() || key.is_empty() {
            return Err(Error::InvalidKeyLength {
                algorithm: algorithm.to_string(),
                length: key.len(),
            });
        }
        if iv.len() != algorithm.iv_size() {
            return Err(Error::InvalidIvLength {
                algorithm: algorithm.to_string(),
                length: iv.len(),
            });
        }
        let invalid_key = || Error::InvalidKeyLength {
            algorithm: algorithm.to_string(),
            length: key.len(),
        };
        match algorithm {
            CipherAlgorithm::DesEde3Cbc => {
                let cipher = des::TdesEde3::new_from_slice(key).map_err(|_| invalid_key())?;
                run_cbc(cipher, mode, iv, data)
            }
            CipherAlgorithm::Rc2Cbc { effective_key_bits } => {
                let cipher = rc2::Rc2::new_with_eff_key_len(key, effective_key_bits as usize);
                run_cbc(cipher, mode, iv, data)
            }
            CipherAlgorithm::Aes128Cbc => {
                let cipher = aes::Aes128::new_from_slice(key).map_err(|_| invalid_key())?;
                run_cbc(cipher, mode, iv, data)
            }
            CipherAlgorithm::Aes192Cbc => {
                let cipher = aes::Aes192::new_from_slice(key).map_err(|_| invalid_key())?;
                run_cbc(cipher, mode, iv, data)
            }
            CipherAlgorithm::Aes256Cbc => {
                let cipher = aes::Aes256::new_from_slice(key).map_err(|_| invalid_key())?;
                run_cbc(cipher, mode, iv, data)
            }
        }
    }
}

impl RandomSource for RustCrypto {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        rand::rngs::OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::Random(e.to_string()))
    }
}

fn verify_rsa(
    digest: DigestAlgorithm,
    public_key_info: &[u8],
    hashed: &[u8],
    signature: &[u8],
) -> Result<()> {
    use rsa::pkcs8::DecodePublicKey;

    let key = rsa::RsaPublicKey::from_public_key_der(public_key_info)
        .map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
    let scheme = match digest {
        DigestAlgorithm::Sha1 => rsa::Pkcs1v15Sign::new::<Sha1>(),
        DigestAlgorithm::Sha224 => rsa::Pkcs1v15Sign::new::<Sha224>(),
        DigestAlgorithm::Sha256 => rsa::Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Sha384 => rsa::Pkcs1v15Sign::new::<Sha384>(),
        DigestAlgorithm::Sha512 => rsa::Pkcs1v15Sign::new::<Sha512>(),
    };
    key.verify(scheme, hashed, signature)
        .map_err(|_| Error::SignatureMismatch)
}

fn verify_p256(public_key_info: &[u8], hashed: &[u8], signature: &[u8]) -> Result<()> {
    use p256::pkcs8::DecodePublicKey;

    let key = p256::ecdsa::VerifyingKey::from_public_key_der(public_key_info)
        .map_err(|e| Error::UnsupportedAlgorithm(format!("EC key: {e}")))?;
    let signature = p256::ecdsa::Signature::from_der(signature)
        .map_err(|e| Error::MalformedSignature(e.to_string()))?;
    key.verify_prehash(hashed, &signature)
        .map_err(|_| Error::SignatureMismatch)
}

impl SignatureVerifier for RustCrypto {
    fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        public_key_info: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        let hashed = self.digest(algorithm.digest(), message)?;
        match algorithm {
            SignatureAlgorithm::RsaPkcs1v15(digest) => {
                verify_rsa(digest, public_key_info, &hashed, signature)
            }
            SignatureAlgorithm::Ecdsa(_) => verify_p256(public_key_info, &hashed, signature),
        }
    }
}

#[cfg(test)]
mod tests {
    use p256::ecdsa::signature::Signer;
    use p256::pkcs8::EncodePublicKey;
    use rstest::rstest;

    use super::RustCrypto;
    use crate::algorithm::{CipherAlgorithm, CipherMode, DigestAlgorithm, SignatureAlgorithm};
    use crate::error::Error;
    use crate::{CipherPrimitive, DigestPrimitive, MacPrimitive, RandomSource, SignatureVerifier};

    #[rstest(
        alg,
        expected,
        case(DigestAlgorithm::Sha1, "a9993e364706816aba3e25717850c26c9cd0d89d"),
        case(
            DigestAlgorithm::Sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        )
    )]
    fn test_digest(alg: DigestAlgorithm, expected: &str) {
        let digest = RustCrypto.digest(alg, b"abc").unwrap();
        assert_eq!(expected, hex::encode(digest));
    }

    #[rstest(
        alg,
        expected,
        case(DigestAlgorithm::Sha1, "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"),
        case(
            DigestAlgorithm::Sha256,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        )
    )]
    fn test_hmac(alg: DigestAlgorithm, expected: &str) {
        let mac = RustCrypto
            .hmac(alg, b"Jefe", b"what do ya want for nothing?")
            .unwrap();
        assert_eq!(expected, hex::encode(mac));
    }

    #[rstest(
        iterations,
        expected,
        case(1, "0c60c80f961f0e71f3a9b524af6012062fe037a6"),
        case(2, "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957")
    )]
    fn test_pbkdf2(iterations: u32, expected: &str) {
        let key = RustCrypto
            .pbkdf2_hmac(DigestAlgorithm::Sha1, b"password", b"salt", iterations, 20)
            .unwrap();
        assert_eq!(expected, hex::encode(key));
    }

    #[test]
    fn test_aes_known_block() {
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plain = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let encrypted = RustCrypto
            .apply(CipherMode::Encrypt, CipherAlgorithm::Aes128Cbc, &key, &iv, &plain)
            .unwrap();
        assert_eq!(32, encrypted.len());
        assert_eq!("7649abac8119b246cee98e9b12e9197d", hex::encode(&encrypted[..16]));
    }

    #[rstest(
        alg,
        case(CipherAlgorithm::DesEde3Cbc),
        case(CipherAlgorithm::Rc2Cbc { effective_key_bits: 40 }),
        case(CipherAlgorithm::Rc2Cbc { effective_key_bits: 128 }),
        case(CipherAlgorithm::Aes128Cbc),
        case(CipherAlgorithm::Aes256Cbc)
    )]
    fn test_cipher_round_trip(alg: CipherAlgorithm) {
        let key = vec![0x42; alg.key_size()];
        let iv = vec![0x24; alg.iv_size()];
        let plain = b"a private key that spans more than one block".to_vec();
        let encrypted = RustCrypto
            .apply(CipherMode::Encrypt, alg, &key, &iv, &plain)
            .unwrap();
        assert_ne!(plain, encrypted);
        assert_eq!(0, encrypted.len() % alg.iv_size());
        let decrypted = RustCrypto
            .apply(CipherMode::Decrypt, alg, &key, &iv, &encrypted)
            .unwrap();
        assert_eq!(plain, decrypted);
    }

    #[test]
    fn test_bad_padding() {
        let key = [7u8; 16];
        let iv = [0u8; 16];
        let encrypted = RustCrypto
            .apply(CipherMode::Encrypt, CipherAlgorithm::Aes128Cbc, &key, &iv, &[0u8; 16])
            .unwrap();
        // the first block alone decrypts to sixteen zero bytes
        let err = RustCrypto
            .apply(
                CipherMode::Decrypt,
                CipherAlgorithm::Aes128Cbc,
                &key,
                &iv,
                &encrypted[..16],
            )
            .unwrap_err();
        assert!(matches!(err, Error::BadPadding));
    }

    #[test]
    fn test_invalid_key_length() {
        let err = RustCrypto
            .apply(CipherMode::Encrypt, CipherAlgorithm::DesEde3Cbc, &[1; 16], &[0; 8], b"x")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKeyLength { length: 16, .. }));
    }

    #[test]
    fn test_random_bytes() {
        let a = RustCrypto.random_bytes(20).unwrap();
        let b = RustCrypto.random_bytes(20).unwrap();
        assert_eq!(20, a.len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_ecdsa_verify() {
        let signing = p256::ecdsa::SigningKey::from_slice(&[0x11; 32]).unwrap();
        let spki = signing.verifying_key().to_public_key_der().unwrap();
        let signature: p256::ecdsa::Signature = signing.sign(b"signed content");
        let der = signature.to_der();
        let alg = SignatureAlgorithm::Ecdsa(DigestAlgorithm::Sha256);

        RustCrypto
            .verify(alg, spki.as_bytes(), b"signed content", der.as_bytes())
            .unwrap();
        let err = RustCrypto
            .verify(alg, spki.as_bytes(), b"other content", der.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::SignatureMismatch));
    }

    #[test]
    fn test_rsa_rejects_garbage_key() {
        let err = RustCrypto
            .verify(
                SignatureAlgorithm::RsaPkcs1v15(DigestAlgorithm::Sha256),
                &[0x30, 0x00],
                b"msg",
                &[0; 64],
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPublicKey(_)));
    }
}
