use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};
use kura_crypto::{DigestAlgorithm, Primitives};
use kura_der::{Tag, Tlv};
use kura_x509::AlgorithmIdentifier;
use subtle::ConstantTimeEq;

use super::error::{Error, Result};
use super::kdf::{self, KeyMaterial};

/*
https://datatracker.ietf.org/doc/html/rfc7292#section-4

MacData ::= SEQUENCE {
    mac        DigestInfo,
    macSalt    OCTET STRING,
    iterations INTEGER DEFAULT 1
}

DigestInfo ::= SEQUENCE {
    digestAlgorithm DigestAlgorithmIdentifier,
    digest          Digest
}
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacData {
    pub algorithm: DigestAlgorithm,
    pub digest: Vec<u8>,
    pub salt: Vec<u8>,
    pub iterations: u32,
}

impl MacData {
    /// HMAC over `data` keyed from `password`.
    pub fn compute(
        primitives: &Primitives,
        algorithm: DigestAlgorithm,
        password: &str,
        salt: Vec<u8>,
        iterations: u32,
        data: &[u8],
    ) -> Result<Self> {
        let digest = hmac(primitives, algorithm, password, &salt, iterations, data)?;
        Ok(MacData {
            algorithm,
            digest,
            salt,
            iterations,
        })
    }

    pub fn verify(&self, primitives: &Primitives, password: &str, data: &[u8]) -> Result<()> {
        let computed = hmac(
            primitives,
            self.algorithm,
            password,
            &self.salt,
            self.iterations,
            data,
        )?;
        if !bool::from(computed.ct_eq(&self.digest)) {
            return Err(Error::IntegrityCheckFailed(format!(
                "Hmac{} over the AuthenticatedSafe does not match",
                self.algorithm
            )));
        }
        tracing::debug!(algorithm = %self.algorithm, iterations = self.iterations, "MAC verified");
        Ok(())
    }

    pub fn to_tlv(&self) -> Tlv {
        let mut fields = vec![
            Tlv::sequence(vec![
                AlgorithmIdentifier::with_null_parameters(self.algorithm.oid()).to_tlv(),
                Tlv::octet_string(&self.digest),
            ]),
            Tlv::octet_string(&self.salt),
        ];
        if self.iterations != 1 {
            fields.push(Tlv::small_integer(self.iterations as u64));
        }
        Tlv::sequence(fields)
    }
}

fn hmac(
    primitives: &Primitives,
    algorithm: DigestAlgorithm,
    password: &str,
    salt: &[u8],
    iterations: u32,
    data: &[u8],
) -> Result<Vec<u8>> {
    let key = kdf::derive(
        primitives.digest.as_ref(),
        algorithm,
        &kdf::bmp_password(password),
        salt,
        iterations,
        KeyMaterial::Mac,
        algorithm.output_size(),
    )?;
    Ok(primitives.mac.hmac(algorithm, &key, data)?)
}

impl DecodableFrom<Tlv> for MacData {}

impl Decoder<Tlv, MacData> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<MacData> {
        let mut reader = self.sequence_reader("MacData")?;
        let [algorithm, digest] = reader.read()?.as_sequence()? else {
            return Err(Error::InvalidStructure {
                structure: "DigestInfo",
                reason: "expected 2 elements".into(),
            });
        };
        let algorithm: AlgorithmIdentifier = algorithm.decode()?;
        let algorithm = DigestAlgorithm::from_oid(&algorithm.algorithm).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("MAC digest {}", algorithm.algorithm))
        })?;
        let digest = digest.as_octet_string()?;
        let salt = reader.read()?.as_octet_string()?;
        let iterations = match reader.read_optional(Tag::INTEGER) {
            Some(count) => {
                let count = count.as_u64()?;
                u32::try_from(count)
                    .ok()
                    .filter(|&count| count > 0)
                    .ok_or_else(|| Error::InvalidStructure {
                        structure: "MacData",
                        reason: format!("iteration count {count}"),
                    })?
            }
            None => 1,
        };
        reader.finish()?;
        Ok(MacData {
            algorithm,
            digest,
            salt,
            iterations,
        })
    }
}

impl EncodableTo<MacData> for Tlv {}

impl Encoder<MacData, Tlv> for MacData {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(self.to_tlv())
    }
}

#[cfg(test)]
mod tests {
    use kura::decoder::Decoder;
    use kura_crypto::{DigestAlgorithm, Primitives};
    use rstest::rstest;

    use super::MacData;
    use crate::pkcs12::error::Error;

    #[rstest(
        algorithm,
        iterations,
        case(DigestAlgorithm::Sha1, 1024),
        case(DigestAlgorithm::Sha256, 1),
        case(DigestAlgorithm::Sha512, 3)
    )]
    fn test_compute_verify(algorithm: DigestAlgorithm, iterations: u32) {
        let primitives = Primitives::default();
        let mac = MacData::compute(&primitives, algorithm, "pw", vec![9; 20], iterations, b"safe")
            .unwrap();
        assert_eq!(algorithm.output_size(), mac.digest.len());

        let decoded: MacData = mac.to_tlv().decode().unwrap();
        assert_eq!(mac, decoded);
        decoded.verify(&primitives, "pw", b"safe").unwrap();
    }

    #[rstest(password, data, case("other", &b"safe"[..]), case("pw", &b"safE"[..]))]
    fn test_verify_mismatch(password: &str, data: &[u8]) {
        let primitives = Primitives::default();
        let mac =
            MacData::compute(&primitives, DigestAlgorithm::Sha1, "pw", vec![1; 8], 16, b"safe")
                .unwrap();
        assert!(matches!(
            mac.verify(&primitives, password, data),
            Err(Error::IntegrityCheckFailed(_))
        ));
    }

    #[test]
    fn test_default_iterations_omitted() {
        let primitives = Primitives::default();
        let mac = MacData::compute(&primitives, DigestAlgorithm::Sha1, "pw", vec![1; 8], 1, b"x")
            .unwrap();
        assert_eq!(2, mac.to_tlv().children().len());
    }
}
