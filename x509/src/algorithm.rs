use kura::decoder::{DecodableFrom, Decoder};
use kura::encoder::{EncodableTo, Encoder};
use kura_der::{ObjectIdentifier, Tag, Tlv};

use crate::error::{Error, Result};

/*
https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.1.2

AlgorithmIdentifier  ::=  SEQUENCE  {
    algorithm               OBJECT IDENTIFIER,
    parameters              ANY DEFINED BY algorithm OPTIONAL  }
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    pub algorithm: ObjectIdentifier,
    pub parameters: Option<Tlv>,
}

impl AlgorithmIdentifier {
    pub fn new(algorithm: ObjectIdentifier, parameters: Option<Tlv>) -> Self {
        AlgorithmIdentifier {
            algorithm,
            parameters,
        }
    }

    /// Identifier with an explicit NULL parameter, as RSA and digest
    /// algorithms are usually written.
    pub fn with_null_parameters(algorithm: ObjectIdentifier) -> Self {
        Self::new(algorithm, Some(Tlv::null()))
    }

    /// Parameters, treating an explicit NULL as absent.
    pub fn parameters(&self) -> Option<&Tlv> {
        self.parameters.as_ref().filter(|p| p.tag() != Tag::NULL)
    }

    pub fn to_tlv(&self) -> Tlv {
        let mut fields = vec![Tlv::object_identifier(&self.algorithm)];
        if let Some(parameters) = &self.parameters {
            fields.push(parameters.clone());
        }
        Tlv::sequence(fields)
    }
}

impl DecodableFrom<Tlv> for AlgorithmIdentifier {}

impl Decoder<Tlv, AlgorithmIdentifier> for Tlv {
    type Error = Error;

    fn decode(&self) -> Result<AlgorithmIdentifier> {
        let fields = self.as_sequence()?;
        let (algorithm, parameters) = match fields {
            [algorithm] => (algorithm, None),
            [algorithm, parameters] => (algorithm, Some(parameters.clone())),
            _ => {
                return Err(Error::InvalidAlgorithmIdentifier(format!(
                    "expected 1 or 2 elements, got {}",
                    fields.len()
                )));
            }
        };
        Ok(AlgorithmIdentifier {
            algorithm: algorithm.as_object_identifier()?,
            parameters,
        })
    }
}

impl EncodableTo<AlgorithmIdentifier> for Tlv {}

impl Encoder<AlgorithmIdentifier, Tlv> for AlgorithmIdentifier {
    type Error = Error;

    fn encode(&self) -> Result<Tlv> {
        Ok(self.to_tlv())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use kura::decoder::Decoder;
    use kura_der::{ObjectIdentifier, Tlv};
    use rstest::rstest;

    use super::AlgorithmIdentifier;
    use crate::error::Error;

    #[rstest(
        input,
        has_parameters,
        case(vec![0x30, 0x0b, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b], false),
        case(vec![0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b, 0x05, 0x00], false),
        case(vec![0x30, 0x0d, 0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x02, 0x04, 0x01, 0x00], true)
    )]
    fn test_decode(input: Vec<u8>, has_parameters: bool) {
        let tlv = Tlv::from_bytes(&input).unwrap();
        let alg: AlgorithmIdentifier = tlv.decode().unwrap();
        assert_eq!(has_parameters, alg.parameters().is_some());
        assert_eq!(input, alg.to_tlv().to_der());
    }

    #[test]
    fn test_too_many_elements() {
        let oid = ObjectIdentifier::from_str("1.2.3").unwrap();
        let tlv = Tlv::sequence(vec![
            Tlv::object_identifier(&oid),
            Tlv::null(),
            Tlv::null(),
        ]);
        let result: Result<AlgorithmIdentifier, Error> = tlv.decode();
        assert!(matches!(result, Err(Error::InvalidAlgorithmIdentifier(_))));
    }
}
