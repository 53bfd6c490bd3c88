use nom::Parser;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::tag::Tag;
use crate::tlv::Tlv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Length {
    Definite(usize),
    Indefinite,
}

fn byte(input: &[u8]) -> Result<(&[u8], u8)> {
    let (input, b) = nom::number::complete::be_u8::<_, nom::error::Error<&[u8]>>(input)?;
    Ok((input, b))
}

fn take(input: &[u8], count: usize) -> Result<(&[u8], &[u8])> {
    let (input, taken) =
        nom::bytes::complete::take::<usize, &[u8], nom::error::Error<&[u8]>>(count).parse(input)?;
    Ok((input, taken))
}

pub(crate) fn parse_tag(input: &[u8]) -> Result<(&[u8], Tag)> {
    let (input, n) = byte(input)?;
    if n & 0x1f == 0x1f {
        return Err(Error::UnsupportedTagNumber(n));
    }
    Ok((input, Tag::new(n)))
}

pub(crate) fn parse_length(input: &[u8]) -> Result<(&[u8], Length)> {
    let (input, n) = byte(input)?;
    match n {
        0x80 => Ok((input, Length::Indefinite)),
        0xff => Err(Error::ReservedLength),
        // short form: 0-127
        n if n & 0x80 == 0 => Ok((input, Length::Definite(n as usize))),
        n => {
            // long form: the low 7 bits count the length octets that follow
            let width = (n & 0x7f) as usize;
            if width > std::mem::size_of::<usize>() {
                return Err(Error::LengthTooWide(width));
            }
            let (input, bs) = take(input, width)?;
            let length = bs.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
            Ok((input, Length::Definite(length)))
        }
    }
}

pub(crate) fn encode_length(length: usize, out: &mut Vec<u8>) {
    if length < 0x80 {
        out.push(length as u8);
        return;
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Parses one node. `depth` counts the constructed encodings above it.
pub(crate) fn parse_node<'a>(
    input: &'a [u8],
    depth: usize,
    limits: &Limits,
) -> Result<(&'a [u8], Tlv)> {
    if depth > limits.max_depth {
        return Err(Error::NestingTooDeep(limits.max_depth));
    }
    let (input, tag) = parse_tag(input)?;
    let (input, length) = parse_length(input)?;

    if tag == Tag::END_OF_CONTENTS {
        return match length {
            Length::Definite(0) => Ok((input, Tlv::end_of_contents())),
            _ => Err(Error::InvalidEndOfContents),
        };
    }

    match length {
        Length::Definite(length) => {
            if length > limits.max_size {
                return Err(Error::TooLarge(limits.max_size));
            }
            if length > input.len() {
                return Err(Error::LengthOverflow {
                    length,
                    remaining: input.len(),
                });
            }
            let (input, content) = take(input, length)?;
            if !tag.is_constructed() {
                return Ok((input, Tlv::from_parts(tag, content.to_vec(), Vec::new())));
            }

            // parse TLV recursively. children must consume the content exactly.
            let mut children = Vec::new();
            let mut data = content;
            while !data.is_empty() {
                let (rest, child) = parse_node(data, depth + 1, limits)?;
                if child.is_end_of_contents() {
                    return Err(Error::UnexpectedEndOfContents);
                }
                children.push(child);
                data = rest;
            }
            // BER children (indefinite or long-form lengths) re-encode
            // differently, so the content is rebuilt from them.
            let mut normalized = Vec::with_capacity(content.len());
            for child in &children {
                child.write_der(&mut normalized);
            }
            Ok((input, Tlv::from_parts(tag, normalized, children)))
        }
        Length::Indefinite => {
            if !tag.is_constructed() {
                return Err(Error::IndefinitePrimitive(tag));
            }
            let mut children = Vec::new();
            let mut data = input;
            loop {
                if data.is_empty() {
                    return Err(Error::MissingEndOfContents);
                }
                let (rest, child) = parse_node(data, depth + 1, limits)?;
                data = rest;
                if child.is_end_of_contents() {
                    break;
                }
                children.push(child);
            }
            let mut content = Vec::new();
            for child in &children {
                child.write_der(&mut content);
            }
            if content.len() > limits.max_size {
                return Err(Error::TooLarge(limits.max_size));
            }
            Ok((data, Tlv::from_parts(tag, content, children)))
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Length, encode_length, parse_length, parse_tag};
    use crate::error::Error;
    use crate::tag::Tag;

    #[rstest(input, expected,
        case(vec![0x02], Tag::INTEGER),
        case(vec![0x02, 0x01], Tag::INTEGER),
        case(vec![0x30, 0x01], Tag::SEQUENCE),
        case(vec![0xa0, 0x03], Tag::context(0, true))
    )]
    fn test_parse_tag(input: Vec<u8>, expected: Tag) {
        let actual = parse_tag(&input).unwrap();
        assert_eq!(expected, actual.1);
    }

    #[test]
    fn test_parse_tag_rejects_multi_byte_number() {
        let err = parse_tag(&[0x1f, 0x81, 0x00]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTagNumber(0x1f)));
    }

    #[rstest(input, expected,
        case(vec![0x02], Length::Definite(0x02)),
        case(vec![0x7f], Length::Definite(0x7f)),
        case(vec![0x81, 0x80], Length::Definite(0x80)),
        case(vec![0x82, 0x02, 0x10], Length::Definite(256 * 0x02 + 0x10)),
        case(vec![0x83, 0x01, 0x00, 0x00], Length::Definite(256 * 256)),
        case(vec![0x82, 0xff, 0xff], Length::Definite(256 * 0xff + 0xff)),
        case(vec![0x80], Length::Indefinite)
    )]
    fn test_parse_length(input: Vec<u8>, expected: Length) {
        let actual = parse_length(&input).unwrap();
        assert_eq!(expected, actual.1);
    }

    #[test]
    fn test_parse_length_reserved() {
        assert!(matches!(parse_length(&[0xff]), Err(Error::ReservedLength)));
    }

    #[test]
    fn test_parse_length_truncated() {
        assert!(matches!(parse_length(&[0x82, 0x01]), Err(Error::Truncated)));
    }

    #[rstest(length, expected,
        case(0, vec![0x00]),
        case(127, vec![0x7f]),
        case(128, vec![0x81, 0x80]),
        case(255, vec![0x81, 0xff]),
        case(256, vec![0x82, 0x01, 0x00]),
        case(65535, vec![0x82, 0xff, 0xff]),
        case(65536, vec![0x83, 0x01, 0x00, 0x00])
    )]
    fn test_encode_length(length: usize, expected: Vec<u8>) {
        let mut out = Vec::new();
        encode_length(length, &mut out);
        assert_eq!(expected, out);
    }
}
