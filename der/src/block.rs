//! Extracts one top-level block at a time from a byte stream.
//!
//! A stream starting with the SEQUENCE tag is read as raw BER, including
//! indefinite-length forms. Anything else is read as PEM text. The end of
//! the stream before a new block is reported as `None`, which makes
//! bundles of several certificates iterable.

use std::io::{ErrorKind, Read};

use kura_pem::{Boundary, parse_boundary};

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::tag::Tag;

/// Iterator over the blocks of a stream.
#[derive(Debug)]
pub struct BlockReader<R> {
    reader: R,
    limits: Limits,
    finished: bool,
}

impl<R: Read> BlockReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    pub fn with_limits(reader: R, limits: Limits) -> Self {
        BlockReader {
            reader,
            limits,
            finished: false,
        }
    }

    pub fn read_block(&mut self) -> Result<Option<Vec<u8>>> {
        read_one_block_with_limits(&mut self.reader, &self.limits)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads the next block as raw encoded bytes.
pub fn read_one_block<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    read_one_block_with_limits(reader, &Limits::default())
}

pub fn read_one_block_with_limits<R: Read>(
    reader: &mut R,
    limits: &Limits,
) -> Result<Option<Vec<u8>>> {
    let Some(first) = read_byte(reader)? else {
        return Ok(None);
    };
    if first == Tag::SEQUENCE.byte() {
        let mut out = Vec::new();
        read_ber(reader, first, 0, limits, &mut out)?;
        tracing::debug!(length = out.len(), "read binary block");
        return Ok(Some(out));
    }
    read_pem(reader, first, limits)
}

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

fn require_byte<R: Read>(reader: &mut R) -> Result<u8> {
    read_byte(reader)?.ok_or(Error::Truncated)
}

/// Copies one BER encoding from `reader` into `out`, starting after its
/// already consumed identifier octet.
fn read_ber<R: Read>(
    reader: &mut R,
    tag: u8,
    depth: usize,
    limits: &Limits,
    out: &mut Vec<u8>,
) -> Result<()> {
    if depth > limits.max_depth {
        return Err(Error::NestingTooDeep(limits.max_depth));
    }
    if tag & 0x1f == 0x1f {
        return Err(Error::UnsupportedTagNumber(tag));
    }
    out.push(tag);
    let first = require_byte(reader)?;
    out.push(first);
    match first {
        0x80 => {
            if tag & 0x20 == 0 {
                return Err(Error::IndefinitePrimitive(Tag::new(tag)));
            }
            loop {
                let next = require_byte(reader)?;
                let start = out.len();
                read_ber(reader, next, depth + 1, limits, out)?;
                if next == Tag::END_OF_CONTENTS.byte() {
                    if out[start..] != [0x00, 0x00] {
                        return Err(Error::InvalidEndOfContents);
                    }
                    return Ok(());
                }
            }
        }
        0xff => Err(Error::ReservedLength),
        n if n & 0x80 == 0 => read_content(reader, n as usize, limits, out),
        n => {
            let width = (n & 0x7f) as usize;
            if width > std::mem::size_of::<usize>() {
                return Err(Error::LengthTooWide(width));
            }
            let mut length = 0usize;
            for _ in 0..width {
                let b = require_byte(reader)?;
                out.push(b);
                length = (length << 8) | b as usize;
            }
            read_content(reader, length, limits, out)
        }
    }
}

fn read_content<R: Read>(
    reader: &mut R,
    length: usize,
    limits: &Limits,
    out: &mut Vec<u8>,
) -> Result<()> {
    if out.len().saturating_add(length) > limits.max_size {
        return Err(Error::TooLarge(limits.max_size));
    }
    let start = out.len();
    out.resize(start + length, 0);
    reader.read_exact(&mut out[start..]).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::Truncated
        } else {
            Error::Io(e)
        }
    })
}

fn read_pem<R: Read>(reader: &mut R, first: u8, limits: &Limits) -> Result<Option<Vec<u8>>> {
    let mut scanned = 1usize;
    let mut hyphens = usize::from(first == b'-');
    let mut last = if first == b'-' { None } else { Some(first) };

    // five hyphens at the start of a line open the header
    while !(hyphens == 5 && matches!(last, None | Some(b'\r') | Some(b'\n'))) {
        let Some(c) = read_byte(reader)? else {
            return Ok(None);
        };
        scanned += 1;
        if scanned > limits.max_size {
            return Err(Error::TooLarge(limits.max_size));
        }
        if c == b'-' {
            hyphens += 1;
        } else {
            hyphens = 0;
            last = Some(c);
        }
    }

    let mut header = String::from("-----");
    let line_end = loop {
        let c = require_byte(reader)?;
        if c == b'\n' || c == b'\r' {
            break c;
        }
        header.push(c as char);
        if header.len() > limits.max_size {
            return Err(Error::TooLarge(limits.max_size));
        }
    };

    let mut body = Vec::new();
    let mut pending = None;
    if line_end == b'\r' {
        let c = require_byte(reader)?;
        if c != b'\n' {
            pending = Some(c);
        }
    }
    loop {
        let c = match pending.take() {
            Some(c) => c,
            None => require_byte(reader)?,
        };
        if c == b'-' {
            break;
        }
        body.push(c);
        if body.len() > limits.max_size {
            return Err(Error::TooLarge(limits.max_size));
        }
    }

    let mut footer = String::from("-");
    loop {
        match read_byte(reader)? {
            None | Some(b'\n') => break,
            Some(c) if c == line_end => break,
            Some(b'\r') => {}
            Some(c) => footer.push(c as char),
        }
        if footer.len() > limits.max_size {
            return Err(Error::TooLarge(limits.max_size));
        }
    }

    let (Boundary::Begin, begin) = parse_boundary(&header)? else {
        return Err(kura_pem::error::Error::MissingPreEncapsulationBoundary.into());
    };
    let (Boundary::End, end) = parse_boundary(&footer)? else {
        return Err(kura_pem::error::Error::MissingPostEncapsulationBoundary.into());
    };
    if begin != end {
        return Err(kura_pem::error::Error::LabelMissMatch {
            begin: begin.to_string(),
            end: end.to_string(),
        }
        .into());
    }

    let text = String::from_utf8(body).map_err(|_| kura_pem::error::Error::InvalidBase64Line)?;
    let decoded = kura_pem::decode_body(&text)?;
    tracing::debug!(label = %begin, length = decoded.len(), "read PEM block");
    Ok(Some(decoded))
}
