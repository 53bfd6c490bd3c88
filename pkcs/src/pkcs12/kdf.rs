use kura_crypto::{DigestAlgorithm, DigestPrimitive};
use zeroize::Zeroizing;

/*
https://datatracker.ietf.org/doc/html/rfc7292#appendix-B.2

D = ID repeated v bytes
S = salt repeated to a multiple of v bytes
P = password repeated to a multiple of v bytes
I = S || P
A = H^r(D || I), B = A repeated v bytes, I_j = (I_j + B + 1) mod 2^v
 */

/// The ID byte of the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyMaterial {
    Key = 1,
    Iv = 2,
    Mac = 3,
}

/// The password as a NUL-terminated big-endian BMPString.
pub fn bmp_password(password: &str) -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(Vec::with_capacity(password.len() * 2 + 2));
    for unit in password.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

fn repeat_to_block(input: &[u8], v: usize) -> Vec<u8> {
    if input.is_empty() {
        return Vec::new();
    }
    let len = input.len().div_ceil(v) * v;
    input.iter().copied().cycle().take(len).collect()
}

/// Derives `len` bytes of `purpose` key material from a BMP `password`.
pub fn derive(
    digest: &dyn DigestPrimitive,
    algorithm: DigestAlgorithm,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    purpose: KeyMaterial,
    len: usize,
) -> kura_crypto::Result<Zeroizing<Vec<u8>>> {
    let v = algorithm.block_size();
    let u = algorithm.output_size();

    let mut i = Zeroizing::new(repeat_to_block(salt, v));
    i.extend_from_slice(&repeat_to_block(password, v));

    let mut input = Zeroizing::new(vec![purpose as u8; v]);
    let mut output = Zeroizing::new(Vec::with_capacity(len.div_ceil(u) * u));
    while output.len() < len {
        input.truncate(v);
        input.extend_from_slice(&i);
        let mut a = Zeroizing::new(digest.digest(algorithm, &input)?);
        for _ in 1..iterations {
            a = Zeroizing::new(digest.digest(algorithm, &a)?);
        }
        output.extend_from_slice(&a);
        if output.len() >= len {
            break;
        }

        let b: Zeroizing<Vec<u8>> = Zeroizing::new(a.iter().copied().cycle().take(v).collect());
        for block in i.chunks_mut(v) {
            // block = block + b + 1, big-endian, carry out of the block dropped
            let mut carry = 1u16;
            for (x, y) in block.iter_mut().zip(b.iter()).rev() {
                let sum = *x as u16 + *y as u16 + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
        }
    }
    output.truncate(len);
    Ok(output)
}
