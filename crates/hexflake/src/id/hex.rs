use crate::{Error, Result};

const ALPHABET: &[u8; 16] = b"0123456789abcdef";
const NO_VALUE: u8 = 255;
const BITS_PER_CHAR: u32 = 4;

/// Lookup table for hex decoding
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    while i < 16 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_lowercase() {
            lut[(c - 32) as usize] = i; // uppercase letter
        }
        i += 1;
    }
    lut
};

/// Encodes `input` as lowercase hex into `out`, two characters per byte.
///
/// `out` must be exactly twice as long as `input`; the fixed-size callers in
/// this crate guarantee that at compile time.
#[inline]
pub fn encode_hex(input: &[u8], out: &mut [u8]) {
    debug_assert_eq!(out.len(), input.len() * 2, "hex buffer size mismatch");
    for (pair, &b) in out.chunks_exact_mut(2).zip(input) {
        pair[0] = ALPHABET[usize::from(b >> BITS_PER_CHAR)];
        pair[1] = ALPHABET[usize::from(b & 0x0F)];
    }
}

/// Decodes exactly `expected_len` hex characters into a big-endian `u128`.
///
/// Upper- and lower-case digits are both accepted.
pub fn decode_hex(encoded: &str, expected_len: usize) -> Result<u128> {
    if encoded.len() != expected_len {
        return Err(Error::DecodeInvalidLen {
            len: encoded.len(),
        });
    }

    let mut acc = 0_u128;
    for (index, byte) in encoded.bytes().enumerate() {
        let val = LOOKUP[usize::from(byte)];
        if val == NO_VALUE {
            return Err(Error::DecodeInvalidAscii { byte, index });
        }
        acc = (acc << BITS_PER_CHAR) | u128::from(val);
    }

    Ok(acc)
}
