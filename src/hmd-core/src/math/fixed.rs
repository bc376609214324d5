// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fixed-point integer primitives for sensor report fields.

use crate::report::ScalePair;

/// Interpret a byte as two's complement: values with the top bit set map to `v - 256`.
pub fn sign_extend(v: u8) -> i16 {
    if v & 0x80 != 0 {
        i16::from(v) - 0x100
    } else {
        i16::from(v)
    }
}

/// Read an N-byte little-endian two's-complement integer.
///
/// Every byte but the last contributes its unsigned magnitude; the last byte
/// is sign-extended. With `bias_flip` the sign-extended top byte is XORed
/// with `0x80` first, which turns an offset-binary field into a signed one.
/// An empty slice reads as zero.
pub fn read_le_signed(bytes: &[u8], bias_flip: bool) -> i64 {
    let Some((&top, rest)) = bytes.split_last() else {
        return 0;
    };
    let mut acc = i64::from(sign_extend(top));
    if bias_flip {
        acc ^= 0x80;
    }
    rest.iter()
        .rev()
        .fold(acc, |acc, &b| acc * 256 + i64::from(b))
}

/// Build the scale pair of one sensor group.
///
/// `reversed` flips the byte order of both fields before interpretation.
pub fn scale_pair(multiplier: [u8; 2], divisor: [u8; 4], reversed: bool) -> ScalePair {
    let (mut m, mut d) = (multiplier, divisor);
    if reversed {
        m.reverse();
        d.reverse();
    }
    // Both reads fit their target width exactly.
    ScalePair {
        multiplier: read_le_signed(&m, false) as i16,
        divisor: read_le_signed(&d, false) as i32,
    }
}

/// Format bytes as space-separated two-digit lowercase hex.
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
