//! Strict DER framing for ECDSA signatures.
//!
//! A signature is `SEQUENCE { INTEGER r, INTEGER s }`. The parser is
//! strict: non-minimal lengths or integers, negative integers, and
//! trailing bytes are all rejected — a lot of historical ECDSA bugs live
//! in lenient DER parsing. The serializer emits the unique minimal
//! encoding, prepending `0x00` only when the top bit of the leading byte
//! would otherwise flag the integer as negative.

use core::fmt;

/// Ways a DER signature can fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerError {
    /// The input ended before the structure did.
    Truncated,
    /// A tag byte was not the expected `SEQUENCE`/`INTEGER` tag.
    WrongTag,
    /// A length field disagreed with the actual input length.
    LengthMismatch,
    /// An integer had a superfluous leading zero byte.
    NonMinimalInteger,
    /// An integer had its sign bit set.
    NegativeInteger,
    /// An integer was zero, too large for the group, or above the order.
    ScalarOutOfRange,
}

impl fmt::Display for DerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerError::Truncated => write!(f, "DER structure was truncated"),
            DerError::WrongTag => write!(f, "unexpected DER tag"),
            DerError::LengthMismatch => write!(f, "DER length field does not match the input"),
            DerError::NonMinimalInteger => write!(f, "DER integer is not minimally encoded"),
            DerError::NegativeInteger => write!(f, "DER integer is negative"),
            DerError::ScalarOutOfRange => write!(f, "signature component is not in [1, n-1]"),
        }
    }
}

impl std::error::Error for DerError {}

/// Parses `SEQUENCE { INTEGER r, INTEGER s }` into left-padded 32-byte
/// values. Range checks against the group order are the caller's job.
pub(crate) fn parse(bytes: &[u8]) -> Result<([u8; 32], [u8; 32]), DerError> {
    if bytes.len() < 8 {
        return Err(DerError::Truncated);
    }
    if bytes[0] != 0x30 {
        return Err(DerError::WrongTag);
    }
    // Content is at most 70 bytes, so a valid length is always short-form.
    let content_len = bytes[1] as usize;
    if content_len > 70 {
        return Err(DerError::LengthMismatch);
    }
    if content_len != bytes.len() - 2 {
        return Err(DerError::LengthMismatch);
    }
    let (r, rest) = parse_integer(&bytes[2..])?;
    let (s, rest) = parse_integer(rest)?;
    if !rest.is_empty() {
        return Err(DerError::LengthMismatch);
    }
    Ok((r, s))
}

fn parse_integer(bytes: &[u8]) -> Result<([u8; 32], &[u8]), DerError> {
    if bytes.len() < 3 {
        return Err(DerError::Truncated);
    }
    if bytes[0] != 0x02 {
        return Err(DerError::WrongTag);
    }
    let len = bytes[1] as usize;
    if len == 0 {
        return Err(DerError::LengthMismatch);
    }
    if bytes.len() < 2 + len {
        return Err(DerError::Truncated);
    }
    let content = &bytes[2..2 + len];
    if content[0] & 0x80 != 0 {
        return Err(DerError::NegativeInteger);
    }
    if len > 1 && content[0] == 0x00 && content[1] & 0x80 == 0 {
        return Err(DerError::NonMinimalInteger);
    }
    let value = if content[0] == 0x00 {
        &content[1..]
    } else {
        content
    };
    if value.len() > 32 {
        return Err(DerError::ScalarOutOfRange);
    }
    let mut out = [0u8; 32];
    out[32 - value.len()..].copy_from_slice(value);
    Ok((out, &bytes[2 + len..]))
}

/// Emits the minimal DER encoding into `buf`, returning the used length.
pub(crate) fn serialize(r: &[u8; 32], s: &[u8; 32], buf: &mut [u8; 72]) -> usize {
    let r_len = integer_len(r);
    let s_len = integer_len(s);
    buf[0] = 0x30;
    buf[1] = (4 + r_len + s_len) as u8;
    let mut at = 2;
    at = write_integer(buf, at, r);
    at = write_integer(buf, at, s);
    debug_assert_eq!(at, 6 + r_len + s_len);
    at
}

/// Length of the integer's content octets in minimal form.
fn integer_len(value: &[u8; 32]) -> usize {
    let first = value.iter().position(|&b| b != 0).unwrap_or(31);
    let mut len = 32 - first;
    if value[first] & 0x80 != 0 {
        len += 1;
    }
    len
}

fn write_integer(buf: &mut [u8; 72], at: usize, value: &[u8; 32]) -> usize {
    let first = value.iter().position(|&b| b != 0).unwrap_or(31);
    let pad = value[first] & 0x80 != 0;
    let len = (32 - first) + pad as usize;
    buf[at] = 0x02;
    buf[at + 1] = len as u8;
    let mut at = at + 2;
    if pad {
        buf[at] = 0x00;
        at += 1;
    }
    buf[at..at + (32 - first)].copy_from_slice(&value[first..]);
    at + (32 - first)
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    fn round_trip(r: [u8; 32], s: [u8; 32]) -> Vec<u8> {
        let mut buf = [0u8; 72];
        let len = serialize(&r, &s, &mut buf);
        let parsed = parse(&buf[..len]).unwrap();
        assert_eq!(parsed, (r, s));
        buf[..len].to_vec()
    }

    #[test]
    fn small_integers_use_short_encodings() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let encoded = round_trip(one, one);
        // 30 06 02 01 01 02 01 01
        assert_eq!(encoded, hex!("3006020101020101"));
    }

    #[test]
    fn high_bit_gets_zero_padded() {
        let mut high = [0u8; 32];
        high[0] = 0x80;
        let mut one = [0u8; 32];
        one[31] = 1;
        let encoded = round_trip(high, one);
        assert_eq!(encoded[3], 33); // r length includes the pad byte
        assert_eq!(encoded[4], 0x00);
        assert_eq!(encoded[5], 0x80);
    }

    #[test]
    fn rejects_wrong_framing() {
        assert_eq!(parse(&hex!("3006020101020101")[..7]), Err(DerError::Truncated));
        assert_eq!(parse(&hex!("3106020101020101")), Err(DerError::WrongTag));
        assert_eq!(parse(&hex!("3007020101020101")), Err(DerError::LengthMismatch));
        // trailing garbage
        assert_eq!(parse(&hex!("300602010102010100")), Err(DerError::LengthMismatch));
        // integer tag wrong
        assert_eq!(parse(&hex!("3006030101020101")), Err(DerError::WrongTag));
    }

    #[test]
    fn rejects_non_minimal_and_negative_integers() {
        // r = 0x0001 with a superfluous leading zero
        assert_eq!(
            parse(&hex!("300702020001020101")),
            Err(DerError::NonMinimalInteger)
        );
        // r = 0x81 without the required pad byte reads as negative
        assert_eq!(parse(&hex!("3006020181020101")), Err(DerError::NegativeInteger));
        // zero-length integer
        assert_eq!(parse(&hex!("3006020002020101")), Err(DerError::LengthMismatch));
    }

    #[test]
    fn rejects_oversized_integers() {
        // 34 content bytes cannot fit a 256-bit scalar even padded.
        let mut input = vec![0x30, 0x27, 0x02, 0x22, 0x00, 0x01];
        input.extend_from_slice(&[0x11; 32]);
        input.extend_from_slice(&[0x02, 0x01, 0x01]);
        assert_eq!(parse(&input), Err(DerError::NonMinimalInteger));

        // 33 bytes with no pad semantics: leading byte nonzero.
        let mut input = vec![0x30, 0x26, 0x02, 0x21];
        input.extend_from_slice(&[0x7F; 33]);
        input.extend_from_slice(&[0x02, 0x01, 0x01]);
        assert_eq!(parse(&input), Err(DerError::ScalarOutOfRange));
    }
}
