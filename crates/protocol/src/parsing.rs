// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! Payload parsing, rewritten from `gbParseKeyAndOptionalValue` /
//! `gbParseKeyValue` / `gbParseTtlKeyValue` / `gbQueryParseLong` in the
//! original `query.c`. Every function here is a pure, allocation-free slice
//! over the caller's payload buffer — no item or store concept leaks in,
//! the way `protocol_common::parsing` stays pure bytes-in numbers-out.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request payload")]
    Malformed,
    #[error("expected an integer")]
    NotANumber,
}

/// Finds the first space in `p`, bounded by `min(p.len(), limit)`. Returns
/// the index of the space, or `limit`'s worth of bytes scanned with no
/// space found (the whole bound is "the key").
fn field_end(p: &[u8], limit: usize) -> usize {
    let end = p.len().min(limit);
    p[..end].iter().position(|&b| b == b' ').unwrap_or(end)
}

/// `key = prefix of p up to the first space or to min(L, maxkeysize)`.
pub fn parse_key(p: &[u8], max_key_size: usize) -> Result<&[u8], ParseError> {
    let klen = field_end(p, max_key_size);
    if klen == 0 {
        return Err(ParseError::Malformed);
    }
    Ok(&p[..klen])
}

/// `key`, then a single space, then `value` = the rest of the buffer,
/// capped at `max_value_size`. Fails if the key is empty or the value is
/// empty.
pub fn parse_key_value<'a>(
    p: &'a [u8],
    max_key_size: usize,
    max_value_size: usize,
) -> Result<(&'a [u8], &'a [u8]), ParseError> {
    let klen = field_end(p, max_key_size);
    if klen == 0 {
        return Err(ParseError::Malformed);
    }
    // klen + 1 skips the separating space, matching `p++` after the scan
    // in `gbParseKeyValue`.
    if p.len() < klen + 1 {
        return Err(ParseError::Malformed);
    }
    let rest = &p[klen + 1..];
    let vlen = rest.len().min(max_value_size);
    if vlen == 0 {
        return Err(ParseError::Malformed);
    }
    Ok((&p[..klen], &rest[..vlen]))
}

/// Like [`parse_key_value`] but a missing value is legal (yields an empty
/// slice rather than failing).
pub fn parse_key_optvalue<'a>(
    p: &'a [u8],
    max_key_size: usize,
    max_value_size: usize,
) -> Result<(&'a [u8], Option<&'a [u8]>), ParseError> {
    let klen = field_end(p, max_key_size);
    if klen == 0 {
        return Err(ParseError::Malformed);
    }
    let left = p.len().saturating_sub(klen);
    if left == 0 {
        return Ok((&p[..klen], None));
    }
    let rest = &p[klen + 1..];
    let vlen = rest.len().min(max_value_size);
    if vlen == 0 {
        return Err(ParseError::Malformed);
    }
    Ok((&p[..klen], Some(&rest[..vlen])))
}

/// `ttl`, then `key`, then `value` = the remainder of the buffer, capped at
/// `max_value_size`. The ttl field shares the key's length bound, matching
/// `gbParseTtlKeyValue` exactly (it reuses `maxkeysize` for both scans).
pub fn parse_ttl_key_value<'a>(
    p: &'a [u8],
    max_key_size: usize,
    max_value_size: usize,
) -> Result<(&'a [u8], &'a [u8], &'a [u8]), ParseError> {
    let ttllen = field_end(p, max_key_size);
    if ttllen == 0 {
        return Err(ParseError::Malformed);
    }
    if p.len() < ttllen + 1 {
        return Err(ParseError::Malformed);
    }
    let after_ttl = &p[ttllen + 1..];

    let klen = field_end(after_ttl, max_key_size);
    if klen == 0 {
        return Err(ParseError::Malformed);
    }
    if after_ttl.len() < klen + 1 {
        return Err(ParseError::Malformed);
    }
    let rest = &after_ttl[klen + 1..];
    let vlen = rest.len().min(max_value_size);
    if vlen == 0 {
        return Err(ParseError::Malformed);
    }

    Ok((&p[..ttllen], &after_ttl[..klen], &rest[..vlen]))
}

/// Parses an optional leading `-` followed by ASCII digits. `"0"` is a
/// short-circuit zero exactly as in `gbQueryParseLong`: if the first byte
/// is `'0'` the value is `0`, and any trailing bytes are ignored (a
/// deliberately preserved quirk of the source, not a rewrite bug).
///
/// Overflow is rejected rather than saturated: this rewrite's documented
/// choice (the source leaves the policy unspecified), matching the
/// checked-arithmetic style of `protocol_common::parse_signed_redis`.
pub fn parse_int(bytes: &[u8]) -> Result<i64, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::NotANumber);
    }

    if bytes[0] == b'0' {
        return Ok(0);
    }

    let (sign, digits): (i64, &[u8]) = if bytes[0] == b'-' {
        (-1, &bytes[1..])
    } else {
        (1, bytes)
    };

    if digits.is_empty() {
        return Err(ParseError::NotANumber);
    }

    let mut n: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(ParseError::NotANumber);
        }
        let digit = (b - b'0') as i64;
        n = n.checked_mul(10).ok_or(ParseError::NotANumber)?;
        n = n.checked_add(digit).ok_or(ParseError::NotANumber)?;
    }

    Ok(n * sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_stops_at_space() {
        assert_eq!(parse_key(b"foo bar", 256).unwrap(), b"foo");
    }

    #[test]
    fn parse_key_truncates_at_max_key_size() {
        assert_eq!(parse_key(b"foobar", 3).unwrap(), b"foo");
    }

    #[test]
    fn parse_key_rejects_empty() {
        assert_eq!(parse_key(b" bar", 256), Err(ParseError::Malformed));
        assert_eq!(parse_key(b"", 256), Err(ParseError::Malformed));
    }

    #[test]
    fn parse_key_value_splits_on_first_space() {
        let (k, v) = parse_key_value(b"foo bar baz", 256, 256).unwrap();
        assert_eq!(k, b"foo");
        assert_eq!(v, b"bar baz");
    }

    #[test]
    fn parse_key_value_caps_value_at_max_value_size() {
        let (k, v) = parse_key_value(b"foo barbaz", 256, 3).unwrap();
        assert_eq!(k, b"foo");
        assert_eq!(v, b"bar");
    }

    #[test]
    fn parse_key_value_rejects_missing_value() {
        assert_eq!(parse_key_value(b"foo", 256, 256), Err(ParseError::Malformed));
        assert_eq!(parse_key_value(b"foo ", 256, 256), Err(ParseError::Malformed));
    }

    #[test]
    fn parse_key_optvalue_allows_missing_value() {
        let (k, v) = parse_key_optvalue(b"foo", 256, 256).unwrap();
        assert_eq!(k, b"foo");
        assert_eq!(v, None);
    }

    #[test]
    fn parse_key_optvalue_parses_present_value() {
        let (k, v) = parse_key_optvalue(b"foo 10", 256, 256).unwrap();
        assert_eq!(k, b"foo");
        assert_eq!(v, Some(&b"10"[..]));
    }

    #[test]
    fn parse_ttl_key_value_splits_three_fields() {
        let (ttl, k, v) = parse_ttl_key_value(b"-1 foo bar", 256, 256).unwrap();
        assert_eq!(ttl, b"-1");
        assert_eq!(k, b"foo");
        assert_eq!(v, b"bar");
    }

    #[test]
    fn parse_ttl_key_value_value_can_contain_spaces() {
        let (ttl, k, v) = parse_ttl_key_value(b"60 k hello world", 256, 256).unwrap();
        assert_eq!(ttl, b"60");
        assert_eq!(k, b"k");
        assert_eq!(v, b"hello world");
    }

    #[test]
    fn parse_int_zero_short_circuits() {
        assert_eq!(parse_int(b"0"), Ok(0));
        // source quirk: leading '0' short-circuits, ignoring the rest
        assert_eq!(parse_int(b"0123"), Ok(0));
    }

    #[test]
    fn parse_int_parses_negative_and_positive() {
        assert_eq!(parse_int(b"-42"), Ok(-42));
        assert_eq!(parse_int(b"42"), Ok(42));
    }

    #[test]
    fn parse_int_rejects_non_digits() {
        assert_eq!(parse_int(b"12a"), Err(ParseError::NotANumber));
        assert_eq!(parse_int(b"-"), Err(ParseError::NotANumber));
        assert_eq!(parse_int(b""), Err(ParseError::NotANumber));
    }

    #[test]
    fn parse_int_rejects_overflow() {
        assert_eq!(
            parse_int(b"99999999999999999999999"),
            Err(ParseError::NotANumber)
        );
    }
}
