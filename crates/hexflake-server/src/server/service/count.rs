//! Parsing and clamping of the `count` request parameter.
//!
//! The parameter never causes a request to fail: missing, malformed and
//! non-positive values fall back to [`DEFAULT_COUNT`], and values above the
//! configured maximum are clamped down to it.

/// Number of IDs returned when the request does not ask for a usable count.
pub const DEFAULT_COUNT: usize = 1;

/// Parses an optionally signed decimal integer.
///
/// Digits that overflow 64 bits saturate toward their sign instead of being
/// rejected, so an absurdly large request still means "as many as allowed".
/// Returns `None` for anything that is not `[+-]?[0-9]+`.
pub fn parse_count(raw: &str) -> Option<i64> {
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // Only overflow can fail past the digit check.
    let value = match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    };

    Some(value)
}

/// Maps the raw `count` parameter onto `1..=max`.
pub fn clamp_count(raw: Option<&str>, max: usize) -> usize {
    debug_assert!(max >= DEFAULT_COUNT, "max must allow at least one ID");

    match raw.and_then(parse_count) {
        Some(n) if n >= 1 => usize::try_from(n).map_or(max, |n| n.min(max)),
        _ => DEFAULT_COUNT,
    }
}
