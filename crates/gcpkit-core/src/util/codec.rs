//! Integer id obfuscation
//!
//! An encoded id is `hex(r1) + hex(m) + hex(r2)` in upper case, where `r1` and
//! `r2` are single hex digits derived from the clock and
//! `m = key + (r1 + 1) * 300 + r2`. The same key encodes differently over time
//! but always decodes back. This hides sequential ids; it is not encryption.

use std::time::{SystemTime, UNIX_EPOCH};

fn salt(unix_secs: i64) -> (i64, i64) {
    let r1 = unix_secs.rem_euclid(16);
    let r2 = (unix_secs / 100).rem_euclid(16);
    (r1, r2)
}

fn offset(r1: i64, r2: i64) -> i64 {
    (r1 + 1) * 300 + r2
}

fn hex(n: i64) -> String {
    if n < 0 {
        format!("-{:X}", n.unsigned_abs())
    } else {
        format!("{:X}", n)
    }
}

/// Encode `key` salted with the current time
pub fn encode_integer(key: i64) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    encode_integer_at(key, secs)
}

/// Encode `key` salted with the given unix time
pub fn encode_integer_at(key: i64, unix_secs: i64) -> String {
    let (r1, r2) = salt(unix_secs);
    let m = key.wrapping_add(offset(r1, r2));
    format!("{}{}{}", hex(r1), hex(m), hex(r2))
}

/// Decode a value produced by [`encode_integer`]
///
/// Inputs shorter than three characters decode to `0`; a part that is not
/// valid hex counts as `0`.
pub fn decode_integer(encoded: &str) -> i64 {
    let len = encoded.len();
    if len < 3 {
        return 0;
    }
    let part = |range: std::ops::Range<usize>| {
        encoded
            .get(range)
            .and_then(|s| i64::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    let r1 = part(0..1);
    let r2 = part(len - 1..len);
    let m = part(1..len - 1);
    m.wrapping_sub(offset(r1, r2))
}
