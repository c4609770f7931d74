//! Small standalone helpers
//!
//! - `codec`: reversible, time-salted obfuscation of integer ids
//! - `slices`: dedup, CSV join, filtering and set difference
//! - `json_no_escape` / `file_exists`

mod codec;
mod slices;

use std::fs;
use std::path::Path;

use serde::Serialize;

pub use codec::{decode_integer, encode_integer, encode_integer_at};
pub use slices::{filter_strings, ints_to_csv, strings_diff, unique_ints};

/// Serialize `value` as JSON followed by a newline
///
/// `&`, `<` and `>` are written as-is rather than as `&`-style escapes.
pub fn json_no_escape<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = serde_json::to_string(value)?;
    out.push('\n');
    Ok(out)
}

/// True if `path` exists and is not a directory
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    fs::metadata(path).map(|m| !m.is_dir()).unwrap_or(false)
}
