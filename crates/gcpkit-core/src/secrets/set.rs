//! Parsed secrets documents and their typed accessors

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{SecretsError, SecretsResult};

/// A single key/value entry of a secrets document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecretRecord {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl SecretRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Document field names match regardless of letter case
fn field_matches(name: &str, field: &str) -> bool {
    name.chars()
        .flat_map(char::to_lowercase)
        .eq(field.chars().flat_map(char::to_lowercase))
}

// Field matching for records and documents:
// - names compare case-insensitively, so `KEY` and `key` both set `Key`
// - a repeated field is overwritten by its last occurrence
// - `null` leaves a string field as it was
// - unknown fields are skipped
impl<'de> Deserialize<'de> for SecretRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = SecretRecord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a secrets record object with Key and Value")
            }

            fn visit_map<M>(self, mut map: M) -> Result<SecretRecord, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut record = SecretRecord::default();
                while let Some(name) = map.next_key::<String>()? {
                    if field_matches(&name, "Key") {
                        if let Some(key) = map.next_value::<Option<String>>()? {
                            record.key = key;
                        }
                    } else if field_matches(&name, "Value") {
                        if let Some(value) = map.next_value::<Option<String>>()? {
                            record.value = value;
                        }
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Wire shape of a secrets document
///
/// `Records` may be missing or `null`; both mean "no records". A `null`
/// element inside `Records` is an empty record.
#[derive(Default)]
struct RawDocument {
    config_name: String,
    records: Vec<SecretRecord>,
}

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = RawDocument;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a secrets document object with ConfigName and Records")
            }

            fn visit_map<M>(self, mut map: M) -> Result<RawDocument, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut doc = RawDocument::default();
                while let Some(name) = map.next_key::<String>()? {
                    if field_matches(&name, "ConfigName") {
                        if let Some(config_name) = map.next_value::<Option<String>>()? {
                            doc.config_name = config_name;
                        }
                    } else if field_matches(&name, "Records") {
                        doc.records = map
                            .next_value::<Option<Vec<Option<SecretRecord>>>>()?
                            .unwrap_or_default()
                            .into_iter()
                            .map(Option::unwrap_or_default)
                            .collect();
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(doc)
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    #[serde(rename = "ConfigName")]
    config_name: &'a str,
    #[serde(rename = "Records")]
    records: &'a [SecretRecord],
}

/// A named, immutable collection of configuration records
///
/// Built once from document bytes and only read afterwards, so a set can be
/// shared between threads freely. Keys are not required to be unique; every
/// lookup returns the first matching record.
///
/// # Example
///
/// ```
/// use gcpkit_core::secrets::SecretSet;
///
/// let doc = br#"{"ConfigName":"testing","Records":[{"Key":"IntKey","Value":"42"}]}"#;
/// let secrets = SecretSet::parse(doc).unwrap();
/// assert_eq!(secrets.name(), "testing");
/// assert_eq!(secrets.get_int("IntKey"), 42);
/// assert_eq!(secrets.get_string("missing"), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretSet {
    name: String,
    records: Vec<SecretRecord>,
}

impl SecretSet {
    /// Build a set in code
    pub fn new(name: impl Into<String>, records: Vec<SecretRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Build a set from `(key, value)` pairs
    pub fn from_pairs<K, V, I>(name: impl Into<String>, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::new(
            name,
            pairs.into_iter().map(|(k, v)| SecretRecord::new(k, v)).collect(),
        )
    }

    /// Parse a JSON secrets document
    ///
    /// Empty input and anything that is not a `{ConfigName, Records}` object
    /// fail with [`SecretsError::Parse`]. Field names match in any letter
    /// case and unknown fields are ignored. A bare `null` document is empty.
    pub fn parse(data: &[u8]) -> SecretsResult<Self> {
        if data.is_empty() {
            return Err(SecretsError::Parse("no data passed to parse".to_string()));
        }
        let raw = serde_json::from_slice::<Option<RawDocument>>(data)?.unwrap_or_default();
        Ok(Self {
            name: raw.config_name,
            records: raw.records,
        })
    }

    /// Serialize back into the document shape accepted by [`SecretSet::parse`]
    pub fn to_json(&self) -> SecretsResult<String> {
        let doc = DocumentRef {
            config_name: &self.name,
            records: &self.records,
        };
        serde_json::to_string(&doc).map_err(|e| SecretsError::Parse(e.to_string()))
    }

    /// The document's `ConfigName`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[SecretRecord] {
        &self.records
    }

    /// Keys in document order, duplicates included
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of the first record with exactly this key, if any
    pub fn try_get(&self, key: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.as_str())
    }

    /// Value of the first record with exactly this key, or `""`
    pub fn get_string(&self, key: &str) -> &str {
        self.try_get(key).unwrap_or_default()
    }

    pub fn key_exists(&self, key: &str) -> bool {
        self.try_get(key).is_some()
    }

    /// `true` only when the value is `"true"` in any letter case
    pub fn get_bool(&self, key: &str) -> bool {
        let value = self.get_string(key);
        !value.is_empty() && value.eq_ignore_ascii_case("true")
    }

    /// Base-10 integer value, or `0` when absent or unparsable
    ///
    /// Absent and `"0"` are indistinguishable here; use [`SecretSet::key_exists`]
    /// or [`SecretSet::try_get`] when that matters.
    pub fn get_int(&self, key: &str) -> i64 {
        self.get_string(key).parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TESTING_DOC: &str = r#"{
        "ConfigName": "testing",
        "Records": [{ "Key": "StringKey", "Value": "aString" },
                    { "Key": "BoolKey", "Value": "true"},
                    { "Key": "IntKey", "Value": "42" }]}"#;

    #[test]
    fn test_parse_testing_document() {
        let s = SecretSet::parse(TESTING_DOC.as_bytes()).unwrap();
        assert_eq!(s.name(), "testing");
        assert_eq!(s.len(), 3);
        assert_eq!(s.get_string("StringKey"), "aString");
        assert!(s.get_bool("BoolKey"));
        assert_eq!(s.get_int("IntKey"), 42);
        assert_eq!(s.get_int("BoolKey"), 0);
        assert!(!s.key_exists("babble"));
    }

    #[test]
    fn test_parse_empty_fails() {
        let err = SecretSet::parse(b"").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_malformed_fails() {
        assert!(SecretSet::parse(b"not json").unwrap_err().is_parse());
        assert!(SecretSet::parse(b"[1, 2, 3]").unwrap_err().is_parse());
        assert!(SecretSet::parse(br#"{"Records": "nope"}"#).unwrap_err().is_parse());
    }

    #[test]
    fn test_parse_missing_and_null_records() {
        let s = SecretSet::parse(br#"{"ConfigName": "bare"}"#).unwrap();
        assert_eq!(s.name(), "bare");
        assert!(s.is_empty());

        let s = SecretSet::parse(br#"{"ConfigName": "nulls", "Records": null}"#).unwrap();
        assert!(s.is_empty());

        let s = SecretSet::parse(b"{}").unwrap();
        assert_eq!(s.name(), "");
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let doc = br#"{"ConfigName": "x", "Version": 3,
            "Records": [{"Key": "a", "Value": "1", "Comment": "ignored"}]}"#;
        let s = SecretSet::parse(doc).unwrap();
        assert_eq!(s.get_string("a"), "1");
    }

    #[test]
    fn test_parse_lower_camel_aliases() {
        let doc = br#"{"configName": "lc", "records": [{"key": "a", "value": "b"}]}"#;
        let s = SecretSet::parse(doc).unwrap();
        assert_eq!(s.name(), "lc");
        assert_eq!(s.get_string("a"), "b");
    }

    #[test]
    fn test_parse_field_names_ignore_case() {
        let doc = br#"{"configname":"x","RECORDS":[{"KEY":"a","VALUE":"1"},{"kEy":"b","vAlUe":"2"}]}"#;
        let s = SecretSet::parse(doc).unwrap();
        assert_eq!(s.name(), "x");
        assert_eq!(s.len(), 2);
        assert_eq!(s.get_string("a"), "1");
        assert_eq!(s.get_string("b"), "2");
    }

    #[test]
    fn test_parse_null_strings_are_empty() {
        let doc = br#"{"ConfigName":null,"Records":[{"Key":"a","Value":null},{"Key":null,"Value":"v"},null]}"#;
        let s = SecretSet::parse(doc).unwrap();
        assert_eq!(s.name(), "");
        assert_eq!(s.len(), 3);
        assert_eq!(s.try_get("a"), Some(""));
        assert_eq!(s.try_get(""), Some("v"));
        assert_eq!(s.records()[2], SecretRecord::default());
    }

    #[test]
    fn test_parse_repeated_field_last_wins() {
        let s = SecretSet::parse(br#"{"ConfigName":"x","configName":"y"}"#).unwrap();
        assert_eq!(s.name(), "y");

        let s = SecretSet::parse(br#"{"Records":[{"Key":"a","key":"b","Value":"1"}]}"#).unwrap();
        assert!(!s.key_exists("a"));
        assert_eq!(s.get_string("b"), "1");

        // null does not erase an earlier value
        let s = SecretSet::parse(br#"{"Records":[{"Key":"a","Value":"1","value":null}]}"#).unwrap();
        assert_eq!(s.get_string("a"), "1");

        let s = SecretSet::parse(br#"{"Records":[{"Key":"a"}],"records":null}"#).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_parse_null_document() {
        let s = SecretSet::parse(b"null").unwrap();
        assert_eq!(s, SecretSet::default());
    }

    #[test]
    fn test_parse_wrong_field_types_fail() {
        assert!(SecretSet::parse(br#"{"ConfigName": 5}"#).unwrap_err().is_parse());
        assert!(SecretSet::parse(br#"{"Records":[{"Key":"a","Value":3}]}"#).unwrap_err().is_parse());
        assert!(SecretSet::parse(br#"{"Records":["a"]}"#).unwrap_err().is_parse());
    }

    #[test]
    fn test_first_match_wins() {
        let s = SecretSet::from_pairs("dups", [("k", "first"), ("k", "second")]);
        assert_eq!(s.get_string("k"), "first");
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["k", "k"]);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let s = SecretSet::from_pairs("case", [("Key", "v")]);
        assert!(s.key_exists("Key"));
        assert!(!s.key_exists("key"));
        assert_eq!(s.get_string("KEY"), "");
    }

    #[test]
    fn test_get_bool_values() {
        let s = SecretSet::from_pairs(
            "bools",
            [("a", "True"), ("b", "TRUE"), ("c", "1"), ("d", "yes"), ("e", ""), ("f", " true")],
        );
        assert!(s.get_bool("a"));
        assert!(s.get_bool("b"));
        assert!(!s.get_bool("c"));
        assert!(!s.get_bool("d"));
        assert!(!s.get_bool("e"));
        assert!(!s.get_bool("f"));
        assert!(!s.get_bool("unset"));
    }

    #[test]
    fn test_get_int_values() {
        let s = SecretSet::from_pairs(
            "ints",
            [("pos", "+7"), ("neg", "-12"), ("zero", "0"), ("bad", "4x"), ("space", " 3")],
        );
        assert_eq!(s.get_int("pos"), 7);
        assert_eq!(s.get_int("neg"), -12);
        assert_eq!(s.get_int("zero"), 0);
        assert_eq!(s.get_int("bad"), 0);
        assert_eq!(s.get_int("space"), 0);
        assert_eq!(s.get_int("unset"), 0);
    }

    #[test]
    fn test_try_get_distinguishes_absent_from_zero() {
        let s = SecretSet::from_pairs("zero", [("count", "0"), ("empty", "")]);
        assert_eq!(s.try_get("count"), Some("0"));
        assert_eq!(s.try_get("empty"), Some(""));
        assert_eq!(s.try_get("missing"), None);
    }

    #[test]
    fn test_reserialize_preserves_lookups() {
        let original = SecretSet::parse(TESTING_DOC.as_bytes()).unwrap();
        let json = original.to_json().unwrap();
        let reparsed = SecretSet::parse(json.as_bytes()).unwrap();
        assert_eq!(reparsed, original);
        for key in original.keys() {
            assert_eq!(reparsed.get_string(key), original.get_string(key));
        }
    }
}
