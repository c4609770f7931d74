//! Slice helpers

use std::collections::HashSet;

/// Distinct values in order of first appearance
pub fn unique_ints(input: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(input.len());
    input.iter().copied().filter(|v| seen.insert(*v)).collect()
}

/// Join integers as `"1,2,3"`; an empty slice gives `""`
pub fn ints_to_csv(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Entries of `values` for which `keep` returns true
pub fn filter_strings<F>(values: &[String], keep: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    values.iter().filter(|v| keep(v)).cloned().collect()
}

/// Set difference `a - b`, keeping the order (and duplicates) of `a`
pub fn strings_diff<S: AsRef<str>>(a: &[S], b: &[S]) -> Vec<String> {
    let exclude: HashSet<&str> = b.iter().map(|s| s.as_ref()).collect();
    a.iter()
        .map(|s| s.as_ref())
        .filter(|s| !exclude.contains(s))
        .map(str::to_string)
        .collect()
}
