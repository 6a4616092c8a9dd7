// src/exec/env.rs

use std::collections::BTreeMap;
use std::ffi::OsString;

/// Derive a child environment from `base` plus `overrides`.
///
/// Overrides replace base entries with the same key. Entries with an empty
/// key, from either side, are dropped. Neither input is modified and the
/// process-wide environment is never touched; callers typically pass
/// `std::env::vars_os()` as `base`.
pub fn merge_env<I, K, V>(base: I, overrides: &BTreeMap<String, String>) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut merged: BTreeMap<OsString, OsString> = base
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(k, _)| !k.is_empty())
        .collect();

    for (key, value) in overrides {
        if key.is_empty() {
            continue;
        }
        merged.insert(OsString::from(key), OsString::from(value));
    }

    merged
}
