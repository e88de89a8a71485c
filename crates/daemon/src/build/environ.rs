// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment assembly for compiler and app processes.

use std::ffi::OsString;

use tracing::warn;

/// Ordered `KEY=value` pairs handed to a child with `env_clear()`.
pub type EnvList = Vec<(String, String)>;

/// Set `key`, dropping any earlier binding of the same name.
pub fn set_env(env: &mut EnvList, key: &str, value: impl Into<String>) {
    env.retain(|(k, _)| k != key);
    env.push((key.to_string(), value.into()));
}

/// Look up the current binding of `key`.
pub fn get_env<'a>(env: &'a [(String, String)], key: &str) -> Option<&'a str> {
    env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Layer `overrides` on top of `base`; the last binding of a name wins.
pub fn merge_env<I, K, V>(base: EnvList, overrides: I) -> EnvList
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut env = base;
    for (key, value) in overrides {
        set_env(&mut env, key.as_ref(), value);
    }
    env
}

/// The daemon's own environment as UTF-8 pairs.
///
/// Variables whose name or value is not valid UTF-8 are left out of the
/// child's environment and logged.
pub fn process_env() -> EnvList {
    utf8_pairs(std::env::vars_os())
}

fn utf8_pairs<I>(vars: I) -> EnvList
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                warn!(%key, "skipping environment variable with non-UTF-8 value");
                None
            }
            (Err(key), _) => {
                warn!(key = %key.to_string_lossy(), "skipping environment variable with non-UTF-8 name");
                None
            }
        })
        .collect()
}

/// Append `dir` to a colon-separated search path.
pub fn append_search_path(existing: Option<&str>, dir: &str) -> String {
    match existing {
        Some(current) if !current.is_empty() => format!("{current}:{dir}"),
        _ => dir.to_string(),
    }
}

#[cfg(test)]
#[path = "environ_tests.rs"]
mod tests;
