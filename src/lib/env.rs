//! Explicit snapshot of the process environment.
//!
//! Configuration resolution and the launch workflow read variables from an
//! [`EnvSnapshot`] instead of `std::env`, so tests can substitute their own map.

use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
    path::PathBuf,
};

pub const LEET_HOME: &str = "LEET_HOME";
pub const LEET_EXECUTABLE: &str = "LEET_EXECUTABLE";
pub const EDS_LLM_API_KEY: &str = "EDS_LLM_API_KEY";
pub const UV_HTTP_TIMEOUT: &str = "UV_HTTP_TIMEOUT";
pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const CONTEXT_LENGTH: &str = "CONTEXT_LENGTH";
pub const ENABLE_DEBUG_LOGGING: &str = "ENABLE_DEBUG_LOGGING";
pub const MCP_CONFIG_PATH: &str = "MCP_CONFIG_PATH";
pub const PATH: &str = "PATH";
pub const HOME: &str = "HOME";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
    /// Entries whose name or value is not UTF-8. Never read, only handed to children.
    opaque: BTreeMap<OsString, OsString>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self::from_os_pairs(std::env::vars_os())
    }

    pub fn from_os_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut snapshot = Self::default();
        for (key, value) in pairs {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => {
                    snapshot.vars.insert(key, value);
                }
                (key, value) => {
                    let key = key.map_or_else(|raw| raw, OsString::from);
                    let value = value.map_or_else(|raw| raw, OsString::from);
                    snapshot.opaque.insert(key, value);
                }
            }
        }
        snapshot
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            opaque: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value of `key` unless it is unset or blank.
    pub fn get_nonempty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    pub fn path_buf(&self, key: &str) -> Option<PathBuf> {
        self.get_nonempty(key).map(PathBuf::from)
    }

    /// True for `1`, `true`, `yes` and `on` (case-insensitive).
    pub fn flag(&self, key: &str) -> bool {
        self.get_nonempty(key)
            .map(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(false)
    }

    pub fn search_path(&self) -> Option<&OsStr> {
        self.get(PATH)
            .map(OsStr::new)
            .or_else(|| self.opaque.get(OsStr::new(PATH)).map(OsString::as_os_str))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Insert `value` only when `key` is unset or blank.
    pub fn set_default(&mut self, key: &str, value: impl Into<String>) {
        if self.get_nonempty(key).is_none() {
            self.vars.insert(key.to_string(), value.into());
        }
    }

    /// Every variable a child process should see, non-UTF-8 ones included.
    pub fn child_env(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.opaque
            .iter()
            .map(|(key, value)| (key.as_os_str(), value.as_os_str()))
            .chain(
                self.vars
                    .iter()
                    .map(|(key, value)| (OsStr::new(key), OsStr::new(value))),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_missing() {
        let env = EnvSnapshot::from_pairs([(LEET_HOME, "  "), (EDS_LLM_API_KEY, "key")]);
        assert_eq!(env.get(LEET_HOME), Some("  "));
        assert!(env.get_nonempty(LEET_HOME).is_none());
        assert_eq!(env.get_nonempty(EDS_LLM_API_KEY), Some("key"));
    }

    #[test]
    fn set_default_keeps_existing_value() {
        let mut env = EnvSnapshot::from_pairs([(UV_HTTP_TIMEOUT, "30")]);
        env.set_default(UV_HTTP_TIMEOUT, "120");
        assert_eq!(env.get(UV_HTTP_TIMEOUT), Some("30"));

        let mut empty = EnvSnapshot::default();
        empty.set_default(UV_HTTP_TIMEOUT, "120");
        assert_eq!(empty.get(UV_HTTP_TIMEOUT), Some("120"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_entries_are_forwarded_to_children() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"caf\xe9".to_vec());
        let env = EnvSnapshot::from_os_pairs([
            (OsString::from("LANG_NAME"), raw.clone()),
            (OsString::from(LEET_HOME), OsString::from("/srv/leet")),
        ]);

        assert!(env.get("LANG_NAME").is_none());
        assert_eq!(env.get(LEET_HOME), Some("/srv/leet"));
        let forwarded: Vec<_> = env.child_env().collect();
        assert!(forwarded.contains(&(OsStr::new("LANG_NAME"), raw.as_os_str())));
        assert!(forwarded.contains(&(OsStr::new(LEET_HOME), OsStr::new("/srv/leet"))));
    }

    #[test]
    fn flag_accepts_common_truthy_values() {
        let env = EnvSnapshot::from_pairs([("A", "TRUE"), ("B", "0"), ("C", "on")]);
        assert!(env.flag("A"));
        assert!(!env.flag("B"));
        assert!(env.flag("C"));
        assert!(!env.flag("MISSING"));
    }
}
