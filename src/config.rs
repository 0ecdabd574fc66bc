//! Explicit configuration for the add and verify workflows.
//!
//! Nothing in the crate reads global state: callers build a [`Config`]
//! (usually `Config::default()` or `Config::from_env()`, or by deserializing
//! their own config file) and pass it in.

use serde::Deserialize;

use crate::constants::{
    DEFAULT_MAX_OPEN_FILES, DEFAULT_READ_CHUNK_SIZE, DEFAULT_VERIFY_CONCURRENCY, STORE_FILE_NAME,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File name used when a store is placed next to a release.
    pub store_file_name: String,
    /// Largest single read while hashing file data.
    pub read_chunk_size: usize,
    /// Pieces hashed concurrently.
    pub verify_concurrency: usize,
    /// File handles kept open at once during a verification.
    pub max_open_files: usize,
    /// Hash the release when it is added, if all of its files are present.
    pub verify_on_add: bool,
    /// Proxy URL reserved for remote client synchronization; unused by the core.
    pub proxy: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_file_name: STORE_FILE_NAME.to_string(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            verify_concurrency: DEFAULT_VERIFY_CONCURRENCY,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            verify_on_add: true,
            proxy: None,
        }
    }
}

impl Config {
    /// Creates configuration with `NX_*` environment variable overrides.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(name) = lookup("NX_STORE_FILE").filter(|s| !s.is_empty()) {
            self.store_file_name = name;
        }

        override_parsed(&lookup, "NX_READ_CHUNK_SIZE", &mut self.read_chunk_size);
        override_parsed(&lookup, "NX_VERIFY_CONCURRENCY", &mut self.verify_concurrency);
        override_parsed(&lookup, "NX_MAX_OPEN_FILES", &mut self.max_open_files);
        override_parsed(&lookup, "NX_VERIFY_ON_ADD", &mut self.verify_on_add);

        if let Some(proxy) = lookup("NX_PROXY") {
            self.proxy = Some(proxy).filter(|p| !p.is_empty());
        }

        self.normalized()
    }

    /// Clamps the tuning values to at least one.
    pub fn normalized(mut self) -> Self {
        self.read_chunk_size = self.read_chunk_size.max(1);
        self.verify_concurrency = self.verify_concurrency.max(1);
        self.max_open_files = self.max_open_files.max(1);
        self
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!(key, value = %raw, "ignoring invalid config override"),
        }
    }
}
