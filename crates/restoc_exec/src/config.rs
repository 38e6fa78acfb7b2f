//! Host and executor configuration.

use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_port() -> u16 {
    3306
}

/// Connection parameters for one named host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostConfig {
    /// Server address.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// User name.
    #[serde(default)]
    pub user: String,
    /// Password.
    #[serde(default, alias = "passwd")]
    pub password: String,
    /// Default database, if any.
    #[serde(default)]
    pub db: Option<String>,
    /// Connection charset, sent with `SET NAMES` on every new cursor.
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl HostConfig {
    /// Creates a configuration for `host` with default values.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            db: None,
            charset: default_charset(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets user and password.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Sets the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }
}

/// Named host configurations.
///
/// The registry is an owned value handed to an executor at construction.
#[derive(Debug, Default)]
pub struct HostRegistry {
    hosts: RwLock<HashMap<String, HostConfig>>,
}

impl HostRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `info` under `name`.
    ///
    /// Returns false, leaving the stored entry alone, if the name is
    /// already taken and `update` is not set.
    pub fn add_host(&self, name: impl Into<String>, info: HostConfig, update: bool) -> bool {
        let name = name.into();
        let mut hosts = self.hosts.write();
        if hosts.contains_key(&name) && !update {
            return false;
        }
        hosts.insert(name, info);
        true
    }

    /// Returns a copy of the configuration for `name`.
    pub fn get(&self, name: &str) -> Option<HostConfig> {
        self.hosts.read().get(name).cloned()
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.hosts.read().contains_key(name)
    }
}

/// Retry behaviour for transient (operational) failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts before giving up with a connectivity error.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
    /// Operational error codes that will never succeed on retry.
    pub fatal_codes: Vec<u32>,
}

impl RetryConfig {
    /// Creates a configuration with `max_attempts` and the default backoff.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_secs(1),
            // bad table, bad field, column count mismatch
            fatal_codes: vec![1051, 1054, 1136],
        }
    }

    /// Creates a configuration that never retries.
    pub fn no_retry() -> Self {
        Self::new(1).with_backoff(Duration::ZERO)
    }

    /// Sets the fixed backoff.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replaces the list of non-retryable operational codes.
    #[must_use]
    pub fn with_fatal_codes(mut self, codes: Vec<u32>) -> Self {
        self.fatal_codes = codes;
        self
    }

    /// Returns true if operational `code` should be retried.
    pub fn is_transient(&self, code: u32) -> bool {
        !self.fatal_codes.contains(&code)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Configuration for a [`crate::PooledExecutor`].
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Retry configuration.
    pub retry: RetryConfig,
}

impl ExecutorConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
