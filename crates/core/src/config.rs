// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination configuration
//!
//! Loaded from TOML. Only process-wide settings live here; lease and dedup
//! TTLs are chosen by the caller on every call.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `store.url`
pub const STORE_URL_ENV: &str = "COORD_STORE_URL";

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinationConfig {
    /// Namespace prepended to every store key
    pub key_prefix: String,
    pub store: StoreSettings,
    pub lock: LockSettings,
}

/// Store endpoint settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    /// `redis://host:port[/db]`, `rediss://...`, or `memory://`
    pub url: String,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Upper bound on any single store round-trip
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
}

/// Lease renewal settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockSettings {
    /// Renewal ticks happen every `ttl / renewal_divisor`
    pub renewal_divisor: u32,
    /// Floor for the renewal interval on very short leases
    #[serde(with = "humantime_serde")]
    pub min_renewal_interval: Duration,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            key_prefix: "coord".to_string(),
            store: StoreSettings::default(),
            lock: LockSettings::default(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(2),
        }
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            renewal_divisor: 3,
            min_renewal_interval: Duration::from_millis(50),
        }
    }
}

impl LockSettings {
    /// Interval between renewal ticks for a lease of `ttl`
    ///
    /// Floored at `min_renewal_interval`, but never more than half the TTL so
    /// a tick always lands while the lease is still alive.
    pub fn renewal_interval(&self, ttl: Duration) -> Duration {
        let divisor = self.renewal_divisor.max(1);
        (ttl / divisor).max(self.min_renewal_interval).min(ttl / 2)
    }
}

impl CoordinationConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let mut config = Self::from_toml(&text, path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for when no file is given
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(STORE_URL_ENV) {
            if !url.is_empty() {
                tracing::debug!("store url overridden from environment");
                self.store.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_prefix.is_empty() {
            return Err(ConfigError::Invalid("key_prefix must not be empty".into()));
        }
        if self.store.url.is_empty() {
            return Err(ConfigError::Invalid("store.url must not be empty".into()));
        }
        if self.store.connect_timeout.is_zero() || self.store.operation_timeout.is_zero() {
            return Err(ConfigError::Invalid("store timeouts must be positive".into()));
        }
        if self.lock.min_renewal_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "lock.min_renewal_interval must be positive".into(),
            ));
        }
        if self.lock.renewal_divisor < 2 {
            return Err(ConfigError::Invalid(
                "lock.renewal_divisor must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
