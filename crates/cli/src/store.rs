// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store selection from the configured URL

use coord_adapters::StoreError;
use thiserror::Error;

/// Kind of store a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Process-local store; state ends with the command
    Memory,
    Redis,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, UnsupportedStore> {
        match url.split_once("://").map(|(scheme, _)| scheme) {
            Some("memory") => Ok(Self::Memory),
            Some("redis" | "rediss" | "redis+unix") => Ok(Self::Redis),
            _ => Err(UnsupportedStore(url.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unsupported store url '{0}' (expected redis://, rediss://, or memory://)")]
pub struct UnsupportedStore(pub String);

/// Failure to reach the store at startup
#[derive(Debug, Error)]
#[error("cannot connect to store: {source}")]
pub struct ConnectError {
    #[source]
    pub source: StoreError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes() {
        assert_eq!(Endpoint::parse("memory://").unwrap(), Endpoint::Memory);
        assert_eq!(Endpoint::parse("redis://127.0.0.1:6379").unwrap(), Endpoint::Redis);
        assert_eq!(Endpoint::parse("rediss://cache:6380/1").unwrap(), Endpoint::Redis);
        assert!(Endpoint::parse("etcd://node:2379").is_err());
        assert!(Endpoint::parse("no-scheme").is_err());
    }
}
