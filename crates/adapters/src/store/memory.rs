// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store for single-process deployments and tests
//!
//! All instances cloned from one `MemoryStore` share the same map. Expired
//! entries are dropped lazily when touched, measured on the injected clock.

use super::{Store, StoreError};
use async_trait::async_trait;
use coord_core::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    /// Members in insertion order, without duplicates
    Set(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Mutex-guarded key-value store with TTL expiry
#[derive(Clone)]
pub struct MemoryStore<C: Clock = SystemClock> {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: C,
}

impl MemoryStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining lifetime of `key`, `None` if absent or persistent
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.with_entries(|entries| {
            let entry = live(entries, key, now)?;
            entry.expires_at.map(|at| at.saturating_duration_since(now))
        })
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, Entry>) -> R) -> R {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut entries)
    }

    fn create(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::Command(format!("invalid expire time for {key}")));
        }
        let now = self.clock.now();
        Ok(self.with_entries(|entries| {
            if live(entries, key, now).is_some() {
                return false;
            }
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Text(value.to_string()),
                    expires_at: Some(now + ttl),
                },
            );
            true
        }))
    }

    /// Apply `update` to the text entry at `key` if it equals `expected`
    fn compare_and<F>(&self, key: &str, expected: &str, update: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut HashMap<String, Entry>, Instant),
    {
        let now = self.clock.now();
        self.with_entries(|entries| {
            let matches = match live(entries, key, now) {
                None => false,
                Some(Entry {
                    value: Value::Text(current),
                    ..
                }) => current.as_str() == expected,
                Some(_) => return Err(StoreError::WrongType(key.to_string())),
            };
            if matches {
                update(entries, now);
            }
            Ok(matches)
        })
    }

    fn with_set<R>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&mut Vec<String>>) -> R,
    ) -> Result<R, StoreError> {
        let now = self.clock.now();
        self.with_entries(|entries| match live(entries, key, now) {
            None => Ok(f(None)),
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(f(Some(members))),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        })
    }
}

/// Look up a live entry, dropping it first if it has expired
fn live<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    now: Instant,
) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

#[async_trait]
impl<C: Clock> Store for MemoryStore<C> {
    async fn try_create(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.create(key, value, ttl)
    }

    async fn try_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        self.compare_and(key, expected, |entries, _| {
            entries.remove(key);
        })
    }

    async fn refresh(&self, key: &str, expected: &str, ttl: Duration) -> Result<bool, StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::Command(format!("invalid expire time for {key}")));
        }
        self.compare_and(key, expected, |entries, now| {
            if let Some(entry) = entries.get_mut(key) {
                entry.expires_at = Some(now + ttl);
            }
        })
    }

    async fn try_replace(
        &self,
        key: &str,
        expected: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.compare_and(key, expected, |entries, _| {
            if let Some(entry) = entries.get_mut(key) {
                entry.value = Value::Text(value.to_string());
            }
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        self.with_entries(|entries| match live(entries, key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(v),
                ..
            }) => Ok(Some(v.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        })
    }

    async fn append_to_set(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.with_entries(|entries| match live(entries, key, now) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => {
                if !members.iter().any(|m| m == member) {
                    members.push(member.to_string());
                }
                Ok(())
            }
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Set(vec![member.to_string()]),
                        expires_at: None,
                    },
                );
                Ok(())
            }
        })
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.with_set(key, |members| {
            members.is_some_and(|members| members.iter().any(|m| m == member))
        })
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.with_set(key, |members| members.map(|m| m.to_vec()).unwrap_or_default())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        Ok(self.with_entries(|entries| {
            let existed = live(entries, key, now).is_some();
            entries.remove(key);
            existed
        }))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
