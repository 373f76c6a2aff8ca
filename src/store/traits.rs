//! Single async interface over the key-value store.
//!
//! Every backend speaks the same small command set: plain string values
//! with optional expiry, hashes for structured records, and lists for
//! append-only id indexes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Backend-agnostic key-value store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name for logs and diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Round-trip check against the backend.
    async fn ping(&self) -> Result<(), StoreError>;

    // ── Strings ─────────────────────────────────────────────────────

    /// Get a raw string value.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a raw string value, optionally expiring after `ttl`.
    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    /// Delete a key. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// List keys matching a glob pattern (`*` and `?`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    // ── Hashes ──────────────────────────────────────────────────────

    /// Write fields into the hash at `key`.
    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// Read every field of the hash at `key`. Empty if the key is missing.
    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    // ── Lists ───────────────────────────────────────────────────────

    /// Append to the list at `key`. Returns the new length.
    async fn push_list(&self, key: &str, value: &str) -> Result<u64, StoreError>;

    /// Read list elements `start..=stop`; negative indices count from the end.
    async fn range_list(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError>;
}
