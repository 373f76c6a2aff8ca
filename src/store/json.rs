//! JSON value helpers on top of [`KvStore`].

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::traits::KvStore;
use crate::error::StoreError;

/// Serialize `value` and store it under `key`, optionally expiring.
pub async fn set_json<T>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.set_raw(key, &json, ttl).await
}

/// Load and deserialize the value under `key`.
///
/// A failed read or a value that does not parse as `T` is logged and
/// reported as absent. Only a missing configuration is an error.
pub async fn get_json<T>(store: &dyn KvStore, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    let raw = match store.get_raw(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Ok(None),
        Err(e @ StoreError::NotConfigured { .. }) => return Err(e),
        Err(e) => {
            warn!(key = %key, error = %e, "Store read failed, treating as missing");
            return Ok(None);
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key = %key, error = %e, "Stored value is not valid JSON, treating as missing");
            Ok(None)
        }
    }
}
