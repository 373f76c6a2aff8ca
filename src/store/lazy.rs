//! Lazily built store handle.
//!
//! The handle is created once at startup from configuration and passed to
//! whoever needs the store. The backend itself is only constructed on the
//! first `get()`, and a missing credential is reported as a typed
//! `StoreError::NotConfigured` instead of failing at startup.

use std::sync::{Arc, OnceLock};

use tracing::info;

use super::traits::KvStore;
use super::upstash::UpstashStore;
use crate::config::StoreConfig;
use crate::error::StoreError;

/// Which configuration variables are present, for diagnostics payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEnvironment {
    pub has_url: bool,
    pub has_token: bool,
}

/// Explicitly constructed, lazily initialised store handle.
pub struct LazyStore {
    config: StoreConfig,
    cell: OnceLock<Arc<dyn KvStore>>,
}

impl LazyStore {
    /// Handle that builds an Upstash client on first use.
    pub fn from_config(config: StoreConfig) -> Self {
        Self {
            config,
            cell: OnceLock::new(),
        }
    }

    /// Handle wrapping an already built store (memory backend, tests).
    pub fn preloaded(store: Arc<dyn KvStore>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(store);
        Self {
            config: StoreConfig::default(),
            cell,
        }
    }

    /// Whether a store is available or can be built.
    pub fn is_configured(&self) -> bool {
        self.cell.get().is_some() || self.config.missing().is_empty()
    }

    pub fn environment(&self) -> StoreEnvironment {
        if self.cell.get().is_some() {
            return StoreEnvironment {
                has_url: true,
                has_token: true,
            };
        }
        StoreEnvironment {
            has_url: self.config.has_url(),
            has_token: self.config.has_token(),
        }
    }

    /// Get the store, building it on first call.
    pub fn get(&self) -> Result<Arc<dyn KvStore>, StoreError> {
        if let Some(store) = self.cell.get() {
            return Ok(Arc::clone(store));
        }

        let (Some(url), Some(token)) = (&self.config.url, &self.config.token) else {
            return Err(StoreError::NotConfigured {
                missing: self.config.missing(),
            });
        };

        let store = self.cell.get_or_init(|| {
            info!(url = %url, "Initializing Upstash store client");
            Arc::new(UpstashStore::new(url.clone(), token.clone())) as Arc<dyn KvStore>
        });
        Ok(Arc::clone(store))
    }
}
