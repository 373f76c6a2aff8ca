//! Checkout funnel: package catalog, terms-acceptance recording, and the
//! client-side wizard that leads to a hosted checkout page.

pub mod acceptance;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod wizard;

use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::{AppConfig, StoreBackend};
use crate::routes::AppState;
use crate::store::{KvStore, LazyStore, MemoryStore};

/// Assemble the router from configuration: store backend, catalog, CORS.
pub fn build_app(config: &AppConfig) -> error::Result<Router> {
    let store = match config.store_backend {
        StoreBackend::Upstash => LazyStore::from_config(config.store.clone()),
        StoreBackend::Memory => LazyStore::preloaded(Arc::new(MemoryStore::new()) as Arc<dyn KvStore>),
    };
    info!(
        backend = %config.store_backend,
        configured = store.is_configured(),
        "Key-value store ready"
    );

    let catalog = match &config.catalog_path {
        Some(path) => {
            let catalog = Catalog::load(path)?;
            info!(path = %path.display(), tiers = catalog.tiers().len(), "Loaded package catalog");
            catalog
        }
        None => Catalog::default(),
    };

    let cors = routes::cors_layer(config.cors_allow_origin.as_deref())?;
    let state = AppState::new(config, Arc::new(store), catalog);
    Ok(routes::app(state, cors))
}
