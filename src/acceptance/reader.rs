//! Enumerates stored acceptance ids and hydrates the records.

use std::collections::HashSet;
use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{debug, warn};

use super::model::{ALL_ACCEPTANCES_KEY, AcceptanceRecord, record_key};
use crate::error::StoreError;
use crate::store::{KvStore, LazyStore};

/// Upper bound on record reads in flight during `list`.
const HYDRATE_CONCURRENCY: usize = 16;

/// Read-only view over stored acceptances.
pub struct AcceptanceReader {
    store: Arc<LazyStore>,
}

impl AcceptanceReader {
    pub fn new(store: Arc<LazyStore>) -> Self {
        Self { store }
    }

    /// Every readable record, newest `acceptedAt` first.
    ///
    /// A missing index yields an empty list. Records that cannot be read,
    /// or lack an id or a parseable timestamp, are skipped.
    pub async fn list(&self) -> Result<Vec<AcceptanceRecord>, StoreError> {
        let store = self.store.get()?;
        let ids = store.range_list(ALL_ACCEPTANCES_KEY, 0, -1).await?;

        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
        debug!(count = unique.len(), "Hydrating acceptance records");

        let pending: Vec<_> = unique.iter().map(|id| hydrate(store.as_ref(), id)).collect();
        let hydrated: Vec<_> = stream::iter(pending)
            .buffered(HYDRATE_CONCURRENCY)
            .collect()
            .await;

        let mut records = Vec::with_capacity(hydrated.len());
        for (id, result) in unique.iter().zip(hydrated) {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => warn!(acceptance_id = %id, "Skipping incomplete acceptance record"),
                Err(e) => warn!(acceptance_id = %id, error = %e, "Skipping unreadable acceptance record"),
            }
        }

        sort_newest_first(&mut records);
        Ok(records)
    }

    /// One record by id, `None` if absent or incomplete.
    pub async fn get(&self, id: &str) -> Result<Option<AcceptanceRecord>, StoreError> {
        let store = self.store.get()?;
        hydrate(store.as_ref(), id).await
    }
}

async fn hydrate(store: &dyn KvStore, id: &str) -> Result<Option<AcceptanceRecord>, StoreError> {
    let fields = store.get_fields(&record_key(id)).await?;
    if fields.is_empty() {
        return Ok(None);
    }
    Ok(AcceptanceRecord::from_fields(&fields))
}

/// Sort by `acceptedAt` descending; ties keep a stable id order.
pub fn sort_newest_first(records: &mut [AcceptanceRecord]) {
    records.sort_by(|a, b| b.accepted_at.cmp(&a.accepted_at).then_with(|| a.id.cmp(&b.id)));
}
