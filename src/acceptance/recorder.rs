//! Validates a submission and persists it once.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::model::{
    ALL_ACCEPTANCES_KEY, AcceptanceRecord, NewAcceptance, RequestContext, generate_id, record_key,
};
use crate::error::AcceptanceError;
use crate::store::LazyStore;

/// Writes acceptance records to the key-value store.
///
/// Every accepted submission produces a new record; repeated submissions
/// for the same client and package are not merged.
pub struct AcceptanceRecorder {
    store: Arc<LazyStore>,
}

impl AcceptanceRecorder {
    pub fn new(store: Arc<LazyStore>) -> Self {
        Self { store }
    }

    /// Validate, build, and persist a record. Returns the new id.
    pub async fn record(
        &self,
        submission: &NewAcceptance,
        context: &RequestContext,
    ) -> Result<String, AcceptanceError> {
        let record = build_record(submission, context)?;
        let store = self.store.get()?;

        store.set_fields(&record_key(&record.id), &record.to_fields()).await?;
        store.push_list(ALL_ACCEPTANCES_KEY, &record.id).await?;

        info!(
            acceptance_id = %record.id,
            client_email = %record.client_email,
            package = %record.selected_package,
            "Terms accepted and recorded"
        );

        Ok(record.id)
    }
}

/// Check required fields and assemble the record. No side effects.
pub fn build_record(
    submission: &NewAcceptance,
    context: &RequestContext,
) -> Result<AcceptanceRecord, AcceptanceError> {
    let required = [
        ("clientName", &submission.client_name),
        ("clientEmail", &submission.client_email),
        ("package", &submission.selected_package),
        ("signature", &submission.signature),
    ];

    let missing: Vec<&'static str> = required
        .iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AcceptanceError::Validation { missing });
    }

    let field = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
    let now = Utc::now();

    Ok(AcceptanceRecord {
        id: generate_id(now),
        client_name: field(&submission.client_name),
        client_email: field(&submission.client_email),
        selected_package: field(&submission.selected_package),
        signature: field(&submission.signature),
        accepted_at: now,
        ip: context.ip.clone(),
        user_agent: context.user_agent.clone(),
    })
}
