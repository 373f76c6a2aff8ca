//! Store health check: write a probe, read it back, report what happened.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use super::AppState;
use crate::error::StoreError;
use crate::store::{KvStore, get_json, set_json};

#[derive(Debug, Default, Deserialize)]
struct DiagnosticsQuery {
    /// Also exercise the list commands.
    #[serde(default)]
    list: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Probe {
    message: String,
    timestamp: String,
    nonce: String,
}

/// GET /api/diagnostics/store
async fn store_diagnostics(
    State(state): State<AppState>,
    Query(query): Query<DiagnosticsQuery>,
) -> Response {
    let environment = state.store.environment();

    let store = match state.store.get() {
        Ok(store) => store,
        Err(StoreError::NotConfigured { missing }) => {
            error!(missing = ?missing, "Diagnostics requested without store configuration");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Key-value store is not configured",
                    "environment": environment,
                    "missing": missing,
                })),
            )
                .into_response();
        }
        Err(e) => return failure(&e, &environment),
    };

    let key = &state.diagnostics.probe_key;
    let probe = Probe {
        message: "checkout-funnel store probe".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        nonce: Uuid::new_v4().to_string(),
    };

    let outcome = async {
        set_json(store.as_ref(), key, &probe, Some(state.diagnostics.probe_ttl)).await?;
        let retrieved: Option<Probe> = get_json(store.as_ref(), key).await?;
        let list = if query.list {
            Some(list_probe(store.as_ref(), key, &probe.nonce).await?)
        } else {
            None
        };
        Ok::<_, StoreError>((retrieved, list))
    }
    .await;

    match outcome {
        Ok((retrieved, list)) => {
            let matches = retrieved.as_ref() == Some(&probe);
            info!(
                backend = store.backend_name(),
                matches,
                "Store diagnostics completed"
            );
            let mut body = json!({
                "success": true,
                "backend": store.backend_name(),
                "matches": matches,
                "probeKey": key,
                "retrieved": retrieved,
                "environment": environment,
            });
            if let Some(list) = list {
                body["list"] = list;
            }
            Json(body).into_response()
        }
        Err(e) => failure(&e, &environment),
    }
}

/// Push two entries onto a scratch list, read them back, then remove it.
async fn list_probe(store: &dyn KvStore, key: &str, nonce: &str) -> Result<Value, StoreError> {
    let list_key = format!("{key}:list");
    let pushed = [format!("{nonce}:1"), format!("{nonce}:2")];
    for entry in &pushed {
        store.push_list(&list_key, entry).await?;
    }
    let retrieved = store.range_list(&list_key, 0, -1).await?;
    store.delete(&list_key).await?;

    Ok(json!({
        "key": list_key,
        "matches": retrieved == pushed,
        "retrieved": retrieved,
    }))
}

fn failure(e: &StoreError, environment: &impl Serialize) -> Response {
    error!(error = %e, "Store diagnostics failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": e.to_string(),
            "environment": environment,
        })),
    )
        .into_response()
}

pub fn diagnostics_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/diagnostics/store", get(store_diagnostics))
        .with_state(state)
}
