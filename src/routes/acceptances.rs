//! Acceptance creation and lookup endpoints.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::{ApiError, AppState};
use crate::acceptance::{NewAcceptance, RequestContext};

/// POST /api/accept-terms
///
/// Records that a visitor accepted the service terms for a package.
async fn accept_terms(
    State(state): State<AppState>,
    context: RequestContext,
    Json(submission): Json<NewAcceptance>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.recorder.record(&submission, &context).await?;
    Ok(Json(json!({
        "success": true,
        "acceptanceId": id,
        "message": "Terms acceptance recorded successfully",
    })))
}

/// GET /api/acceptances
///
/// Every stored acceptance, newest first.
async fn list_acceptances(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let records = state.reader.list().await?;
    Ok(Json(records))
}

/// GET /api/acceptances/{id}
async fn get_acceptance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.reader.get(&id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("Acceptance {id} not found"))),
    }
}

pub fn acceptance_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/accept-terms", post(accept_terms))
        .route("/api/acceptances", get(list_acceptances))
        .route("/api/acceptances/{id}", get(get_acceptance))
        .with_state(state)
}
