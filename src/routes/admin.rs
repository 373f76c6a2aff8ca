//! Admin export of acceptance records.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use tracing::info;

use super::{ApiError, AppState};
use crate::acceptance::{export_filename, to_csv};

/// GET /api/admin/acceptances/export
///
/// CSV download of every acceptance, newest first.
async fn export_acceptances(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let records = state.reader.list().await?;
    let filename = export_filename(Utc::now());
    info!(count = records.len(), filename = %filename, "Exporting acceptances");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        to_csv(&records),
    ))
}

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/admin/acceptances/export", get(export_acceptances))
        .with_state(state)
}
