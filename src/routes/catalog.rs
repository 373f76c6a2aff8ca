//! Package catalog and checkout redirect endpoints.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::{Json, Router};

use super::AppState;
use crate::config::CheckoutSettings;

/// GET /api/packages
async fn list_packages(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.tiers().to_vec())
}

/// GET /checkout/{package}
///
/// 303 to the package's hosted checkout page, or to the fallback page
/// for an unknown package.
async fn checkout(State(state): State<AppState>, Path(package): Path<String>) -> Redirect {
    let target = state.redirector.resolve(&package);
    Redirect::to(&target.url)
}

/// GET /api/checkout/settings
///
/// Redirect delay, recording policy and fallback URL for the wizard.
async fn checkout_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(CheckoutSettings::from(&state.checkout))
}

pub fn catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/packages", get(list_packages))
        .route("/api/checkout/settings", get(checkout_settings))
        .route("/checkout/{package}", get(checkout))
        .with_state(state)
}
