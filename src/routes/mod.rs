//! HTTP surface of the funnel.

pub mod acceptances;
pub mod admin;
pub mod catalog;
pub mod diagnostics;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::acceptance::{AcceptanceReader, AcceptanceRecorder, RequestContext};
use crate::catalog::Catalog;
use crate::checkout::CheckoutRedirector;
use crate::config::{AppConfig, CheckoutConfig, DiagnosticsConfig};
use crate::error::{AcceptanceError, ConfigError, StoreError};
use crate::store::LazyStore;

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LazyStore>,
    pub recorder: Arc<AcceptanceRecorder>,
    pub reader: Arc<AcceptanceReader>,
    pub catalog: Arc<Catalog>,
    pub redirector: CheckoutRedirector,
    /// Served to wizard clients; the redirect route only uses the fallback URL.
    pub checkout: CheckoutConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<LazyStore>, catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            recorder: Arc::new(AcceptanceRecorder::new(Arc::clone(&store))),
            reader: Arc::new(AcceptanceReader::new(Arc::clone(&store))),
            redirector: CheckoutRedirector::new(
                Arc::clone(&catalog),
                config.checkout.fallback_url.clone(),
            ),
            catalog,
            store,
            checkout: config.checkout.clone(),
            diagnostics: config.diagnostics.clone(),
        }
    }
}

/// Error reply for the JSON API: `{"success": false, "error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<AcceptanceError> for ApiError {
    fn from(e: AcceptanceError) -> Self {
        match e {
            AcceptanceError::Validation { .. } => Self::Validation(e.to_string()),
            AcceptanceError::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"success": false, "error": message})),
            )
                .into_response(),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(json!({"success": false, "error": message})),
            )
                .into_response(),
            Self::Store(StoreError::NotConfigured { missing }) => {
                error!(missing = ?missing, "Key-value store is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Key-value store is not configured",
                        "missing": missing,
                    })),
                )
                    .into_response()
            }
            Self::Store(e) => {
                error!(error = %e, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false, "error": e.to_string()})),
                )
                    .into_response()
            }
        }
    }
}

/// Best-effort origin of a request: first `X-Forwarded-For` entry, else
/// the peer address, plus the `User-Agent` header.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: header::HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let forwarded = header_str(header::HeaderName::from_static("x-forwarded-for"))
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(RequestContext {
            ip: forwarded.or(peer),
            user_agent: header_str(header::USER_AGENT),
        })
    }
}

/// CORS for the API. `None` allows any origin.
pub fn cors_layer(allow_origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    let origin = match allow_origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin).map_err(|e| ConfigError::InvalidValue {
                key: "CORS_ALLOW_ORIGIN".to_string(),
                message: e.to_string(),
            })?;
            AllowOrigin::exact(value)
        }
        None => AllowOrigin::from(Any),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "checkout-funnel"
    }))
}

/// Build the full application router.
pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(catalog::catalog_routes(state.clone()))
        .merge(acceptances::acceptance_routes(state.clone()))
        .merge(admin::admin_routes(state.clone()))
        .merge(diagnostics::diagnostics_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
