//! Acceptance submission from the wizard: over HTTP to the funnel API,
//! or straight into a recorder when running in-process.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::acceptance::{AcceptanceRecorder, NewAcceptance, RequestContext};
use crate::config::{CheckoutConfig, CheckoutSettings};
use crate::error::SubmitError;

/// Delivers a completed wizard submission and returns the acceptance id.
#[async_trait]
pub trait AcceptanceSubmitter: Send + Sync {
    async fn submit(&self, submission: &NewAcceptance) -> Result<String, SubmitError>;
}

/// Reply of `POST /api/accept-terms`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptReply {
    #[serde(default)]
    success: bool,
    acceptance_id: Option<String>,
    error: Option<String>,
}

/// Posts submissions to a running funnel server.
pub struct HttpSubmitter {
    client: reqwest::Client,
    base_url: String,
    endpoint: String,
}

impl HttpSubmitter {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{base_url}/api/accept-terms"),
            base_url,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Checkout behaviour configured on the server (redirect delay,
    /// recording policy, fallback URL).
    pub async fn checkout_config(&self) -> Result<CheckoutConfig, SubmitError> {
        let resp = self
            .client
            .get(format!("{}/api/checkout/settings", self.base_url))
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }
        let settings: CheckoutSettings = resp
            .json()
            .await
            .map_err(|e| SubmitError::Transport(format!("unreadable settings: {e}")))?;
        Ok(settings.into())
    }
}

#[async_trait]
impl AcceptanceSubmitter for HttpSubmitter {
    async fn submit(&self, submission: &NewAcceptance) -> Result<String, SubmitError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let reply = serde_json::from_str::<AcceptReply>(&body);
        match reply {
            Ok(AcceptReply {
                success: true,
                acceptance_id: Some(id),
                ..
            }) if status.is_success() => {
                debug!(acceptance_id = %id, "Acceptance submitted");
                Ok(id)
            }
            Ok(AcceptReply { error, .. }) => Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: error.unwrap_or_else(|| "Failed to record acceptance".to_string()),
            }),
            // Not our JSON: a framework rejection or a proxy error page.
            Err(_) if !status.is_success() => Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: body,
            }),
            Err(e) => Err(SubmitError::Transport(format!("unreadable reply: {e}"))),
        }
    }
}

#[async_trait]
impl AcceptanceSubmitter for AcceptanceRecorder {
    async fn submit(&self, submission: &NewAcceptance) -> Result<String, SubmitError> {
        Ok(self.record(submission, &RequestContext::default()).await?)
    }
}
