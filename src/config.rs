//! Configuration types.
//!
//! Everything is read from environment variables. Store credentials are
//! optional at load time so that the server can still start and report
//! which variable is missing from the diagnostics route.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Env var naming the hosted store's REST endpoint.
pub const STORE_URL_VAR: &str = "UPSTASH_REDIS_REST_URL";
/// Env var naming the hosted store's access token.
pub const STORE_TOKEN_VAR: &str = "UPSTASH_REDIS_REST_TOKEN";

/// Checkout page used when a package name has no configured URL.
pub const DEFAULT_FALLBACK_CHECKOUT_URL: &str = "https://buy.stripe.com/test_00g3f0bNBeKZ0wg5kk";

/// What happens when recording an acceptance fails during checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingPolicy {
    /// Surface the error and keep the visitor on the review step.
    Strict,
    /// Log the failure and continue to checkout anyway.
    BestEffort,
}

impl Default for RecordingPolicy {
    fn default() -> Self {
        Self::BestEffort
    }
}

impl std::fmt::Display for RecordingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::BestEffort => write!(f, "best_effort"),
        }
    }
}

impl FromStr for RecordingPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            other => Err(format!("Unknown recording policy: {}", other)),
        }
    }
}

/// Which store implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted Upstash-compatible REST endpoint.
    Upstash,
    /// In-process map, for local development.
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstash => write!(f, "upstash"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upstash" | "redis" => Ok(Self::Upstash),
            "memory" => Ok(Self::Memory),
            other => Err(format!("Unknown store backend: {}", other)),
        }
    }
}

/// Credentials for the hosted key-value store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub token: Option<SecretString>,
}

impl StoreConfig {
    /// Read the store variables. Missing values stay `None`; the store
    /// handle reports them on first use.
    pub fn from_env() -> Self {
        let url = non_empty_var(STORE_URL_VAR);
        let token = non_empty_var(STORE_TOKEN_VAR).map(SecretString::from);
        Self { url, token }
    }

    pub fn has_url(&self) -> bool {
        self.url.is_some()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Names of the required variables that are not set.
    pub fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.has_url() {
            missing.push(STORE_URL_VAR.to_string());
        }
        if !self.has_token() {
            missing.push(STORE_TOKEN_VAR.to_string());
        }
        missing
    }
}

/// Settings for the single store health-check route.
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub probe_key: String,
    pub probe_ttl: Duration,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            probe_key: "diagnostics:probe".to_string(),
            probe_ttl: Duration::from_secs(60),
        }
    }
}

/// Checkout behaviour shared by the redirect route and the wizard.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub fallback_url: String,
    /// Delay between completing the wizard and navigating away.
    pub redirect_delay: Duration,
    pub recording_policy: RecordingPolicy,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            fallback_url: DEFAULT_FALLBACK_CHECKOUT_URL.to_string(),
            redirect_delay: Duration::from_secs(2),
            recording_policy: RecordingPolicy::default(),
        }
    }
}

/// Wire form of [`CheckoutConfig`], served to clients that host the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSettings {
    pub fallback_url: String,
    pub redirect_delay_ms: u64,
    pub recording_policy: RecordingPolicy,
}

impl From<&CheckoutConfig> for CheckoutSettings {
    fn from(config: &CheckoutConfig) -> Self {
        Self {
            fallback_url: config.fallback_url.clone(),
            redirect_delay_ms: u64::try_from(config.redirect_delay.as_millis()).unwrap_or(u64::MAX),
            recording_policy: config.recording_policy,
        }
    }
}

impl From<CheckoutSettings> for CheckoutConfig {
    fn from(settings: CheckoutSettings) -> Self {
        Self {
            fallback_url: settings.fallback_url,
            redirect_delay: Duration::from_millis(settings.redirect_delay_ms),
            recording_policy: settings.recording_policy,
        }
    }
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub store: StoreConfig,
    pub catalog_path: Option<PathBuf>,
    pub checkout: CheckoutConfig,
    pub diagnostics: DiagnosticsConfig,
    /// `None` allows any origin.
    pub cors_allow_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            store_backend: StoreBackend::Upstash,
            store: StoreConfig::default(),
            catalog_path: None,
            checkout: CheckoutConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            cors_allow_origin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let checkout = CheckoutConfig {
            fallback_url: non_empty_var("CHECKOUT_FALLBACK_URL")
                .unwrap_or(defaults.checkout.fallback_url),
            redirect_delay: parse_var::<u64>("CHECKOUT_REDIRECT_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.checkout.redirect_delay),
            recording_policy: parse_var("RECORDING_POLICY")?
                .unwrap_or(defaults.checkout.recording_policy),
        };

        let diagnostics = DiagnosticsConfig {
            probe_key: non_empty_var("DIAGNOSTICS_PROBE_KEY")
                .unwrap_or(defaults.diagnostics.probe_key),
            probe_ttl: parse_var::<u64>("DIAGNOSTICS_PROBE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.diagnostics.probe_ttl),
        };

        Ok(Self {
            port: parse_var("FUNNEL_PORT")?.unwrap_or(defaults.port),
            store_backend: parse_var("STORE_BACKEND")?.unwrap_or(defaults.store_backend),
            store: StoreConfig::from_env(),
            catalog_path: non_empty_var("FUNNEL_CATALOG_PATH").map(PathBuf::from),
            checkout,
            diagnostics,
            cors_allow_origin: non_empty_var("CORS_ALLOW_ORIGIN"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional variable, failing on a present-but-invalid value.
fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}
