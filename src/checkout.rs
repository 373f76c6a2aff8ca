//! Checkout redirector: maps a package name to its hosted payment page
//! and performs the one-shot navigation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::catalog::Catalog;

/// Performs a full-page navigation. Not reversible once called.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// Where a package's checkout lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTarget {
    pub package: String,
    pub url: String,
    /// True when the package had no configured URL.
    pub used_fallback: bool,
}

/// Resolves checkout URLs from the static catalog.
#[derive(Debug, Clone)]
pub struct CheckoutRedirector {
    catalog: Arc<Catalog>,
    fallback_url: String,
}

impl CheckoutRedirector {
    pub fn new(catalog: Arc<Catalog>, fallback_url: impl Into<String>) -> Self {
        Self {
            catalog,
            fallback_url: fallback_url.into(),
        }
    }

    pub fn resolve(&self, package: &str) -> CheckoutTarget {
        match self.catalog.find(package) {
            Some(tier) => CheckoutTarget {
                package: package.to_string(),
                url: tier.checkout_url.clone(),
                used_fallback: false,
            },
            None => {
                warn!(package = %package, "No checkout URL for package, using fallback");
                CheckoutTarget {
                    package: package.to_string(),
                    url: self.fallback_url.clone(),
                    used_fallback: true,
                }
            }
        }
    }

    /// Navigate to `target` after `delay`. There is no way to cancel or
    /// retry once scheduled; the handle only reports completion.
    pub fn schedule(
        &self,
        navigator: Arc<dyn Navigator>,
        target: CheckoutTarget,
        delay: Duration,
    ) -> JoinHandle<()> {
        info!(
            package = %target.package,
            url = %target.url,
            delay_ms = delay.as_millis() as u64,
            "Scheduling checkout redirect"
        );
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(&target.url);
        })
    }
}
