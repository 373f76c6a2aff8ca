//! Package tiers offered on the landing page.
//!
//! The catalog is static per deployment: the built-in tiers, or a JSON
//! file named by `FUNNEL_CATALOG_PATH`.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Billing period for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    /// Suffix shown after the price, e.g. `/month`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Monthly => "/month",
            Self::Yearly => "/year",
        }
    }
}

/// One subscription offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageTier {
    pub name: String,
    /// Price in USD per billing period.
    pub price: Decimal,
    pub period: BillingPeriod,
    pub features: Vec<String>,
    /// Call-to-action label.
    pub cta: String,
    /// Externally hosted checkout page.
    pub checkout_url: String,
    #[serde(default)]
    pub featured: bool,
}

impl PackageTier {
    /// Price as displayed, e.g. `$1,799/month`.
    pub fn display_price(&self) -> String {
        let rounded = self.price.round_dp(2);
        let whole = rounded.trunc();
        let cents = ((rounded - whole) * dec!(100)).trunc();

        let digits = whole.to_string();
        let mut grouped = String::new();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if cents.is_zero() {
            format!("${grouped}{}", self.period.suffix())
        } else {
            format!("${grouped}.{:0>2}{}", cents.to_string(), self.period.suffix())
        }
    }
}

/// The set of tiers for this deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tiers: Vec<PackageTier>,
}

impl Catalog {
    pub fn new(tiers: Vec<PackageTier>) -> Self {
        Self { tiers }
    }

    /// Load a catalog from a JSON array of tiers.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        if catalog.tiers.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "FUNNEL_CATALOG_PATH".to_string(),
                message: "catalog has no tiers".to_string(),
            });
        }
        if let Some(tier) = catalog.tiers.iter().find(|t| t.price < Decimal::ZERO) {
            return Err(ConfigError::InvalidValue {
                key: "FUNNEL_CATALOG_PATH".to_string(),
                message: format!("tier {} has a negative price", tier.name),
            });
        }
        Ok(catalog)
    }

    pub fn tiers(&self) -> &[PackageTier] {
        &self.tiers
    }

    /// Find a tier by exact name.
    pub fn find(&self, name: &str) -> Option<&PackageTier> {
        self.tiers.iter().find(|t| t.name == name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let features = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self::new(vec![
            PackageTier {
                name: "Value-Based Support".into(),
                price: dec!(49),
                period: BillingPeriod::Monthly,
                features: features(&[
                    "Unlimited email & messaging support for quick decisions",
                    "Basic framework access",
                    "Standard response time (24-48 hours)",
                    "Resource library access",
                    "Community forum participation",
                ]),
                cta: "Select Value-Based Support".into(),
                checkout_url: "https://buy.stripe.com/14A3cwbUg8xZ88b47D9IQ00".into(),
                featured: false,
            },
            PackageTier {
                name: "Content Development".into(),
                price: dec!(1799),
                period: BillingPeriod::Monthly,
                features: features(&[
                    "Everything in Value-Based Support",
                    "Full content development suite",
                    "Setup & technical implementation assistance",
                    "Priority response time (4-12 hours)",
                    "Custom framework customization",
                    "Monthly performance reviews",
                ]),
                cta: "Select Content Development".into(),
                checkout_url: "https://buy.stripe.com/aFa00kbUg29BfADcE99IQ01".into(),
                featured: true,
            },
            PackageTier {
                name: "Full Advisory".into(),
                price: dec!(3999),
                period: BillingPeriod::Monthly,
                features: features(&[
                    "Everything in Content Development",
                    "4 hours monthly 1:1 strategic consulting",
                    "Quarterly partnership strategy reviews & performance audits",
                    "Priority access to new partnership frameworks & tools",
                    "Dedicated success manager",
                    "Executive strategy sessions",
                ]),
                cta: "Select Full Advisory".into(),
                checkout_url: "https://buy.stripe.com/3cI6oIbUg01t1JN1Zv9IQ02".into(),
                featured: false,
            },
        ])
    }
}
