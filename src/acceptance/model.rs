//! Acceptance submissions and stored records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Key of the ordered list holding every acceptance id.
pub const ALL_ACCEPTANCES_KEY: &str = "acceptances:all";

/// Hash key for one acceptance record.
pub fn record_key(id: &str) -> String {
    format!("acceptance:{id}")
}

/// Generate a fresh acceptance id: `acc_<unix millis>_<9 base36 chars>`.
pub fn generate_id(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("acc_{}_{}", now.timestamp_millis(), suffix)
}

/// Body of the acceptance creation endpoint.
///
/// Every field is optional here so that an omitted field surfaces as a
/// validation error rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAcceptance {
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default, rename = "package")]
    pub selected_package: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl NewAcceptance {
    pub fn new(
        client_name: impl Into<String>,
        client_email: impl Into<String>,
        selected_package: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            client_name: Some(client_name.into()),
            client_email: Some(client_email.into()),
            selected_package: Some(selected_package.into()),
            signature: Some(signature.into()),
        }
    }
}

/// Origin of a submission, captured best effort from the HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// One visitor's stored agreement to the terms for a package tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceRecord {
    pub id: String,
    pub client_name: String,
    pub client_email: String,
    pub selected_package: String,
    pub signature: String,
    pub accepted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl AcceptanceRecord {
    /// Flatten into hash fields for storage. Absent optional fields are omitted.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("id".to_string(), self.id.clone()),
            ("clientName".to_string(), self.client_name.clone()),
            ("clientEmail".to_string(), self.client_email.clone()),
            ("selectedPackage".to_string(), self.selected_package.clone()),
            ("signature".to_string(), self.signature.clone()),
            ("acceptedAt".to_string(), self.accepted_at.to_rfc3339()),
        ];
        if let Some(ref ip) = self.ip {
            fields.push(("ip".to_string(), ip.clone()));
        }
        if let Some(ref ua) = self.user_agent {
            fields.push(("userAgent".to_string(), ua.clone()));
        }
        fields
    }

    /// Rebuild a record from stored hash fields.
    ///
    /// Returns `None` for partially written hashes: no `id`, or an
    /// `acceptedAt` that does not parse. Other missing text fields are
    /// read as empty.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let id = fields.get("id").filter(|id| !id.is_empty())?.clone();
        let accepted_at = DateTime::parse_from_rfc3339(fields.get("acceptedAt")?)
            .ok()?
            .with_timezone(&Utc);
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
        let optional = |name: &str| fields.get(name).filter(|v| !v.is_empty()).cloned();

        Some(Self {
            id,
            client_name: text("clientName"),
            client_email: text("clientEmail"),
            selected_package: text("selectedPackage"),
            signature: text("signature"),
            accepted_at,
            ip: optional("ip"),
            user_agent: optional("userAgent"),
        })
    }
}
