//! CSV export of acceptance records for the admin download.

use chrono::{DateTime, Utc};

use super::model::AcceptanceRecord;

const HEADERS: [&str; 6] = ["ID", "Name", "Email", "Package", "Accepted At", "IP Address"];

/// Download filename for an export taken at `now`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("terms-acceptances-{}.csv", now.format("%Y-%m-%d"))
}

/// Render records as CSV, one row per record in the given order.
pub fn to_csv(records: &[AcceptanceRecord]) -> String {
    let mut out = String::new();
    out.push_str(&HEADERS.join(","));
    out.push('\n');

    for record in records {
        let row = [
            quote(&record.id),
            quote(&record.client_name),
            quote(&record.client_email),
            quote(&record.selected_package),
            quote(&record.accepted_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            quote(record.ip.as_deref().unwrap_or_default()),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
