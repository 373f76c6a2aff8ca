//! Integration tests for the funnel HTTP API.
//!
//! Each test spins up the full router on a random port with an in-memory
//! store and exercises the real REST contract with reqwest.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use checkout_funnel::build_app;
use checkout_funnel::catalog::Catalog;
use checkout_funnel::checkout::{CheckoutRedirector, Navigator};
use checkout_funnel::config::{
    AppConfig, CheckoutConfig, DEFAULT_FALLBACK_CHECKOUT_URL, RecordingPolicy, StoreBackend,
};
use checkout_funnel::wizard::{
    CheckoutSession, ClientDetails, GateConfig, HttpSubmitter, ModalFlow, ModalStep, WizardStep,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn memory_config() -> AppConfig {
    AppConfig {
        store_backend: StoreBackend::Memory,
        ..Default::default()
    }
}

/// Start the server on a random port, return the port.
async fn start_server(config: AppConfig) -> u16 {
    let app = build_app(&config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

async fn accept(port: u16, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/api/accept-terms"))
        .header("user-agent", "integration-test")
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn list(port: u16) -> Vec<Value> {
    let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/acceptances"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[derive(Default)]
struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        self.visits.lock().unwrap().push(url.to_string());
    }
}

// ── Health & catalog ────────────────────────────────────────────────────

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "checkout-funnel");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_packages_lists_three_tiers() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let body: Vec<Value> = reqwest::get(format!("http://127.0.0.1:{port}/api/packages"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<&str> = body.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["Value-Based Support", "Content Development", "Full Advisory"]
        );
        assert_eq!(body[1]["featured"], true);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn checkout_settings_reflect_server_config() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(AppConfig {
            checkout: CheckoutConfig {
                redirect_delay: Duration::from_millis(1500),
                recording_policy: RecordingPolicy::Strict,
                ..Default::default()
            },
            ..memory_config()
        })
        .await;

        let body: Value = reqwest::get(format!("http://127.0.0.1:{port}/api/checkout/settings"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["redirectDelayMs"], 1500);
        assert_eq!(body["recordingPolicy"], "strict");
        assert_eq!(body["fallbackUrl"], DEFAULT_FALLBACK_CHECKOUT_URL);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn checkout_link_redirects_to_hosted_page() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        let resp = client
            .get(format!("http://127.0.0.1:{port}/checkout/Full%20Advisory"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        assert_eq!(
            resp.headers()["location"],
            "https://buy.stripe.com/3cI6oIbUg01t1JN1Zv9IQ02"
        );

        let resp = client
            .get(format!("http://127.0.0.1:{port}/checkout/Enterprise"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        assert_eq!(resp.headers()["location"], DEFAULT_FALLBACK_CHECKOUT_URL);
    })
    .await
    .expect("test timed out");
}

// ── Acceptances ─────────────────────────────────────────────────────────

#[tokio::test]
async fn accept_terms_records_and_lists() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let resp = accept(
            port,
            json!({
                "clientName": "Jane Doe",
                "clientEmail": "jane@example.com",
                "package": "Content Development",
                "signature": "Jane Doe"
            }),
        )
        .await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
        let id = body["acceptanceId"].as_str().unwrap().to_string();
        assert!(id.starts_with("acc_"));

        let records = list(port).await;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["id"], id);
        assert_eq!(record["clientName"], "Jane Doe");
        assert_eq!(record["clientEmail"], "jane@example.com");
        assert_eq!(record["selectedPackage"], "Content Development");
        assert_eq!(record["signature"], "Jane Doe");
        assert_eq!(record["ip"], "127.0.0.1");
        assert_eq!(record["userAgent"], "integration-test");
        assert!(record["acceptedAt"].is_string());

        let one: Value = reqwest::get(format!("http://127.0.0.1:{port}/api/acceptances/{id}"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(one, *record);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_email_is_rejected_and_nothing_stored() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let resp = accept(
            port,
            json!({
                "clientName": "Jane Doe",
                "package": "Full Advisory",
                "signature": "Jane Doe"
            }),
        )
        .await;
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("clientEmail"));

        assert!(list(port).await.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn forwarded_for_takes_precedence() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/api/accept-terms"))
            .header("x-forwarded-for", "203.0.113.50, 10.0.0.2")
            .json(&json!({
                "clientName": "Sam",
                "clientEmail": "sam@example.com",
                "package": "Full Advisory",
                "signature": "Sam"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let records = list(port).await;
        assert_eq!(records[0]["ip"], "203.0.113.50");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn listing_is_newest_first_and_keeps_duplicates() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let mut ids = Vec::new();
        for _ in 0..3 {
            let body: Value = accept(
                port,
                json!({
                    "clientName": "Jane Doe",
                    "clientEmail": "jane@example.com",
                    "package": "Full Advisory",
                    "signature": "Jane Doe"
                }),
            )
            .await
            .json()
            .await
            .unwrap();
            ids.push(body["acceptanceId"].as_str().unwrap().to_string());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let records = list(port).await;
        assert_eq!(records.len(), 3);
        let listed: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
        assert_eq!(listed, expected);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_acceptance_returns_404() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/acceptances/acc_0_missing"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn csv_export_downloads_every_record() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        for name in ["Ada \"The Countess\" Lovelace", "Grace Hopper"] {
            let resp = accept(
                port,
                json!({
                    "clientName": name,
                    "clientEmail": "client@example.com",
                    "package": "Value-Based Support",
                    "signature": name
                }),
            )
            .await;
            assert_eq!(resp.status(), 200);
        }

        let resp = reqwest::get(format!(
            "http://127.0.0.1:{port}/api/admin/acceptances/export"
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(
            resp.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/csv")
        );
        let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"terms-acceptances-"));
        assert!(disposition.ends_with(".csv\""));

        let csv = resp.text().await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ID,Name,Email,Package,Accepted At,IP Address");
        assert!(csv.contains("\"Ada \"\"The Countess\"\" Lovelace\""));
        assert!(csv.contains("\"Grace Hopper\""));
    })
    .await
    .expect("test timed out");
}

// ── Unconfigured store ──────────────────────────────────────────────────

#[tokio::test]
async fn unconfigured_store_fails_with_500() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(AppConfig::default()).await;

        let resp = accept(
            port,
            json!({
                "clientName": "Jane Doe",
                "clientEmail": "jane@example.com",
                "package": "Full Advisory",
                "signature": "Jane Doe"
            }),
        )
        .await;
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(
            body["missing"],
            json!(["UPSTASH_REDIS_REST_URL", "UPSTASH_REDIS_REST_TOKEN"])
        );

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/diagnostics/store"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["environment"], json!({"hasUrl": false, "hasToken": false}));

        // Validation still comes first.
        let resp = accept(port, json!({})).await;
        assert_eq!(resp.status(), 400);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn diagnostics_round_trip_on_memory_store() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(memory_config()).await;

        let body: Value = reqwest::get(format!(
            "http://127.0.0.1:{port}/api/diagnostics/store?list=true"
        ))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["matches"], true);
        assert_eq!(body["list"]["matches"], true);
    })
    .await
    .expect("test timed out");
}

// ── Wizard against the live API ─────────────────────────────────────────

#[tokio::test]
async fn wizard_flow_records_then_redirects() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(AppConfig {
            checkout: CheckoutConfig {
                redirect_delay: Duration::from_millis(20),
                recording_policy: RecordingPolicy::Strict,
                ..Default::default()
            },
            ..memory_config()
        })
        .await;
        let start = std::time::Instant::now();

        let mut flow = ModalFlow::new(GateConfig::default(), start);
        flow.select_package("Content Development", start);
        assert_eq!(flow.step(), ModalStep::ServiceAgreement);
        flow.gate_mut().on_sentinel(0.95);
        flow.accept_agreement().unwrap();

        let mut wizard = flow.take_wizard().unwrap();
        wizard
            .update_details(ClientDetails {
                client_name: "Jane Doe".into(),
                client_email: "jane@example.com".into(),
                signature: String::new(),
            })
            .unwrap();
        wizard.proceed_to_review().unwrap();

        let navigator = Arc::new(RecordingNavigator::default());
        let submitter = Arc::new(HttpSubmitter::new(&format!("http://127.0.0.1:{port}")));
        let checkout = submitter.checkout_config().await.unwrap();
        assert_eq!(checkout.recording_policy, RecordingPolicy::Strict);
        assert_eq!(checkout.redirect_delay, Duration::from_millis(20));

        let mut session = CheckoutSession::new(
            wizard,
            submitter,
            CheckoutRedirector::new(Arc::new(Catalog::default()), DEFAULT_FALLBACK_CHECKOUT_URL),
            Arc::clone(&navigator) as Arc<dyn Navigator>,
            &checkout,
        );

        let confirmation = session.confirm().await.unwrap();
        assert_eq!(session.wizard().step(), WizardStep::Complete);
        let id = confirmation.completion.acceptance_id.clone().unwrap();

        confirmation.redirect.await.unwrap();
        assert_eq!(
            *navigator.visits.lock().unwrap(),
            vec!["https://buy.stripe.com/aFa00kbUg29BfADcE99IQ01".to_string()]
        );

        let records = list(port).await;
        assert_eq!(records[0]["id"], id);
        assert_eq!(records[0]["signature"], "Jane Doe", "typed name stands in");
    })
    .await
    .expect("test timed out");
}
