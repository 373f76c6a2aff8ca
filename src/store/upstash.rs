//! Hosted store over the Upstash REST protocol.
//!
//! Each command is one `POST` of a JSON array (`["SET", "k", "v"]`) to the
//! database URL with a bearer token. Replies are `{"result": ...}` on
//! success and `{"error": "..."}` otherwise.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::traits::KvStore;
use crate::error::StoreError;

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// REST client for an Upstash-compatible Redis database.
pub struct UpstashStore {
    url: String,
    token: SecretString,
    client: reqwest::Client,
}

impl UpstashStore {
    pub fn new(url: impl Into<String>, token: SecretString) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Run one command and return the raw `result` value.
    async fn command(&self, args: &[&str]) -> Result<Value, StoreError> {
        let name = args.first().copied().unwrap_or_default().to_string();
        debug!(command = %name, "Upstash command");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.token.expose_secret())
            .json(&args)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let reply: CommandReply = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(StoreError::Command {
                    command: name,
                    reason: format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
                });
            }
            Err(e) => {
                return Err(StoreError::UnexpectedReply {
                    command: name,
                    reply: format!("{e}: {}", truncate(&body, 200)),
                });
            }
        };

        if let Some(error) = reply.error {
            return Err(StoreError::Command {
                command: name,
                reason: error,
            });
        }
        if !status.is_success() {
            return Err(StoreError::Command {
                command: name,
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        Ok(reply.result.unwrap_or(Value::Null))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn unexpected(command: &str, reply: &Value) -> StoreError {
    StoreError::UnexpectedReply {
        command: command.to_string(),
        reply: reply.to_string(),
    }
}

fn as_opt_string(command: &str, value: Value) -> Result<Option<String>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(unexpected(command, &other)),
    }
}

fn as_int(command: &str, value: &Value) -> Result<i64, StoreError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| unexpected(command, value)),
        Value::String(s) => s.parse().map_err(|_| unexpected(command, value)),
        _ => Err(unexpected(command, value)),
    }
}

fn as_string_list(command: &str, value: Value) -> Result<Vec<String>, StoreError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                as_opt_string(command, item)?.ok_or_else(|| unexpected(command, &Value::Null))
            })
            .collect(),
        other => Err(unexpected(command, &other)),
    }
}

/// HGETALL comes back as a flat `[field, value, ...]` array.
fn as_field_map(command: &str, value: Value) -> Result<HashMap<String, String>, StoreError> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok((k, as_opt_string(command, v)?.unwrap_or_default())))
            .collect(),
        other => {
            let flat = as_string_list(command, other)?;
            if flat.len() % 2 != 0 {
                return Err(StoreError::UnexpectedReply {
                    command: command.to_string(),
                    reply: format!("odd field list of length {}", flat.len()),
                });
            }
            let mut map = HashMap::with_capacity(flat.len() / 2);
            let mut iter = flat.into_iter();
            while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
                map.insert(field, value);
            }
            Ok(map)
        }
    }
}

#[async_trait]
impl KvStore for UpstashStore {
    fn backend_name(&self) -> &'static str {
        "upstash"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let reply = self.command(&["PING"]).await?;
        match reply.as_str() {
            Some("PONG") => Ok(()),
            _ => Err(unexpected("PING", &reply)),
        }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let reply = self.command(&["GET", key]).await?;
        as_opt_string("GET", reply)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let reply = match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1).to_string();
                self.command(&["SET", key, value, "EX", &secs]).await?
            }
            None => self.command(&["SET", key, value]).await?,
        };
        match reply.as_str() {
            Some("OK") => Ok(()),
            _ => Err(unexpected("SET", &reply)),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let reply = self.command(&["DEL", key]).await?;
        Ok(as_int("DEL", &reply)? > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let reply = self.command(&["EXISTS", key]).await?;
        Ok(as_int("EXISTS", &reply)? == 1)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let reply = self.command(&["KEYS", pattern]).await?;
        as_string_list("KEYS", reply)
    }

    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut args: Vec<&str> = Vec::with_capacity(2 + fields.len() * 2);
        args.push("HSET");
        args.push(key);
        for (field, value) in fields {
            args.push(field);
            args.push(value);
        }
        let reply = self.command(&args).await?;
        as_int("HSET", &reply).map(|_| ())
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let reply = self.command(&["HGETALL", key]).await?;
        as_field_map("HGETALL", reply)
    }

    async fn push_list(&self, key: &str, value: &str) -> Result<u64, StoreError> {
        let reply = self.command(&["RPUSH", key, value]).await?;
        Ok(as_int("RPUSH", &reply)?.max(0) as u64)
    }

    async fn range_list(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let start = start.to_string();
        let stop = stop.to_string();
        let reply = self.command(&["LRANGE", key, &start, &stop]).await?;
        as_string_list("LRANGE", reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::*;
    use crate::store::MemoryStore;

    const TOKEN: &str = "test-token";

    #[derive(Clone)]
    struct MockState {
        store: Arc<MemoryStore>,
        seen: Arc<Mutex<Vec<Vec<String>>>>,
    }

    /// Minimal REST emulator backed by `MemoryStore`.
    async fn mock_handler(
        State(state): State<MockState>,
        headers: HeaderMap,
        Json(args): Json<Vec<String>>,
    ) -> impl IntoResponse {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {TOKEN}"));
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})));
        }

        state.seen.lock().await.push(args.clone());
        let store = &state.store;
        let a: Vec<&str> = args.iter().map(String::as_str).collect();

        let result = match a.as_slice() {
            ["PING"] => Ok(json!("PONG")),
            ["GET", k] => store.get_raw(k).await.map(|v| json!(v)),
            ["SET", k, v] => store.set_raw(k, v, None).await.map(|_| json!("OK")),
            ["SET", k, v, "EX", secs] => {
                let ttl = Duration::from_secs(secs.parse().unwrap());
                store.set_raw(k, v, Some(ttl)).await.map(|_| json!("OK"))
            }
            ["DEL", k] => store.delete(k).await.map(|d| json!(d as i64)),
            ["EXISTS", k] => store.exists(k).await.map(|e| json!(e as i64)),
            ["KEYS", p] => store.keys(p).await.map(|k| json!(k)),
            ["HSET", k, rest @ ..] => {
                let fields: Vec<(String, String)> = rest
                    .chunks(2)
                    .map(|c| (c[0].to_string(), c[1].to_string()))
                    .collect();
                store.set_fields(k, &fields).await.map(|_| json!(fields.len()))
            }
            ["HGETALL", k] => store.get_fields(k).await.map(|m| {
                let flat: Vec<String> = m.into_iter().flat_map(|(f, v)| [f, v]).collect();
                json!(flat)
            }),
            ["RPUSH", k, v] => store.push_list(k, v).await.map(|n| json!(n)),
            ["LRANGE", k, s, e] => store
                .range_list(k, s.parse().unwrap(), e.parse().unwrap())
                .await
                .map(|items| json!(items)),
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "ERR unknown command"})),
                );
            }
        };

        match result {
            Ok(value) => (StatusCode::OK, Json(json!({ "result": value }))),
            Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))),
        }
    }

    async fn start_mock() -> (String, Arc<Mutex<Vec<Vec<String>>>>) {
        let state = MockState {
            store: Arc::new(MemoryStore::new()),
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let seen = Arc::clone(&state.seen);
        let app = Router::new().route("/", post(mock_handler)).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://127.0.0.1:{port}/"), seen)
    }

    fn client(url: &str) -> UpstashStore {
        UpstashStore::new(url, SecretString::from(TOKEN))
    }

    #[tokio::test]
    async fn string_commands_round_trip() {
        let (url, seen) = start_mock().await;
        let store = client(&url);

        store.ping().await.unwrap();
        assert_eq!(store.get_raw("k").await.unwrap(), None);
        store.set_raw("k", "hello", None).await.unwrap();
        assert_eq!(store.get_raw("k").await.unwrap().as_deref(), Some("hello"));
        assert!(store.exists("k").await.unwrap());
        assert!(store.delete("k").await.unwrap());
        assert!(!store.exists("k").await.unwrap());

        let seen = seen.lock().await;
        assert_eq!(seen[2], vec!["SET", "k", "hello"]);
    }

    #[tokio::test]
    async fn ttl_is_sent_as_ex_seconds() {
        let (url, seen) = start_mock().await;
        let store = client(&url);

        store
            .set_raw("probe", "v", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        let seen = seen.lock().await;
        assert_eq!(seen[0], vec!["SET", "probe", "v", "EX", "60"]);
    }

    #[tokio::test]
    async fn hash_and_list_commands() {
        let (url, _seen) = start_mock().await;
        let store = client(&url);

        store
            .set_fields(
                "acceptance:1",
                &[("id".into(), "1".into()), ("clientName".into(), "Jane".into())],
            )
            .await
            .unwrap();
        let fields = store.get_fields("acceptance:1").await.unwrap();
        assert_eq!(fields["id"], "1");
        assert_eq!(fields["clientName"], "Jane");

        assert_eq!(store.push_list("ids", "a").await.unwrap(), 1);
        assert_eq!(store.push_list("ids", "b").await.unwrap(), 2);
        assert_eq!(store.range_list("ids", 0, -1).await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.keys("acceptance:*").await.unwrap(), vec!["acceptance:1"]);
    }

    #[tokio::test]
    async fn server_error_reply_is_command_error() {
        let (url, _seen) = start_mock().await;
        let store = client(&url);

        store.set_raw("s", "v", None).await.unwrap();
        let err = store.push_list("s", "x").await.unwrap_err();
        match err {
            StoreError::Command { command, reason } => {
                assert_eq!(command, "RPUSH");
                assert!(reason.contains("WRONGTYPE"));
            }
            other => panic!("expected command error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_token_is_rejected() {
        let (url, _seen) = start_mock().await;
        let store = UpstashStore::new(url, SecretString::from("wrong"));

        let err = store.get_raw("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Command { ref reason, .. } if reason == "Unauthorized"));
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let store = client(&format!("http://127.0.0.1:{port}"));
        let err = store.get_raw("k").await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[test]
    fn field_map_accepts_flat_and_object_forms() {
        let flat = json!(["a", "1", "b", "2"]);
        let map = as_field_map("HGETALL", flat).unwrap();
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "2");

        let obj = json!({"a": "1"});
        assert_eq!(as_field_map("HGETALL", obj).unwrap()["a"], "1");

        assert!(as_field_map("HGETALL", json!(["a"])).is_err());
        assert!(as_field_map("HGETALL", Value::Null).unwrap().is_empty());
    }
}
