use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use mentornet_core::model::{BackendSettings, Credential};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::{CandidateMissReason, ConfigError, TransportError};

/// Status and decoded JSON body of a backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// `None` when the body was empty (or, for error statuses, not JSON).
    pub body: Option<Value>,
}

impl HttpResponse {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    #[must_use]
    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Read-only access to the MentorNet REST backend.
///
/// Paths are root-relative (`/api/...`) and may carry a query string.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request carrying the session credential.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no response was obtained or a success
    /// body could not be decoded. Non-success statuses are *not* errors.
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError>;
}

/// GET `path` and return its JSON body if the status is a success.
pub(crate) async fn fetch_success(
    transport: &dyn Transport,
    path: &str,
) -> Result<Value, CandidateMissReason> {
    let response = transport.get(path).await?;
    if !response.is_success() {
        return Err(CandidateMissReason::HttpStatus(response.status));
    }
    response.body.ok_or(CandidateMissReason::EmptyBody)
}

/// `reqwest`-backed transport used against the real backend.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    settings: BackendSettings,
}

impl ReqwestTransport {
    /// Build a client that attaches the configured credential to every request.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the credential is not a valid header value or
    /// the HTTP client cannot be constructed.
    pub fn new(settings: BackendSettings) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        match settings.credential() {
            Some(Credential::Cookie(cookie)) => {
                let value = HeaderValue::from_str(cookie)
                    .map_err(|err| ConfigError::InvalidCredential(err.to_string()))?;
                headers.insert(COOKIE, value);
            }
            Some(Credential::Bearer(token)) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|err| ConfigError::InvalidCredential(err.to_string()))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => {}
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        let url = self.settings.endpoint(path);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if text.trim().is_empty() {
            return Ok(HttpResponse::status(status.as_u16()));
        }
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => Some(value),
            Err(err) if status.is_success() => return Err(TransportError::Decode(err.to_string())),
            Err(_) => None,
        };
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug, Clone)]
enum FixtureReply {
    Respond(HttpResponse),
    Fail(String),
}

/// Canned backend for tests and offline demos.
///
/// Unknown paths answer `404`. Every request is recorded in order.
#[derive(Default)]
pub struct FixtureTransport {
    routes: Mutex<HashMap<String, FixtureReply>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FixtureTransport::set_json`].
    #[must_use]
    pub fn with_json(self, path: impl Into<String>, status: u16, body: Value) -> Self {
        self.set_json(path, status, body);
        self
    }

    #[must_use]
    pub fn with_status(self, path: impl Into<String>, status: u16) -> Self {
        self.set_reply(path, FixtureReply::Respond(HttpResponse::status(status)));
        self
    }

    /// Make `path` fail at the network level.
    #[must_use]
    pub fn with_failure(self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.set_reply(path, FixtureReply::Fail(message.into()));
        self
    }

    /// Replace the reply for `path`; used to change backend state between runs.
    pub fn set_json(&self, path: impl Into<String>, status: u16, body: Value) {
        self.set_reply(path, FixtureReply::Respond(HttpResponse::json(status, body)));
    }

    fn set_reply(&self, path: impl Into<String>, reply: FixtureReply) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), reply);
    }

    /// Paths requested so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.as_str() == path)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_owned());
        let reply = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned();
        match reply {
            Some(FixtureReply::Respond(response)) => Ok(response),
            Some(FixtureReply::Fail(message)) => Err(TransportError::Unavailable(message)),
            None => Ok(HttpResponse::status(404)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentornet_core::model::BackendSettingsDraft;
    use serde_json::json;

    #[tokio::test]
    async fn fixture_defaults_to_not_found_and_records_calls() {
        let transport = FixtureTransport::new().with_json("/a", 200, json!({"ok": true}));

        let missing = transport.get("/b").await.unwrap();
        assert_eq!(missing.status, 404);
        let found = transport.get("/a").await.unwrap();
        assert!(found.is_success());

        assert_eq!(transport.calls(), vec!["/b".to_string(), "/a".to_string()]);
        assert_eq!(transport.call_count("/a"), 1);
    }

    #[tokio::test]
    async fn fetch_success_maps_failures_to_misses() {
        let transport = FixtureTransport::new()
            .with_status("/empty", 204)
            .with_status("/gone", 410)
            .with_failure("/down", "connection refused");

        assert_eq!(
            fetch_success(&transport, "/empty").await,
            Err(CandidateMissReason::EmptyBody)
        );
        assert_eq!(
            fetch_success(&transport, "/gone").await,
            Err(CandidateMissReason::HttpStatus(410))
        );
        assert!(matches!(
            fetch_success(&transport, "/down").await,
            Err(CandidateMissReason::Transport(_))
        ));
    }

    #[test]
    fn reqwest_transport_rejects_bad_cookie() {
        let settings = BackendSettingsDraft {
            base_url: Some("http://localhost:5000".into()),
            session_cookie: Some("token=a\nb".into()),
            api_token: None,
        }
        .validate()
        .unwrap();
        assert!(matches!(
            ReqwestTransport::new(settings),
            Err(ConfigError::InvalidCredential(_))
        ));
    }
}
