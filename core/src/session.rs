//! Authentication and the authenticated request engine.
//!
//! # Design
//! `Session` is the single chokepoint for I/O. It owns the base URI, the
//! transport and the bearer token; every resource object keeps an
//! `Arc<Session>` instead of reaching for shared global state.
//!
//! The token lives behind an `RwLock` and is written in one step, so a
//! resource call racing a login either sees no token (and fails with
//! `NotAuthenticated`) or the complete new one. A separate mutex keeps at
//! most one `authenticate` round-trip in flight.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, info, trace, warn};
use serde_json::Value;
use url::Url;

use crate::config::ApiShape;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::uri::{self, AUTH_PATH};

const APPLICATION_JSON: &str = "application/json";

/// A response body after lenient parsing.
///
/// Some endpoints answer with plain text or nothing at all, so a body that
/// is not JSON is handed back as `Text` rather than treated as a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Empty,
}

impl Payload {
    pub fn parse(body: &str) -> Self {
        if body.is_empty() {
            return Payload::Empty;
        }
        match serde_json::from_str(body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(body.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

pub(crate) struct Session {
    base_uri: Url,
    shape: ApiShape,
    transport: Arc<dyn Transport>,
    token: RwLock<Option<String>>,
    auth_lock: Mutex<()>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_uri", &self.base_uri.as_str())
            .field("shape", &self.shape)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(base_uri: Url, shape: ApiShape, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_uri,
            shape,
            transport,
            token: RwLock::new(None),
            auth_lock: Mutex::new(()),
        }
    }

    pub(crate) fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub(crate) fn shape(&self) -> ApiShape {
        self.shape
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }

    pub(crate) fn api_uri(&self, template: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        uri::resolve(&self.base_uri, &uri::expand(template, params))
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Exchange credentials for a token. A 401 leaves the stored token as it
    /// was; any other status replaces it with whatever `token` the body
    /// carries, possibly none.
    pub(crate) fn authenticate(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let _in_flight = self.auth_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let uri = self.api_uri(AUTH_PATH, &[])?;
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        let request = HttpRequest {
            method: HttpMethod::Post,
            path: uri.to_string(),
            headers: vec![
                ("Accept".to_string(), APPLICATION_JSON.to_string()),
                ("Content-Type".to_string(), APPLICATION_JSON.to_string()),
                ("Authorization".to_string(), format!("Basic {credentials}")),
            ],
            body: None,
        };

        debug!("POST {uri} (authenticate)");
        let response = self.transport.execute(request)?;
        trace!("authenticate answered {}", response.status);

        if response.status == 401 {
            warn!("authentication rejected for user {username}");
            return Err(ApiError::InvalidCredentials);
        }

        let token = extract_token(&response);
        match token {
            Some(_) => info!("authenticated as {username}"),
            None => warn!(
                "authentication response (status {}) carried no token",
                response.status
            ),
        }
        self.store_token(token);
        Ok(())
    }

    /// Issue an authenticated request and parse the body leniently.
    ///
    /// Status codes are not interpreted: callers see whatever came back.
    pub(crate) fn request(
        &self,
        method: HttpMethod,
        template: &str,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<Payload, ApiError> {
        let token = self.current_token().ok_or(ApiError::NotAuthenticated)?;

        let uri = self.api_uri(template, params)?;
        let request = HttpRequest {
            method,
            path: uri.to_string(),
            headers: vec![
                ("Accept".to_string(), APPLICATION_JSON.to_string()),
                ("Content-Type".to_string(), APPLICATION_JSON.to_string()),
                ("Authorization".to_string(), format!("Token token=\"{token}\"")),
            ],
            body,
        };

        debug!("{method} {uri}");
        let response = self.transport.execute(request)?;
        trace!("{method} {uri} answered {}", response.status);

        Ok(Payload::parse(&response.body))
    }
}

fn extract_token(response: &HttpResponse) -> Option<String> {
    serde_json::from_str::<Value>(&response.body)
        .ok()?
        .get("token")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_parses_json() {
        assert_eq!(
            Payload::parse(r#"{"lists":[]}"#),
            Payload::Json(json!({"lists": []}))
        );
    }

    #[test]
    fn payload_passes_text_through() {
        assert_eq!(
            Payload::parse("Feed the cat finished"),
            Payload::Text("Feed the cat finished".to_string())
        );
    }

    #[test]
    fn payload_empty_body_is_empty() {
        assert!(Payload::parse("").is_empty());
        assert_eq!(Payload::parse("").as_json(), None);
    }

    #[test]
    fn token_extracted_from_json_body() {
        let response = HttpResponse::new(200, r#"{ "token": "foo", "expires_at": "x" }"#);
        assert_eq!(extract_token(&response).as_deref(), Some("foo"));
    }

    #[test]
    fn token_missing_from_body_is_none() {
        assert_eq!(extract_token(&HttpResponse::new(500, r#"{"error":"boom"}"#)), None);
        assert_eq!(extract_token(&HttpResponse::new(500, "Internal Server Error")), None);
        assert_eq!(extract_token(&HttpResponse::new(200, r#"{"token": 12}"#)), None);
    }
}
