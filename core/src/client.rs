//! Entry point of the Todoable client.
//!
//! # Design
//! `Client` is a thin handle over a shared `Session`. It owns no lists or
//! items; it logs in, lists the user's lists and creates new ones. Cloning a
//! `Client` shares the session, so worker threads see the same token.

use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::config::{ApiShape, ClientConfig};
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport, UreqTransport};
use crate::session::Session;
use crate::types::{created_record, list_body, unexpected_shape, List};
use crate::uri::LISTS_PATH;

#[derive(Debug, Clone)]
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    /// Client for `base_uri` speaking the default response shape.
    pub fn new(base_uri: &str) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::new(base_uri))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = Arc::new(UreqTransport::new(config.timeout()));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        let base_uri = Url::parse(&config.base_uri)?;
        Ok(Self {
            session: Arc::new(Session::new(base_uri, config.shape, transport)),
        })
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_uri(&self) -> &str {
        self.session.base_uri().as_str()
    }

    pub fn shape(&self) -> ApiShape {
        self.session.shape()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Expand `template` with `params` and resolve it against the base URI.
    pub fn api_uri(&self, template: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        self.session.api_uri(template, params)
    }

    /// Log in and keep the returned token for every later call. Calling it
    /// again re-authenticates, e.g. once a token has expired.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), ApiError> {
        self.session.authenticate(username, password)
    }

    pub fn lists(&self) -> Result<Vec<List>, ApiError> {
        let payload = self
            .session
            .request(HttpMethod::Get, LISTS_PATH, &[], None)?;

        let entries = match (self.session.shape(), payload.as_json()) {
            (ApiShape::Nested, Some(body)) => body.get("lists"),
            (ApiShape::Flat, Some(body)) => Some(body),
            (_, None) => None,
        }
        .and_then(Value::as_array)
        .ok_or_else(|| unexpected_shape("lists", &payload))?;

        entries
            .iter()
            .map(|entry| List::from_session(&self.session, entry))
            .collect()
    }

    /// Create a list. Returns it when the server describes the created list
    /// in the response; otherwise `None`, and `lists` must be fetched again.
    pub fn new_list(&self, name: &str) -> Result<Option<List>, ApiError> {
        let payload = self.session.request(
            HttpMethod::Post,
            LISTS_PATH,
            &[],
            Some(list_body(name)?),
        )?;
        Ok(created_record(&payload, "list")
            .and_then(|value| List::from_session(&self.session, value).ok()))
    }
}
