//! Client configuration and the protocol response shape.
//!
//! # Design
//! The service changed how it wraps collections across versions. Rather than
//! sniffing each response, the client is told which shape the deployment
//! speaks through `ApiShape`, so a mismatch surfaces as a
//! `DeserializationError` instead of silently guessing.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_BASE_URI: &str = "http://todoable.teachable.tech";

const ENV_BASE_URI: &str = "TODOABLE_BASE_URI";
const ENV_API_SHAPE: &str = "TODOABLE_API_SHAPE";
const ENV_TIMEOUT_SECS: &str = "TODOABLE_TIMEOUT_SECS";

/// How collections are wrapped in response bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiShape {
    /// `{"lists": [...]}` for lists, `{"list": {"items": [...]}}` for a list.
    #[default]
    Nested,
    /// `[...]` for lists, `{"items": [...]}` for a list.
    Flat,
}

impl FromStr for ApiShape {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(ApiShape::Nested),
            "flat" => Ok(ApiShape::Flat),
            other => Err(ApiError::Config(format!("unknown API shape: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_uri: String,
    pub shape: ApiShape,
    /// Whole-request timeout; `None` leaves it to the transport.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            shape: ApiShape::default(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_uri: &str) -> Self {
        Self {
            base_uri: base_uri.to_string(),
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape: ApiShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Read `TODOABLE_BASE_URI`, `TODOABLE_API_SHAPE` and
    /// `TODOABLE_TIMEOUT_SECS`, keeping defaults for unset variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Some(base_uri) = lookup(ENV_BASE_URI) {
            config.base_uri = base_uri;
        }
        if let Some(shape) = lookup(ENV_API_SHAPE) {
            config.shape = shape.parse()?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                ApiError::Config(format!("{ENV_TIMEOUT_SECS}={secs:?}: {e}"))
            })?;
            config.timeout_secs = Some(secs);
        }
        Ok(config)
    }
}
