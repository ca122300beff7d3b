//! Error types for the Todoable client.
//!
//! # Design
//! `NotAuthenticated` and `InvalidCredentials` get dedicated variants because
//! callers need to tell "log in first" apart from "wrong user or password".
//! Non-2xx statuses from resource calls are not errors here: the request
//! engine hands back whatever body the server produced.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A resource operation was attempted before a token was obtained.
    #[error("not authenticated: call authenticate first")]
    NotAuthenticated,

    /// The authentication endpoint answered 401.
    #[error("credentials don't match")]
    InvalidCredentials,

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The base URI or a resolved path is not a valid URI.
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A response did not have the shape the configured protocol expects.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<ureq::Error> for ApiError {
    fn from(error: ureq::Error) -> Self {
        ApiError::Transport(error.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(error: url::ParseError) -> Self {
        ApiError::InvalidUri(error.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::DeserializationError(error.to_string())
    }
}
