//! Blocking client for the Todoable to-do list service.
//!
//! # Overview
//! Logs a user in, then exposes lists and the items inside them as typed
//! values that carry their own create/update/delete operations. Every call
//! goes through one authenticated request engine that expands path
//! templates, attaches the bearer token and parses the response leniently.
//!
//! # Design
//! - `Client` is the facade; `List` and `Item` share its session by `Arc`.
//! - The HTTP round-trip sits behind the `Transport` trait. `UreqTransport`
//!   is the default; tests substitute a recording stub.
//! - Status codes other than 401 on login are not interpreted. Bodies come
//!   back as `Payload::Json`, `Payload::Text` or `Payload::Empty`.
//! - Response wrapping differs between server versions and is picked
//!   explicitly through `ApiShape`.
//!
//! # Configuration
//! `ClientConfig::from_env` reads `TODOABLE_BASE_URI`, `TODOABLE_API_SHAPE`
//! and `TODOABLE_TIMEOUT_SECS`, keeping defaults for anything unset.
//!
//! ```no_run
//! use todoable_core::{ApiError, Client, ClientConfig};
//!
//! fn main() -> Result<(), ApiError> {
//!     let client = Client::with_config(ClientConfig::from_env()?)?;
//!     client.authenticate("user", "password")?;
//!     for list in client.lists()? {
//!         println!("{} {}", list.id(), list.name());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod types;
pub mod uri;

pub use client::Client;
pub use config::{ApiShape, ClientConfig, DEFAULT_BASE_URI};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use session::Payload;
pub use types::{Item, List};
