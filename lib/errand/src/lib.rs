//! Fluent, short-circuiting HTTP client.
//!
//! A request is built, sent and checked in a single chain. The first
//! failure is recorded and every later step is skipped, so error handling
//! happens once, at the end:
//!
//! ```ignore
//! use errand::prelude::*;
//!
//! #[derive(Debug, Default, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! let mut user = User::default();
//! errand::get("https://api.example.com/users/:id")
//!     .param("id", 42)
//!     .send()
//!     .expect_success()
//!     .expect_type("json")
//!     .get_json(&mut user)
//!     .done()?;
//! ```
//!
//! The free functions use a lazily created default client. Build your own
//! with [`builder`] to set a base URL, install a custom [`Factory`],
//! [`Builder`] or [`Inspector`], or decorate the transport (see
//! [`middleware`]).

mod config;
pub mod middleware;
pub mod prelude;
mod transport;

use std::sync::OnceLock;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use transport::HyperTransport;

// Re-export core types
pub use errand_core::{
    Body, BoxError, Builder, Client, ClientBuilder, CodecError, ContentType, Continuation,
    DefaultBuilder, DefaultContinuation, DefaultFactory, DefaultInspector, Error, Factory, Form,
    FormError, Inspector, Method, Next, Part, PendingRequest, PendingResponse, RequestParts,
    RequestSnapshot, ResponseParts, ResponseSnapshot, Result, Transport, TransportError,
    TransportRequest, TransportResponse, USER_AGENT_VALUE, from_json, resolve_alias, to_json,
};

// Re-export http and url types for status codes, headers and base URLs
pub use errand_core::{HeaderMap, StatusCode, Url, header};

static DEFAULT_CLIENT: OnceLock<Client> = OnceLock::new();

fn default_client() -> &'static Client {
    DEFAULT_CLIENT.get_or_init(client)
}

/// A new client over a [`HyperTransport`] with the default configuration.
#[must_use]
pub fn client() -> Client {
    Client::new(HyperTransport::new())
}

/// Start configuring a client over a [`HyperTransport`].
#[must_use]
pub fn builder() -> ClientBuilder {
    Client::builder(HyperTransport::new())
}

/// Start configuring a client over a [`HyperTransport`] with `config`.
#[must_use]
pub fn builder_with_config(config: ClientConfig) -> ClientBuilder {
    Client::builder(HyperTransport::with_config(config))
}

/// Create a request with the default client.
pub fn new(method: Method, path: &str) -> PendingRequest {
    default_client().new_request(method, path)
}

/// Create a GET request with the default client.
pub fn get(path: &str) -> PendingRequest {
    new(Method::Get, path)
}

/// Create a POST request with the default client.
pub fn post(path: &str) -> PendingRequest {
    new(Method::Post, path)
}

/// Create a PUT request with the default client.
pub fn put(path: &str) -> PendingRequest {
    new(Method::Put, path)
}

/// Create a DELETE request with the default client.
pub fn delete(path: &str) -> PendingRequest {
    new(Method::Delete, path)
}

/// Create a PATCH request with the default client.
pub fn patch(path: &str) -> PendingRequest {
    new(Method::Patch, path)
}
