//! Core chain, capabilities and error types for the errand HTTP client.
//!
//! A request is assembled, sent and checked through one fluent chain. The
//! first step that fails is recorded; every later step is skipped, and the
//! failure surfaces once, at [`PendingResponse::done`]:
//!
//! ```ignore
//! let mut user = User::default();
//! client
//!     .get("https://api.example.com/users/:id")
//!     .param("id", 42)
//!     .send()
//!     .expect_success()
//!     .expect_type("json")
//!     .get_json(&mut user)
//!     .done()?;
//! ```
//!
//! This crate provides:
//! - [`Client`] and [`ClientBuilder`] - transport plus capabilities
//! - [`PendingRequest`], [`PendingResponse`] and [`Next`] - the chain
//! - [`Factory`], [`Builder`], [`Inspector`] and [`Continuation`] - the
//!   replaceable capabilities behind each operation
//! - [`Transport`] - the blocking round trip the chain is dispatched through
//! - [`Error`] and [`Result`] - first-failure errors with diagnostic snapshots
//! - [`Form`] and [`Part`] - multipart bodies
//!
//! The `errand` crate adds a hyper-based transport and a default client.

mod capability;
mod client;
mod codec;
mod content_type;
mod error;
mod method;
mod multipart;
mod next;
pub mod prelude;
mod request;
mod response;
mod snapshot;
mod transport;

pub use capability::{
    Builder, DefaultBuilder, DefaultFactory, DefaultInspector, Factory, Inspector,
    USER_AGENT_VALUE,
};
pub use client::{Client, ClientBuilder};
pub use codec::{CodecError, from_json, to_json};
pub use content_type::{ContentType, resolve_alias};
pub use error::{BoxError, Error, Result};
pub use method::Method;
pub use multipart::{Form, FormError, Part};
pub use next::{Continuation, DefaultContinuation, Next};
pub use request::{PendingRequest, RequestParts};
pub use response::{Body, PendingResponse, ResponseParts};
pub use snapshot::{RequestSnapshot, ResponseSnapshot};
pub use transport::{Transport, TransportError, TransportRequest, TransportResponse};

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, StatusCode, header};
pub use url::Url;
