//! Decorators for the transport and the capabilities of a [`Client`].
//!
//! They plug into [`ClientBuilder`]'s `wrap_*` methods; the last one
//! wrapped is the first to see a request.
//!
//! - [`Logging`] - Logs each round trip using `tracing`
//! - [`BearerAuth`] - Adds `Authorization: Bearer <token>` to every request
//!
//! # Example
//!
//! ```ignore
//! use errand::middleware::{BearerAuth, Logging};
//!
//! let client = errand::builder()
//!     .wrap_transport(Logging::new)
//!     .wrap_factory(BearerAuth::wrap("my-token"))
//!     .build();
//! ```
//!
//! [`Client`]: crate::Client
//! [`ClientBuilder`]: crate::ClientBuilder

mod bearer_auth;
mod logging;

pub use bearer_auth::BearerAuth;
pub use logging::{LogLevel, Logging};
