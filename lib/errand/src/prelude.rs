//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use errand::prelude::*;
//! ```

pub use crate::{
    Client, ClientConfig, ContentType, Continuation, Error, Form, HyperTransport, Method, Part,
    PendingRequest, PendingResponse, Result, StatusCode, from_json, header, to_json,
};
pub use serde::{Deserialize, Serialize};
