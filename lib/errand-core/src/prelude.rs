//! Prelude module for convenient imports.
//!
//! ```ignore
//! use errand_core::prelude::*;
//! ```

pub use crate::{
    Builder, Client, ContentType, Continuation, Error, Factory, Form, Inspector, Method, Next,
    Part, PendingRequest, PendingResponse, RequestParts, ResponseParts, Result, Transport,
};
