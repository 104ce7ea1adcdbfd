//! HTTP method types.

use derive_more::Display;
use serde::Serialize;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(into = "&'static str")]
pub enum Method {
    /// GET method - retrieve a resource.
    #[display("GET")]
    Get,
    /// POST method - create a resource.
    #[display("POST")]
    Post,
    /// PUT method - replace a resource.
    #[display("PUT")]
    Put,
    /// DELETE method - remove a resource.
    #[display("DELETE")]
    Delete,
    /// PATCH method - partially update a resource.
    #[display("PATCH")]
    Patch,
    /// HEAD method - retrieve headers only.
    #[display("HEAD")]
    Head,
    /// OPTIONS method - retrieve allowed methods.
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// The method token as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl From<Method> for &'static str {
    fn from(method: Method) -> Self {
        method.as_str()
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}
