//! The transport performing the actual network round trip.
//!
//! The chain only depends on the [`Transport`] trait; the `errand` crate
//! provides a hyper-based implementation. Implement it yourself to stub the
//! network in tests or to route calls through another client.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use bytes::Bytes;
use derive_more::{Display, Error};
use http::HeaderMap;
use url::Url;

use crate::Method;

/// Blocking HTTP transport.
pub trait Transport: Send + Sync {
    /// Execute a request and return the response head and body stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Truncated response (see [`TransportError::Incomplete`])
    fn round_trip(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn round_trip(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).round_trip(request)
    }
}

/// What the transport is asked to send.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Target URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, possibly empty.
    pub body: Bytes,
    /// Per-request timeout overriding the transport's default.
    pub timeout: Option<Duration>,
}

/// What the transport received.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Declared content length, if known.
    pub content_length: Option<u64>,
    /// Unconsumed body stream.
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    /// Creates a response with a fully buffered body.
    #[must_use]
    pub fn buffered(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            headers,
            content_length: u64::try_from(body.len()).ok(),
            body: Box::new(std::io::Cursor::new(body)),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Transport-level failure.
#[derive(Debug, Display, Error)]
pub enum TransportError {
    /// Network/connection errors.
    #[display("connection error: {_0}")]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    Timeout,

    /// The request could not be turned into a wire request.
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),

    /// The response head arrived but the exchange did not complete.
    #[display("incomplete response: {message}")]
    Incomplete {
        /// Error message.
        message: String,
        /// What was received before the failure.
        #[error(not(source))]
        partial: Box<TransportResponse>,
    },
}

impl TransportError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Split into the message and whatever part of the response was received.
    #[must_use]
    pub fn into_partial(self) -> (String, Option<TransportResponse>) {
        match self {
            Self::Incomplete { message, partial } => {
                (format!("incomplete response: {message}"), Some(*partial))
            }
            other => (other.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn buffered_response_reports_length() {
        let mut response = TransportResponse::buffered(200, HeaderMap::new(), "hello");
        assert_eq!(response.content_length, Some(5));

        let mut body = String::new();
        response.body.read_to_string(&mut body).expect("read");
        assert_eq!(body, "hello");
    }

    #[test]
    fn error_display() {
        assert_eq!(TransportError::Timeout.to_string(), "request timeout");
        assert_eq!(
            TransportError::connection("refused").to_string(),
            "connection error: refused"
        );
        assert!(TransportError::Timeout.is_timeout());
    }

    #[test]
    fn incomplete_error_keeps_partial_response() {
        let err = TransportError::Incomplete {
            message: "body stream reset".to_string(),
            partial: Box::new(TransportResponse::buffered(200, HeaderMap::new(), "")),
        };

        let (message, partial) = err.into_partial();
        assert_eq!(message, "incomplete response: body stream reset");
        assert_eq!(partial.map(|response| response.status), Some(200));

        let (_, partial) = TransportError::Timeout.into_partial();
        assert!(partial.is_none());
    }
}
