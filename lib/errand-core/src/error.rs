//! Error types for errand.
//!
//! A chain records at most one [`Error`]: the first step that fails. It is
//! returned by [`PendingResponse::done`](crate::PendingResponse::done).

use derive_more::{Display, Error};

use crate::{RequestSnapshot, ResponseSnapshot};

/// Boxed error returned by capabilities and custom steps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// First failure recorded by a chain.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Failure while assembling the request, before anything was sent.
    #[display("[errand] request error - {message}\n\nrequest info:\n{request}")]
    Request {
        /// Error message.
        message: String,
        /// The request when the failure happened.
        #[error(not(source))]
        request: RequestSnapshot,
    },

    /// Failure while dispatching, or while checking or reading the response.
    #[display(
        "[errand] response error - {message}\n\nrequest info:\n{request}\n\nresponse info:\n{response}"
    )]
    Response {
        /// Error message.
        message: String,
        /// The request that was sent.
        #[error(not(source))]
        request: RequestSnapshot,
        /// The response when the failure happened.
        #[error(not(source))]
        response: ResponseSnapshot,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a build-time error.
    #[must_use]
    pub fn request(message: impl Into<String>, request: RequestSnapshot) -> Self {
        Self::Request {
            message: message.into(),
            request,
        }
    }

    /// Create a post-dispatch error.
    #[must_use]
    pub fn response(
        message: impl Into<String>,
        request: RequestSnapshot,
        response: ResponseSnapshot,
    ) -> Self {
        Self::Response {
            message: message.into(),
            request,
            response,
        }
    }

    /// The bare message, without the snapshots.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Request { message, .. } | Self::Response { message, .. } => message,
        }
    }

    /// Snapshot of the request.
    #[must_use]
    pub fn request_snapshot(&self) -> &RequestSnapshot {
        match self {
            Self::Request { request, .. } | Self::Response { request, .. } => request,
        }
    }

    /// Snapshot of the response, for post-dispatch errors.
    #[must_use]
    pub fn response_snapshot(&self) -> Option<&ResponseSnapshot> {
        match self {
            Self::Request { .. } => None,
            Self::Response { response, .. } => Some(response),
        }
    }

    /// Returns `true` if the failure happened before dispatch.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    /// Returns `true` if the failure happened during or after dispatch.
    #[must_use]
    pub const fn is_response(&self) -> bool {
        matches!(self, Self::Response { .. })
    }

    /// The response status code, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response_snapshot()
            .map(|response| response.status_code)
            .filter(|status| *status != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_display() {
        let err = Error::request("invalid header name", RequestSnapshot::default());
        let rendered = err.to_string();

        assert!(rendered.starts_with("[errand] request error - invalid header name\n\nrequest info:\n{"));
        assert!(!rendered.contains("response info"));
        assert!(err.is_request());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn response_error_display() {
        let response = ResponseSnapshot {
            status_code: 404,
            ..ResponseSnapshot::default()
        };
        let err = Error::response("not found", RequestSnapshot::default(), response);
        let rendered = err.to_string();

        assert!(rendered.starts_with("[errand] response error - not found"));
        assert!(rendered.contains("response info:\n{"));
        assert!(err.is_response());
        assert_eq!(err.message(), "not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn status_is_none_without_response() {
        let err = Error::response(
            "connection refused",
            RequestSnapshot::default(),
            ResponseSnapshot::default(),
        );
        assert_eq!(err.status(), None);
        assert!(err.response_snapshot().is_some());
    }
}
