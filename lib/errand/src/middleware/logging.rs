//! Round-trip logging.
//!
//! Logs every request handed to the transport and its outcome using the
//! `tracing` crate.

use std::time::Instant;

use errand_core::{Transport, TransportError, TransportRequest, TransportResponse};
use tracing::{Level, debug, info, span, warn};

/// Log level for the logging decorator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (request/response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Transport that logs requests and responses.
///
/// # Example
///
/// ```ignore
/// use errand::middleware::Logging;
///
/// let client = errand::builder().wrap_transport(Logging::debug).build();
/// ```
#[derive(Debug, Clone)]
pub struct Logging<T> {
    inner: T,
    level: LogLevel,
}

impl<T> Logging<T> {
    /// Wrap `inner`, logging at info level.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            level: LogLevel::Info,
        }
    }

    /// Wrap `inner`, logging at debug level.
    pub fn debug(inner: T) -> Self {
        Self {
            inner,
            level: LogLevel::Debug,
        }
    }

    /// The configured level.
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<T: Transport> Transport for Logging<T> {
    fn round_trip(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = request.method;
        let url = request.url.to_string();

        let span = span!(Level::INFO, "http_request", %method, %url);
        let _entered = span.enter();
        let start = Instant::now();

        match self.level {
            LogLevel::Debug => {
                debug!(
                    method = %method,
                    url = %url,
                    headers = ?request.headers,
                    body_len = request.body.len(),
                    "sending request"
                );
            }
            LogLevel::Info => {
                info!(method = %method, url = %url, "sending request");
            }
        }

        let result = self.inner.round_trip(request);

        // Saturating conversion to u64 (truncates after ~584 million years)
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) if (200..300).contains(&response.status) => {
                info!(status = response.status, elapsed_ms, "request completed");
            }
            Ok(response) => {
                warn!(status = response.status, elapsed_ms, "request failed with HTTP error");
            }
            Err(err) => {
                warn!(error = %err, elapsed_ms, "request failed");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use errand_core::{HeaderMap, Method, Url};

    use super::*;

    struct Counting(AtomicUsize);

    impl Transport for Counting {
        fn round_trip(
            &self,
            _request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(TransportResponse::buffered(503, HeaderMap::new(), "down"))
        }
    }

    #[test]
    fn logging_defaults_to_info() {
        assert_eq!(Logging::new(()).level(), LogLevel::Info);
        assert_eq!(Logging::debug(()).level(), LogLevel::Debug);
    }

    #[test]
    fn logging_forwards_response_untouched() {
        let logging = Logging::debug(Counting(AtomicUsize::new(0)));
        let request = TransportRequest {
            method: Method::Get,
            url: Url::parse("http://localhost/health").expect("url"),
            headers: HeaderMap::new(),
            body: bytes::Bytes::new(),
            timeout: None,
        };

        let response = logging.round_trip(request).expect("response");
        assert_eq!(response.status, 503);
        assert_eq!(logging.inner.0.load(Ordering::SeqCst), 1);
    }
}
