//! The response side of a chain.
//!
//! [`PendingResponse`] checks and reads what the transport returned. Its
//! operations share the failure slot of the originating request: once
//! anything failed, every check and read is skipped and
//! [`done`](PendingResponse::done) returns the first failure.
//!
//! The body is a single-consumer stream. It is closed as soon as an
//! operation has read it, and otherwise when the response is dropped
//! (after `done`, after `next`, or when the chain is abandoned).

use std::fmt;
use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use http::HeaderMap;
use tracing::{debug, trace};

use crate::{
    BoxError, Error, Inspector, Next, PendingRequest, Result, ResponseSnapshot, TransportResponse,
};

/// Single-consumer response body stream.
pub struct Body {
    stream: Option<Box<dyn Read + Send>>,
    consumed: bool,
    captured: Bytes,
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("open", &self.stream.is_some())
            .field("consumed", &self.consumed)
            .field("captured", &self.captured.len())
            .finish()
    }
}

impl Body {
    /// Wraps a stream.
    #[must_use]
    pub fn new(stream: impl Read + Send + 'static) -> Self {
        Self::boxed(Box::new(stream))
    }

    /// Wraps a boxed stream.
    #[must_use]
    pub fn boxed(stream: Box<dyn Read + Send>) -> Self {
        Self {
            stream: Some(stream),
            consumed: false,
            captured: Bytes::new(),
        }
    }

    /// A body over in-memory bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }

    /// A body with nothing to read.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            stream: None,
            consumed: false,
            captured: Bytes::new(),
        }
    }

    /// Returns `true` once an operation has taken the stream.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Returns `true` once the stream is released.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// The bytes read so far by [`read_all`](Self::read_all) or when
    /// capturing a snapshot.
    #[must_use]
    pub fn captured(&self) -> &Bytes {
        &self.captured
    }

    fn take(&mut self) -> std::result::Result<Box<dyn Read + Send>, BoxError> {
        if self.consumed {
            return Err("response body already consumed".into());
        }
        self.consumed = true;
        Ok(self.stream.take().unwrap_or_else(|| Box::new(std::io::empty())))
    }

    /// Reads the whole stream and closes it.
    pub fn read_all(&mut self) -> std::result::Result<Bytes, BoxError> {
        let mut stream = self.take()?;
        let mut buf = Vec::new();
        let outcome = stream.read_to_end(&mut buf);
        drop(stream);
        trace!(read = buf.len(), "response body closed");
        self.captured = Bytes::from(buf);
        outcome?;
        Ok(self.captured.clone())
    }

    /// Copies the whole stream into `sink` and closes it.
    pub fn copy_to(&mut self, sink: &mut dyn Write) -> std::result::Result<u64, BoxError> {
        let mut stream = self.take()?;
        let outcome = std::io::copy(&mut stream, sink);
        drop(stream);
        trace!("response body closed");
        Ok(outcome?)
    }

    /// Reads the whole stream and re-arms the body with the same bytes.
    pub fn buffer(&mut self) -> std::result::Result<Bytes, BoxError> {
        let bytes = self.read_all()?;
        self.stream = Some(Box::new(Cursor::new(bytes.clone())));
        self.consumed = false;
        Ok(bytes)
    }

    /// Reads what is left, ignoring read errors, and returns everything
    /// captured so far.
    pub(crate) fn drain_lossy(&mut self) -> Bytes {
        if !self.consumed
            && let Some(mut stream) = self.stream.take()
        {
            self.consumed = true;
            let mut buf = Vec::new();
            if let Err(err) = stream.read_to_end(&mut buf) {
                trace!(error = %err, "response body truncated");
            }
            drop(stream);
            trace!(read = buf.len(), "response body closed");
            self.captured = Bytes::from(buf);
        }
        self.captured.clone()
    }

    /// Releases the stream without reading it. Closing twice is a no-op.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            trace!("response body closed unread");
        }
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        self.close();
    }
}

/// Status, headers and body stream of a response.
#[derive(Debug)]
pub struct ResponseParts {
    status: u16,
    headers: HeaderMap,
    content_length: Option<u64>,
    body: Body,
}

impl ResponseParts {
    /// Creates response parts.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: Body, content_length: Option<u64>) -> Self {
        Self {
            status,
            headers,
            content_length,
            body,
        }
    }

    /// Placeholder for a response that was never received.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(0, HeaderMap::new(), Body::empty(), None)
    }

    /// HTTP status code, `0` if nothing was received.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Single header value by name, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Declared content length.
    #[must_use]
    pub const fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The body stream.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable access to the body stream.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

impl From<TransportResponse> for ResponseParts {
    fn from(response: TransportResponse) -> Self {
        Self::new(
            response.status,
            response.headers,
            Body::boxed(response.body),
            response.content_length,
        )
    }
}

/// The outcome of [`PendingRequest::send`].
#[derive(Debug)]
pub struct PendingResponse {
    request: PendingRequest,
    parts: ResponseParts,
}

impl PendingResponse {
    pub(crate) fn new(request: PendingRequest, parts: ResponseParts) -> Self {
        Self { request, parts }
    }

    /// The request that produced this response.
    #[must_use]
    pub fn request(&self) -> &PendingRequest {
        &self.request
    }

    /// The response parts; empty when the request was never sent.
    #[must_use]
    pub fn parts(&self) -> &ResponseParts {
        &self.parts
    }

    /// The first recorded failure.
    #[must_use]
    pub fn failure(&self) -> Option<&Error> {
        self.request.failure()
    }

    /// Returns `true` once any step has failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.request.is_failed()
    }

    fn check(
        mut self,
        op: impl FnOnce(&dyn Inspector, &mut ResponseParts) -> std::result::Result<(), BoxError>,
    ) -> Self {
        if self.request.is_failed() {
            return self;
        }
        let outcome = op(self.request.client().response_inspector(), &mut self.parts);
        if let Err(cause) = outcome {
            let error = Error::response(
                cause.to_string(),
                self.request.snapshot(),
                ResponseSnapshot::capture(&mut self.parts),
            );
            self.request.record(error);
        }
        self
    }

    /// Fails unless the status is in the 2xx range.
    pub fn expect_success(self) -> Self {
        self.check(|inspector, parts| inspector.expect_success(parts))
    }

    /// Fails unless the status is exactly `code`.
    pub fn expect_status(self, code: u16) -> Self {
        self.check(|inspector, parts| inspector.expect_status(parts, code))
    }

    /// Fails unless the header `key` contains `value`.
    pub fn expect_header(self, key: &str, value: &str) -> Self {
        self.check(|inspector, parts| inspector.expect_header(parts, key, value))
    }

    /// Fails unless `Content-Type` contains `value`, which may be a
    /// shorthand alias such as `json` or `html`.
    pub fn expect_type(self, value: &str) -> Self {
        self.check(|inspector, parts| inspector.expect_type(parts, value))
    }

    /// Copies the header `key` into `into`, empty when absent.
    pub fn get_header(self, key: &str, into: &mut String) -> Self {
        self.check(|inspector, parts| {
            *into = inspector.header(parts, key);
            Ok(())
        })
    }

    /// Reads the body as UTF-8 text into `into`.
    pub fn get_body(self, into: &mut String) -> Self {
        self.check(|inspector, parts| {
            let bytes = inspector.read_body(parts)?;
            *into = String::from_utf8(bytes.to_vec())
                .map_err(|err| format!("response body is not valid UTF-8: {err}"))?;
            Ok(())
        })
    }

    /// Decodes the JSON body into `into`.
    pub fn get_json<T: serde::de::DeserializeOwned>(self, into: &mut T) -> Self {
        self.check(|inspector, parts| {
            let bytes = inspector.read_body(parts)?;
            *into = crate::from_json(&bytes)?;
            Ok(())
        })
    }

    /// Copies the body verbatim into `sink`.
    pub fn proxy(self, sink: &mut impl Write) -> Self {
        self.check(|inspector, parts| inspector.proxy(parts, sink).map(|_| ()))
    }

    /// Logs the body, pretty-printed when it is JSON, at `debug` level.
    /// The body stays readable by the next operation.
    pub fn log_json(self) -> Self {
        self.check(|_, parts| {
            let bytes = parts.body_mut().buffer()?;
            match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(value) => {
                    let pretty = serde_json::to_string_pretty(&value).unwrap_or_default();
                    debug!(body = %pretty, "response JSON");
                }
                Err(_) => debug!(body = %String::from_utf8_lossy(&bytes), "response body"),
            }
            Ok(())
        })
    }

    /// Runs a custom step under the same short-circuit rule as the
    /// built-in operations.
    pub fn and_then(
        self,
        step: impl FnOnce(&mut ResponseParts) -> std::result::Result<(), BoxError>,
    ) -> Self {
        self.check(|_, parts| step(parts))
    }

    /// Continues with another request that inherits this chain's failure.
    pub fn next(self) -> Next {
        let (client, failure) = self.request.into_failure();
        Next::carry(client, failure)
    }

    /// Ends the chain, returning the first failure if any.
    pub fn done(self) -> Result<()> {
        let (_, failure) = self.request.into_failure();
        failure.map_or(Ok(()), Err)
    }

    /// Reads the body as text and ends the chain.
    pub fn text(self) -> Result<String> {
        let mut text = String::new();
        self.get_body(&mut text).done().map(|()| text)
    }

    /// Decodes the JSON body and ends the chain.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        let mut value: Option<T> = None;
        let response = self.check(|inspector, parts| {
            let bytes = inspector.read_body(parts)?;
            value = Some(crate::from_json(&bytes)?);
            Ok(())
        });
        let snapshot = response.request.snapshot();
        response.done()?;
        value.ok_or_else(|| Error::request("response body was not decoded", snapshot))
    }
}
