//! The request side of a chain.
//!
//! A [`PendingRequest`] is created by a [`Client`] and mutated by chained
//! builder operations. The first operation that fails records its error;
//! every later operation is skipped, and [`send`](PendingRequest::send)
//! hands the failure over to the response without calling the transport.
//!
//! # Example
//!
//! ```ignore
//! let response = client
//!     .post("https://api.example.com/users/:id/avatar")
//!     .param("id", 42)
//!     .basic_auth("alice", "secret")
//!     .json_body(&avatar)
//!     .send();
//! ```

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use tracing::{Span, debug, info_span};
use url::Url;

use crate::{
    BoxError, Builder, Client, Error, Form, Method, PendingResponse, RequestSnapshot,
    ResponseParts, ResponseSnapshot, TransportRequest,
};

/// Method, target, headers and body of a request being assembled.
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestParts {
    /// Creates parts with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Mutable access to the URL.
    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Single header value by name, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

/// A request that has not been sent yet, or that failed before sending.
pub struct PendingRequest {
    client: Client,
    parts: Option<RequestParts>,
    failure: Option<Error>,
    timeout: Option<Duration>,
    span: Option<Span>,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("parts", &self.parts)
            .field("failure", &self.failure)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PendingRequest {
    pub(crate) fn new(client: Client, parts: RequestParts) -> Self {
        Self {
            client,
            parts: Some(parts),
            failure: None,
            timeout: None,
            span: None,
        }
    }

    pub(crate) fn unbuilt(client: Client, error: Error) -> Self {
        debug!(error = %error.message(), "request could not be constructed");
        Self {
            client,
            parts: None,
            failure: Some(error),
            timeout: None,
            span: None,
        }
    }

    /// The client this request was created by.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The assembled parts, `None` if construction failed.
    #[must_use]
    pub fn parts(&self) -> Option<&RequestParts> {
        self.parts.as_ref()
    }

    /// The first recorded failure.
    #[must_use]
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Returns `true` once any step has failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub(crate) fn snapshot(&self) -> RequestSnapshot {
        self.parts
            .as_ref()
            .map(RequestSnapshot::of)
            .unwrap_or_default()
    }

    /// Records `error` unless a failure is already recorded.
    pub(crate) fn record(&mut self, error: Error) {
        if self.failure.is_none() {
            debug!(error = %error.message(), "chain failed");
            self.failure = Some(error);
        }
    }

    /// Adopts a failure carried over from a previous request, unless one
    /// is already recorded.
    pub fn inherit(&mut self, failure: Option<Error>) {
        if self.failure.is_none() {
            self.failure = failure;
        }
    }

    pub(crate) fn into_failure(self) -> (Client, Option<Error>) {
        (self.client, self.failure)
    }

    fn step(
        mut self,
        op: impl FnOnce(&dyn Builder, &mut RequestParts) -> Result<(), BoxError>,
    ) -> Self {
        if self.failure.is_some() {
            return self;
        }
        let Some(parts) = self.parts.as_mut() else {
            return self;
        };
        let outcome = op(self.client.request_builder(), parts)
            .map_err(|cause| Error::request(cause.to_string(), RequestSnapshot::of(parts)));
        if let Err(error) = outcome {
            self.record(error);
        }
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn header(self, key: &str, value: &str) -> Self {
        self.step(|builder, parts| builder.header(parts, key, value))
    }

    /// Sets `Authorization: Basic <base64(username:password)>`.
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        self.step(|builder, parts| builder.basic_auth(parts, username, password))
    }

    /// Appends a query parameter; repeated keys are kept.
    pub fn query(self, key: &str, value: impl fmt::Display) -> Self {
        self.step(|builder, parts| builder.query(parts, key, &value.to_string()))
    }

    /// Replaces the first `:key` placeholder in the URL with `value`.
    pub fn param(self, key: &str, value: impl fmt::Display) -> Self {
        self.step(|builder, parts| builder.param(parts, key, &value.to_string()))
    }

    /// Replaces the body.
    pub fn body(self, body: impl Into<Bytes>) -> Self {
        self.step(|builder, parts| builder.body(parts, body.into()))
    }

    /// Sets `value` encoded as JSON as the body.
    pub fn json_body<T: serde::Serialize + ?Sized>(self, value: &T) -> Self {
        self.step(|builder, parts| {
            let encoded = crate::to_json(value)?;
            builder.json_body(parts, encoded)
        })
    }

    /// Sets a multipart form as the body; the form's deferred error, if
    /// any, becomes the request's failure.
    pub fn multipart_body(self, form: Form) -> Self {
        self.step(|builder, parts| builder.multipart_body(parts, form))
    }

    /// Runs a custom step under the same short-circuit rule as the
    /// built-in operations.
    pub fn and_then(
        self,
        step: impl FnOnce(&mut RequestParts) -> Result<(), BoxError>,
    ) -> Self {
        self.step(|_, parts| step(parts))
    }

    /// Limits how long the transport may take for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        if self.failure.is_none() {
            self.timeout = Some(timeout);
        }
        self
    }

    /// Uses `span` as the parent of the dispatch span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Sends the request.
    ///
    /// When a failure is already recorded the transport is not called and
    /// the response is an empty placeholder carrying that failure.
    pub fn send(mut self) -> PendingResponse {
        if self.failure.is_some() {
            return PendingResponse::new(self, ResponseParts::empty());
        }
        let Some(parts) = self.parts.as_mut() else {
            return PendingResponse::new(self, ResponseParts::empty());
        };
        if let Err(cause) = self.client.request_builder().prepare(parts) {
            let error = Error::request(cause.to_string(), RequestSnapshot::of(parts));
            self.record(error);
            return PendingResponse::new(self, ResponseParts::empty());
        }

        let request = TransportRequest {
            method: parts.method(),
            url: parts.url().clone(),
            headers: parts.headers().clone(),
            body: parts.body().clone(),
            timeout: self.timeout,
        };
        let parent = self.span.clone().unwrap_or_else(Span::current);
        let span = info_span!(
            parent: &parent,
            "errand.request",
            http.method = %request.method,
            http.host = request.url.host_str().unwrap_or_default(),
            http.path = request.url.path()
        );
        let transport = self.client.transport();
        let result = span.in_scope(|| {
            debug!(url = %request.url, "dispatching request");
            transport.round_trip(request)
        });

        match result {
            Ok(response) => {
                debug!(parent: &span, status = response.status, "response received");
                PendingResponse::new(self, ResponseParts::from(response))
            }
            Err(err) => {
                let (message, partial) = err.into_partial();
                let mut response = partial.map_or_else(ResponseParts::empty, ResponseParts::from);
                let error = Error::response(
                    message,
                    self.snapshot(),
                    ResponseSnapshot::capture(&mut response),
                );
                self.record(error);
                PendingResponse::new(self, response)
            }
        }
    }
}
