//! Continuing a chain with another request.

use crate::{Client, Error, Method, PendingRequest};

/// Starts the next request of a chain.
///
/// Installed on a [`Client`] like the other capabilities; a wrapper returns
/// its inner continuation from [`delegate`](Continuation::delegate) and
/// overrides [`new_request`](Continuation::new_request).
pub trait Continuation: Send + Sync {
    /// The implementation this one forwards to.
    fn delegate(&self) -> &dyn Continuation {
        &DefaultContinuation
    }

    /// Creates the next request on `client`, carrying the `inherited`
    /// failure of the previous one.
    fn new_request(
        &self,
        client: &Client,
        inherited: Option<Error>,
        method: Method,
        path: &str,
    ) -> PendingRequest {
        self.delegate().new_request(client, inherited, method, path)
    }
}

/// Builds through the client's factory. A construction failure wins over
/// the inherited one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContinuation;

impl Continuation for DefaultContinuation {
    fn new_request(
        &self,
        client: &Client,
        inherited: Option<Error>,
        method: Method,
        path: &str,
    ) -> PendingRequest {
        let mut request = client.new_request(method, path);
        request.inherit(inherited);
        request
    }
}

/// Carries a chain's failure into the next request.
///
/// The next request is created by the client's [`Continuation`], so it gets
/// the same defaults and capabilities as a fresh one. If the previous step
/// failed, the new request is failed too and nothing is sent.
#[derive(Debug)]
#[must_use = "a continuation does nothing until a request is created"]
pub struct Next {
    client: Client,
    failure: Option<Error>,
}

impl Next {
    pub(crate) fn carry(client: Client, failure: Option<Error>) -> Self {
        Self { client, failure }
    }

    /// The inherited failure.
    #[must_use]
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    /// Creates the next request.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(self, method: Method, path: &str) -> PendingRequest {
        self.client
            .continuation()
            .new_request(&self.client, self.failure, method, path)
    }

    /// Creates a GET request.
    pub fn get(self, path: &str) -> PendingRequest {
        self.new(Method::Get, path)
    }

    /// Creates a POST request.
    pub fn post(self, path: &str) -> PendingRequest {
        self.new(Method::Post, path)
    }

    /// Creates a PUT request.
    pub fn put(self, path: &str) -> PendingRequest {
        self.new(Method::Put, path)
    }

    /// Creates a DELETE request.
    pub fn delete(self, path: &str) -> PendingRequest {
        self.new(Method::Delete, path)
    }

    /// Creates a PATCH request.
    pub fn patch(self, path: &str) -> PendingRequest {
        self.new(Method::Patch, path)
    }
}
