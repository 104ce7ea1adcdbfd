//! The client: a transport plus the capabilities every chain runs through.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::{
    Builder, Continuation, DefaultBuilder, DefaultContinuation, DefaultFactory, DefaultInspector,
    Error, Factory, Inspector, Method, PendingRequest, RequestSnapshot, Transport,
};

/// Entry point for request chains.
///
/// Cheap to clone and shareable across threads; every chain created from a
/// client uses its transport and capabilities, continuations included.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    factory: Arc<dyn Factory>,
    builder: Arc<dyn Builder>,
    inspector: Arc<dyn Inspector>,
    continuation: Arc<dyn Continuation>,
    base_url: Option<Url>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with the default capabilities.
    #[must_use]
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::builder(transport).build()
    }

    /// Starts configuring a client.
    #[must_use]
    pub fn builder(transport: impl Transport + 'static) -> ClientBuilder {
        ClientBuilder::new(Arc::new(transport))
    }

    /// Creates a request.
    ///
    /// A path that cannot be turned into a URL yields a request that is
    /// already failed; the error surfaces at `done`.
    pub fn new_request(&self, method: Method, path: &str) -> PendingRequest {
        match self
            .inner
            .factory
            .new_request(method, path, self.inner.base_url.as_ref())
        {
            Ok(parts) => PendingRequest::new(self.clone(), parts),
            Err(cause) => PendingRequest::unbuilt(
                self.clone(),
                Error::request(cause.to_string(), RequestSnapshot::unbuilt(method, path)),
            ),
        }
    }

    /// Creates a GET request.
    pub fn get(&self, path: &str) -> PendingRequest {
        self.new_request(Method::Get, path)
    }

    /// Creates a POST request.
    pub fn post(&self, path: &str) -> PendingRequest {
        self.new_request(Method::Post, path)
    }

    /// Creates a PUT request.
    pub fn put(&self, path: &str) -> PendingRequest {
        self.new_request(Method::Put, path)
    }

    /// Creates a DELETE request.
    pub fn delete(&self, path: &str) -> PendingRequest {
        self.new_request(Method::Delete, path)
    }

    /// Creates a PATCH request.
    pub fn patch(&self, path: &str) -> PendingRequest {
        self.new_request(Method::Patch, path)
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        &*self.inner.transport
    }

    /// The request factory.
    #[must_use]
    pub fn factory(&self) -> &dyn Factory {
        &*self.inner.factory
    }

    /// The request builder capability.
    #[must_use]
    pub fn request_builder(&self) -> &dyn Builder {
        &*self.inner.builder
    }

    /// The response inspector capability.
    #[must_use]
    pub fn response_inspector(&self) -> &dyn Inspector {
        &*self.inner.inspector
    }

    /// The continuation capability behind [`Next`](crate::Next).
    #[must_use]
    pub fn continuation(&self) -> &dyn Continuation {
        &*self.inner.continuation
    }

    /// Base URL relative paths are joined onto.
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.inner.base_url.as_ref()
    }
}

/// Builder for [`Client`].
///
/// # Example
///
/// ```ignore
/// let client = Client::builder(transport)
///     .base_url(Url::parse("https://api.example.com/v1/")?)
///     .wrap_builder(|inner| Audit::new(inner))
///     .build();
/// ```
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    factory: Arc<dyn Factory>,
    builder: Arc<dyn Builder>,
    inspector: Arc<dyn Inspector>,
    continuation: Arc<dyn Continuation>,
    base_url: Option<Url>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            factory: Arc::new(DefaultFactory),
            builder: Arc::new(DefaultBuilder),
            inspector: Arc::new(DefaultInspector),
            continuation: Arc::new(DefaultContinuation),
            base_url: None,
        }
    }

    /// Sets the base URL relative paths are joined onto.
    ///
    /// Keep the trailing slash to join below the base path.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Replaces the request factory.
    pub fn with_factory(mut self, factory: impl Factory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Replaces the request builder capability.
    pub fn with_builder(mut self, builder: impl Builder + 'static) -> Self {
        self.builder = Arc::new(builder);
        self
    }

    /// Replaces the response inspector capability.
    pub fn with_inspector(mut self, inspector: impl Inspector + 'static) -> Self {
        self.inspector = Arc::new(inspector);
        self
    }

    /// Replaces the continuation capability.
    pub fn with_continuation(mut self, continuation: impl Continuation + 'static) -> Self {
        self.continuation = Arc::new(continuation);
        self
    }

    /// Wraps the current request factory.
    pub fn wrap_factory<F: Factory + 'static>(
        mut self,
        wrap: impl FnOnce(Arc<dyn Factory>) -> F,
    ) -> Self {
        self.factory = Arc::new(wrap(self.factory));
        self
    }

    /// Wraps the current request builder capability.
    pub fn wrap_builder<B: Builder + 'static>(
        mut self,
        wrap: impl FnOnce(Arc<dyn Builder>) -> B,
    ) -> Self {
        self.builder = Arc::new(wrap(self.builder));
        self
    }

    /// Wraps the current response inspector capability.
    pub fn wrap_inspector<I: Inspector + 'static>(
        mut self,
        wrap: impl FnOnce(Arc<dyn Inspector>) -> I,
    ) -> Self {
        self.inspector = Arc::new(wrap(self.inspector));
        self
    }

    /// Wraps the current continuation capability.
    pub fn wrap_continuation<C: Continuation + 'static>(
        mut self,
        wrap: impl FnOnce(Arc<dyn Continuation>) -> C,
    ) -> Self {
        self.continuation = Arc::new(wrap(self.continuation));
        self
    }

    /// Wraps the transport, e.g. with a logging decorator.
    pub fn wrap_transport<T: Transport + 'static>(
        mut self,
        wrap: impl FnOnce(Arc<dyn Transport>) -> T,
    ) -> Self {
        self.transport = Arc::new(wrap(self.transport));
        self
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(Inner {
                transport: self.transport,
                factory: self.factory,
                builder: self.builder,
                inspector: self.inspector,
                continuation: self.continuation,
                base_url: self.base_url,
            }),
        }
    }
}
