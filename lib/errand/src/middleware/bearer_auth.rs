//! Bearer token authentication.
//!
//! Adds an `Authorization: Bearer <token>` header to every request the
//! client builds, continuations included.

use std::sync::Arc;

use errand_core::{BoxError, Factory, Method, RequestParts, Url};
use http::HeaderValue;
use http::header::AUTHORIZATION;

/// Request factory that adds bearer token authentication.
///
/// # Example
///
/// ```ignore
/// use errand::middleware::BearerAuth;
///
/// let client = errand::builder()
///     .wrap_factory(BearerAuth::wrap("my-secret-token"))
///     .build();
/// ```
#[derive(Clone)]
pub struct BearerAuth {
    inner: Arc<dyn Factory>,
    token: Arc<str>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

impl BearerAuth {
    /// Create a bearer auth factory wrapping the given factory.
    pub fn new(inner: Arc<dyn Factory>, token: impl Into<String>) -> Self {
        Self {
            inner,
            token: Arc::from(token.into()),
        }
    }

    /// Wrapper for [`ClientBuilder::wrap_factory`](crate::ClientBuilder::wrap_factory).
    pub fn wrap(token: impl Into<String>) -> impl FnOnce(Arc<dyn Factory>) -> Self {
        let token = token.into();
        move |inner| Self::new(inner, token)
    }
}

impl Factory for BearerAuth {
    fn delegate(&self) -> &dyn Factory {
        &*self.inner
    }

    fn new_request(
        &self,
        method: Method,
        path: &str,
        base: Option<&Url>,
    ) -> Result<RequestParts, BoxError> {
        let mut parts = self.inner.new_request(method, path, base)?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| "invalid bearer token")?;
        value.set_sensitive(true);
        parts.headers_mut().insert(AUTHORIZATION, value);
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use errand_core::DefaultFactory;

    use super::*;

    #[test]
    fn adds_bearer_header() {
        let factory = BearerAuth::new(Arc::new(DefaultFactory), "test-token");
        let parts = factory
            .new_request(Method::Get, "https://api.example.com/me", None)
            .expect("request");

        assert_eq!(parts.header("authorization"), Some("Bearer test-token"));
        assert_eq!(parts.header("accept"), Some("application/json"));
    }

    #[test]
    fn rejects_token_with_newline() {
        let factory = BearerAuth::wrap("bad\ntoken")(Arc::new(DefaultFactory));
        let err = factory
            .new_request(Method::Get, "https://api.example.com/me", None)
            .expect_err("invalid header value");
        assert_eq!(err.to_string(), "invalid bearer token");
    }
}
