//! Capabilities: the replaceable pieces behind every chain operation.
//!
//! Each trait has a default implementation and a [`delegate`] method. Every
//! operation is a provided method forwarding to the delegate, so a wrapper
//! only overrides what it intercepts:
//!
//! ```ignore
//! struct Tracing(Arc<dyn Builder>);
//!
//! impl Builder for Tracing {
//!     fn delegate(&self) -> &dyn Builder {
//!         &*self.0
//!     }
//!
//!     fn header(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
//!         tracing::info!(key, "header set");
//!         self.0.header(parts, key, value)
//!     }
//! }
//! ```
//!
//! Default compositions (`basic_auth` over `header`, `expect_type` over
//! `expect_header`) run inside the delegate and do not see a wrapper's
//! overrides.
//!
//! [`delegate`]: Builder::delegate

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue, USER_AGENT};
use url::Url;

use crate::{BoxError, ContentType, Form, Method, RequestParts, ResponseParts, resolve_alias};

/// Default `User-Agent` of every request.
pub const USER_AGENT_VALUE: &str = "errand/v1";

// ============================================================================
// Factory
// ============================================================================

/// Builds the initial parts of a request.
pub trait Factory: Send + Sync {
    /// The implementation this one forwards to.
    fn delegate(&self) -> &dyn Factory {
        &DefaultFactory
    }

    /// Creates request parts for `method` and `path`.
    ///
    /// A relative `path` is joined onto `base` when one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the target URL cannot be parsed.
    fn new_request(
        &self,
        method: Method,
        path: &str,
        base: Option<&Url>,
    ) -> Result<RequestParts, BoxError> {
        self.delegate().new_request(method, path, base)
    }
}

/// Parses the target and sets `Accept: application/json` and
/// `User-Agent: errand/v1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl Factory for DefaultFactory {
    fn new_request(
        &self,
        method: Method,
        path: &str,
        base: Option<&Url>,
    ) -> Result<RequestParts, BoxError> {
        let url = match base {
            Some(base) => base.join(path),
            None => Url::parse(path),
        }
        .map_err(|err| format!("invalid url {path:?}: {err}"))?;

        let mut parts = RequestParts::new(method, url);
        let headers = parts.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static(ContentType::Json.as_str()));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(parts)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Mutates a request while it is being assembled.
pub trait Builder: Send + Sync {
    /// The implementation this one forwards to.
    fn delegate(&self) -> &dyn Builder {
        &DefaultBuilder
    }

    /// Sets a header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid header name or value.
    fn header(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
        self.delegate().header(parts, key, value)
    }

    /// Sets basic authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be set.
    fn basic_auth(
        &self,
        parts: &mut RequestParts,
        username: &str,
        password: &str,
    ) -> Result<(), BoxError> {
        self.delegate().basic_auth(parts, username, password)
    }

    /// Appends a query parameter.
    ///
    /// # Errors
    ///
    /// Implementations may reject the pair.
    fn query(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
        self.delegate().query(parts, key, value)
    }

    /// Replaces the first `:key` placeholder of the URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the substituted URL does not parse.
    fn param(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
        self.delegate().param(parts, key, value)
    }

    /// Replaces the body.
    ///
    /// # Errors
    ///
    /// Implementations may reject the body.
    fn body(&self, parts: &mut RequestParts, body: Bytes) -> Result<(), BoxError> {
        self.delegate().body(parts, body)
    }

    /// Sets an already encoded JSON body.
    ///
    /// # Errors
    ///
    /// Implementations may reject the body.
    fn json_body(&self, parts: &mut RequestParts, encoded: Bytes) -> Result<(), BoxError> {
        self.delegate().json_body(parts, encoded)
    }

    /// Sets a multipart form body.
    ///
    /// # Errors
    ///
    /// Returns the form's deferred error, if any.
    fn multipart_body(&self, parts: &mut RequestParts, form: Form) -> Result<(), BoxError> {
        self.delegate().multipart_body(parts, form)
    }

    /// Last chance to adjust the request before it is handed to the transport.
    ///
    /// # Errors
    ///
    /// A failure here is recorded as a build-time error and nothing is sent.
    fn prepare(&self, parts: &mut RequestParts) -> Result<(), BoxError> {
        self.delegate().prepare(parts)
    }
}

/// Stock request mutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBuilder;

impl Builder for DefaultBuilder {
    fn header(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| format!("invalid header name {key:?}: {err}"))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| format!("invalid value for header {key:?}: {err}"))?;
        parts.headers_mut().insert(name, value);
        Ok(())
    }

    fn basic_auth(
        &self,
        parts: &mut RequestParts,
        username: &str,
        password: &str,
    ) -> Result<(), BoxError> {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        self.header(parts, AUTHORIZATION.as_str(), &format!("Basic {credentials}"))
    }

    fn query(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
        parts.url_mut().query_pairs_mut().append_pair(key, value);
        Ok(())
    }

    fn param(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
        let placeholder = format!(":{key}");
        let current = parts.url().as_str();
        if !current.contains(&placeholder) {
            return Ok(());
        }
        let replaced = current.replacen(&placeholder, value, 1);
        let url = Url::parse(&replaced).map_err(|err| format!("invalid url {replaced:?}: {err}"))?;
        *parts.url_mut() = url;
        Ok(())
    }

    fn body(&self, parts: &mut RequestParts, body: Bytes) -> Result<(), BoxError> {
        parts.set_body(body);
        Ok(())
    }

    fn json_body(&self, parts: &mut RequestParts, encoded: Bytes) -> Result<(), BoxError> {
        parts.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(ContentType::Json.as_str()),
        );
        parts.set_body(encoded);
        Ok(())
    }

    fn multipart_body(&self, parts: &mut RequestParts, form: Form) -> Result<(), BoxError> {
        let (content_type, body) = form.into_body()?;
        let value = HeaderValue::from_str(&content_type)?;
        parts.headers_mut().insert(CONTENT_TYPE, value);
        parts.set_body(body);
        Ok(())
    }

    fn prepare(&self, _parts: &mut RequestParts) -> Result<(), BoxError> {
        Ok(())
    }
}

// ============================================================================
// Inspector
// ============================================================================

/// Checks and reads a response.
pub trait Inspector: Send + Sync {
    /// The implementation this one forwards to.
    fn delegate(&self) -> &dyn Inspector {
        &DefaultInspector
    }

    /// Checks for a 2xx status.
    ///
    /// # Errors
    ///
    /// Returns an error for any other status.
    fn expect_success(&self, parts: &mut ResponseParts) -> Result<(), BoxError> {
        self.delegate().expect_success(parts)
    }

    /// Checks for an exact status.
    ///
    /// # Errors
    ///
    /// Returns an error when the status differs.
    fn expect_status(&self, parts: &mut ResponseParts, code: u16) -> Result<(), BoxError> {
        self.delegate().expect_status(parts, code)
    }

    /// Checks that header `key` contains `value`.
    ///
    /// # Errors
    ///
    /// Returns an error when the header is absent or does not match.
    fn expect_header(
        &self,
        parts: &mut ResponseParts,
        key: &str,
        value: &str,
    ) -> Result<(), BoxError> {
        self.delegate().expect_header(parts, key, value)
    }

    /// Checks the content type, accepting shorthand aliases.
    ///
    /// # Errors
    ///
    /// Returns an error when the content type does not match.
    fn expect_type(&self, parts: &mut ResponseParts, value: &str) -> Result<(), BoxError> {
        self.delegate().expect_type(parts, value)
    }

    /// Header value, empty when absent.
    fn header(&self, parts: &ResponseParts, key: &str) -> String {
        self.delegate().header(parts, key)
    }

    /// Reads and closes the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body was already consumed or cannot be read.
    fn read_body(&self, parts: &mut ResponseParts) -> Result<Bytes, BoxError> {
        self.delegate().read_body(parts)
    }

    /// Copies the body into `sink` and closes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the body was already consumed or the copy fails.
    fn proxy(&self, parts: &mut ResponseParts, sink: &mut dyn Write) -> Result<u64, BoxError> {
        self.delegate().proxy(parts, sink)
    }
}

/// Stock response checks and reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInspector;

impl Inspector for DefaultInspector {
    fn expect_success(&self, parts: &mut ResponseParts) -> Result<(), BoxError> {
        if parts.is_success() {
            return Ok(());
        }
        Err(format!(
            "invalid status code: expected to be in 200 range, got '{}'",
            parts.status()
        )
        .into())
    }

    fn expect_status(&self, parts: &mut ResponseParts, code: u16) -> Result<(), BoxError> {
        if parts.status() == code {
            return Ok(());
        }
        Err(format!(
            "invalid status code: expected to be '{code}', got '{}'",
            parts.status()
        )
        .into())
    }

    fn expect_header(
        &self,
        parts: &mut ResponseParts,
        key: &str,
        value: &str,
    ) -> Result<(), BoxError> {
        let actual = self.header(parts, key);
        if actual.contains(value) {
            return Ok(());
        }
        Err(format!("invalid header: expected {key:?} header to be {value:?}, got {actual:?}").into())
    }

    fn expect_type(&self, parts: &mut ResponseParts, value: &str) -> Result<(), BoxError> {
        self.expect_header(parts, CONTENT_TYPE.as_str(), resolve_alias(value))
    }

    fn header(&self, parts: &ResponseParts, key: &str) -> String {
        parts.header(key).unwrap_or_default().to_string()
    }

    fn read_body(&self, parts: &mut ResponseParts) -> Result<Bytes, BoxError> {
        parts.body_mut().read_all()
    }

    fn proxy(&self, parts: &mut ResponseParts, sink: &mut dyn Write) -> Result<u64, BoxError> {
        parts.body_mut().copy_to(sink)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::HeaderMap;

    use super::*;
    use crate::Body;

    fn request(path: &str) -> RequestParts {
        DefaultFactory
            .new_request(Method::Get, path, None)
            .expect("valid url")
    }

    fn response(status: u16, content_type: &str) -> ResponseParts {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type.parse().expect("value"));
        ResponseParts::new(status, headers, Body::empty(), None)
    }

    #[test]
    fn factory_joins_relative_paths_to_base() {
        let base = Url::parse("https://api.example.com/v1/").expect("base");
        let parts = DefaultFactory
            .new_request(Method::Delete, "users/1", Some(&base))
            .expect("joined");

        assert_eq!(parts.url().as_str(), "https://api.example.com/v1/users/1");
        assert_eq!(parts.method(), Method::Delete);
    }

    #[test]
    fn factory_rejects_relative_path_without_base() {
        let err = DefaultFactory
            .new_request(Method::Get, "/users", None)
            .expect_err("no base");
        assert!(err.to_string().contains("\"/users\""));
    }

    #[test]
    fn header_rejects_invalid_value() {
        let mut parts = request("https://example.com");
        let err = DefaultBuilder
            .header(&mut parts, "X-Bad", "line\nbreak")
            .expect_err("newline");
        assert!(err.to_string().contains("X-Bad"));
    }

    #[test]
    fn status_messages_name_both_codes() {
        let mut parts = response(404, "text/plain");

        let err = DefaultInspector.expect_success(&mut parts).expect_err("404");
        assert_eq!(
            err.to_string(),
            "invalid status code: expected to be in 200 range, got '404'"
        );

        let err = DefaultInspector
            .expect_status(&mut parts, 201)
            .expect_err("404");
        assert_eq!(err.to_string(), "invalid status code: expected to be '201', got '404'");
    }

    #[test]
    fn expect_type_resolves_aliases() {
        let mut parts = response(200, "application/json; charset=utf-8");

        assert!(DefaultInspector.expect_type(&mut parts, "json").is_ok());
        assert!(DefaultInspector.expect_type(&mut parts, "charset=utf-8").is_ok());

        let err = DefaultInspector
            .expect_type(&mut parts, "html")
            .expect_err("not html");
        assert!(err.to_string().contains("\"text/html\""));
    }

    #[test]
    fn missing_header_reads_as_empty() {
        let parts = response(200, "text/plain");
        assert_eq!(DefaultInspector.header(&parts, "x-missing"), "");
    }

    struct Recording {
        inner: Arc<dyn Builder>,
        seen: Mutex<Vec<String>>,
    }

    impl Builder for Recording {
        fn delegate(&self) -> &dyn Builder {
            &*self.inner
        }

        fn query(&self, parts: &mut RequestParts, key: &str, value: &str) -> Result<(), BoxError> {
            self.seen
                .lock()
                .expect("lock")
                .push(format!("{key}={value}"));
            self.inner.query(parts, key, value)
        }
    }

    #[test]
    fn wrapper_overrides_only_what_it_intercepts() {
        let builder = Recording {
            inner: Arc::new(DefaultBuilder),
            seen: Mutex::new(Vec::new()),
        };
        let mut parts = request("https://example.com/search");

        builder.query(&mut parts, "q", "rust").expect("query");
        builder.header(&mut parts, "X-Trace", "1").expect("header");

        assert_eq!(*builder.seen.lock().expect("lock"), vec!["q=rust".to_string()]);
        assert_eq!(parts.url().query(), Some("q=rust"));
        assert_eq!(parts.header("x-trace"), Some("1"));
    }
}
