//! Blocking transport over the hyper-util client.
//!
//! Each round trip is driven to completion on a current-thread tokio
//! runtime owned by the transport, so the chain stays synchronous. Do not
//! use it from inside an async task; hand the chain to a plain thread
//! instead.

use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use errand_core::{Transport, TransportError, TransportRequest, TransportResponse};
use http::header::CONTENT_LENGTH;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tokio::runtime::Runtime;
use tokio::time::{Instant, timeout_at};
use tracing::trace;

use crate::ClientConfig;

/// HTTPS connector using rustls with the Mozilla root certificates.
fn https_connector(config: &ClientConfig) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// Default transport of the `errand` client.
pub struct HyperTransport {
    runtime: Result<Runtime, String>,
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    /// Create a transport with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a transport with a custom configuration.
    ///
    /// If the runtime cannot be started, every round trip reports it as a
    /// connection error.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| err.to_string());

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(&config));

        Self {
            runtime,
            inner,
            config,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_hyper_request(
        request: TransportRequest,
    ) -> Result<http::Request<Full<Bytes>>, TransportError> {
        let mut builder = http::Request::builder()
            .method(http::Method::from(request.method))
            .uri(request.url.as_str());

        if let Some(headers) = builder.headers_mut() {
            *headers = request.headers;
        }

        builder
            .body(Full::new(request.body))
            .map_err(|err| TransportError::invalid_request(err.to_string()))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> TransportError {
        let msg = match std::error::Error::source(&err) {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        };

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return TransportError::Tls(msg);
        }

        TransportError::connection(msg)
    }

    async fn execute(
        &self,
        request: http::Request<Full<Bytes>>,
        deadline: Instant,
    ) -> Result<TransportResponse, TransportError> {
        let response = timeout_at(deadline, self.inner.request(request))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let (head, body) = response.into_parts();
        let status = head.status.as_u16();
        let content_length = head
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());

        let collected = match timeout_at(deadline, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(err)) => {
                return Err(incomplete(
                    err.to_string(),
                    status,
                    head.headers,
                    content_length,
                ));
            }
            Err(_) => {
                return Err(incomplete(
                    "timed out reading the body".to_string(),
                    status,
                    head.headers,
                    content_length,
                ));
            }
        };
        trace!(status, read = collected.len(), "response body buffered");

        Ok(TransportResponse {
            status,
            headers: head.headers,
            content_length,
            body: Box::new(Cursor::new(collected)),
        })
    }
}

/// The partial response keeps the declared length, not what was read.
fn incomplete(
    message: String,
    status: u16,
    headers: http::HeaderMap,
    content_length: Option<u64>,
) -> TransportError {
    TransportError::Incomplete {
        message,
        partial: Box::new(TransportResponse {
            status,
            headers,
            content_length,
            body: Box::new(Cursor::new(Bytes::new())),
        }),
    }
}

impl Transport for HyperTransport {
    fn round_trip(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let runtime = self
            .runtime
            .as_ref()
            .map_err(|err| TransportError::connection(format!("runtime unavailable: {err}")))?;

        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let hyper_request = Self::build_hyper_request(request)?;

        runtime.block_on(async {
            let deadline = Instant::now() + timeout;
            self.execute(hyper_request, deadline).await
        })
    }
}
