//! The HTTP transport seam and its hyper implementation.

use std::time::Duration;

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Body, Request, Uri};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::http_client::{HyperClient, build_client};
use crate::message::{InboundResponse, OutboundRequest};

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one HTTP request and returns the complete response.
///
/// Any HTTP status counts as a response; only failures to obtain one are
/// errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs the exchange.
    async fn send(&self, request: OutboundRequest) -> TransportResult<InboundResponse>;
}

/// [`HttpTransport`] backed by a pooled hyper client with rustls.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    timeout: Duration,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HyperTransport {
    /// Creates a transport with the given default deadline.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: build_client(16),
            timeout,
        }
    }

    /// Default deadline applied when a request carries none.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build(request: &OutboundRequest) -> TransportResult<Request<Body>> {
        let uri: Uri = request
            .url()
            .parse()
            .map_err(|err| TransportError::invalid_request(format!("invalid url `{}`: {err}", request.url())))?;

        let mut builder = Request::builder().method(request.method().clone()).uri(uri);
        for (name, value) in request.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| TransportError::invalid_request(format!("invalid header name `{name}`: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| TransportError::invalid_request(format!("invalid value for header `{name}`: {err}")))?;
            builder = builder.header(name, value);
        }

        let body = request.body().cloned().map_or_else(Body::empty, Body::from);
        builder
            .body(body)
            .map_err(|err| TransportError::invalid_request(format!("failed to build request: {err}")))
    }
}

#[async_trait]
impl HttpTransport for HyperTransport {
    async fn send(&self, request: OutboundRequest) -> TransportResult<InboundResponse> {
        let deadline = request.timeout().unwrap_or(self.timeout);
        let outbound = Self::build(&request)?;
        debug!(method = %request.method(), url = request.url(), "sending request");

        let exchange = async {
            let response = self.client.request(outbound).await.map_err(|err| {
                TransportError::connect(format!("{} {}: {err}", request.method(), request.url()))
            })?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_owned(), value.to_owned()))
                })
                .collect();
            let body = to_bytes(response.into_body())
                .await
                .map_err(|err| TransportError::Body {
                    reason: err.to_string(),
                })?;
            Ok::<_, TransportError>(InboundResponse::new(status, headers, body))
        };

        timeout(deadline, exchange)
            .await
            .map_err(|_| TransportError::Timeout { after: deadline })?
    }
}
