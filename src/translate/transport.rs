//! HTTP transport seam. The client only sees `ProviderRequest` in and
//! `HttpResponse` out, so tests can substitute a recording transport.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use super::providers::ProviderRequest;

/// Status and raw body of a provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// No response was obtained at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub timed_out: bool,
}

pub trait HttpTransport: Send + Sync {
    fn send(&self, request: ProviderRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// Pooled reqwest client. The timeout bounds how long a stuck provider can
/// hold the single in-flight slot.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError {
                message: format!("http client init failed: {e}"),
                timed_out: false,
            })?;
        Ok(Self { http })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: ProviderRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let mut builder = self.http.post(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder
                .body(request.body.to_string())
                .send()
                .await
                .map_err(to_transport_error)?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(to_transport_error)?;
            debug!(status, body_len = body.len(), "provider_response");
            Ok(HttpResponse { status, body })
        })
    }
}

fn to_transport_error(e: reqwest::Error) -> TransportError {
    let timed_out = e.is_timeout();
    let message = if timed_out {
        "Network error: request timed out".to_owned()
    } else {
        format!("Network error: {e}")
    };
    TransportError { message, timed_out }
}
