//! JSON-RPC over HTTP transport to the registry authority
//!
//! Each call opens a request through a shared hyper-util client, posts one
//! JSON-RPC request to the authority URL and decodes the typed result. The
//! whole exchange (connect, send, read body) is bounded by
//! [`HttpTransportConfig::request_timeout`].
//!
//! # Example
//!
//! ```no_run
//! use regcache_common::transport::{HttpRegistryTransport, HttpTransportConfig, RegistryTransport};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpRegistryTransport::new(HttpTransportConfig::new("http://127.0.0.1:8761/"))?;
//! let snapshot = transport.fetch_full_registry().await?;
//! println!("{} instances", snapshot.total_instance_count());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::RegistryTransport;
use crate::protocol::jsonrpc::{CANCEL_METHOD, FETCH_DELTA_METHOD, FETCH_FULL_METHOD};
use crate::protocol::{DeltaBatch, JsonRpcRequest, JsonRpcResponse, RegcacheError, RegistrySnapshot, Result};

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Authority endpoint, including the `http://` or `https://` prefix.
    pub authority_url: String,
    /// Upper bound for one complete request/response exchange.
    pub request_timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(authority_url: impl Into<String>) -> Self {
        Self {
            authority_url: authority_url.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Validates that a URL string starts with http:// or https://
pub fn validate_http_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(RegcacheError::InvalidRequest(format!(
            "authority url '{}' must start with http:// or https://",
            url
        )))
    }
}

/// [`RegistryTransport`] speaking JSON-RPC over HTTP.
pub struct HttpRegistryTransport {
    config: HttpTransportConfig,
    client: Client<HttpConnector, Full<Bytes>>,
    next_id: AtomicU64,
}

impl HttpRegistryTransport {
    /// Creates a transport for the given authority.
    ///
    /// Fails only if the URL does not carry an http(s) scheme; no connection
    /// is made until the first call.
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        validate_http_url(&config.authority_url)?;
        let client = Client::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Calls `method` and decodes its result as `T`.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, params, json!(id));
        let timeout = self.config.request_timeout;

        let response = tokio::time::timeout(timeout, self.exchange(&request))
            .await
            .map_err(|_| RegcacheError::Timeout(timeout.as_millis() as u64))??;

        let result = response.into_result()?;
        serde_json::from_value(result).map_err(|e| {
            RegcacheError::InvalidResponse(format!("{} returned an unexpected result: {}", method, e))
        })
    }

    /// Sends one request and parses the JSON-RPC response body.
    async fn exchange(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let body = serde_json::to_vec(request)?;

        let http_request = Request::builder()
            .method(Method::POST)
            .uri(&self.config.authority_url)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RegcacheError::InvalidRequest(format!("Failed to build request: {}", e)))?;

        debug!("Sending {} to {}", request.method, self.config.authority_url);

        let response = self
            .client
            .request(http_request)
            .await
            .map_err(|e| RegcacheError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegcacheError::Transport(format!(
                "Authority responded with HTTP {}",
                status
            )));
        }

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| RegcacheError::Transport(format!("Failed to read response: {}", e)))?
            .to_bytes();

        serde_json::from_slice(&body_bytes).map_err(|e| {
            RegcacheError::InvalidResponse(format!("Malformed JSON-RPC response: {}", e))
        })
    }
}

#[async_trait]
impl RegistryTransport for HttpRegistryTransport {
    async fn fetch_full_registry(&self) -> Result<RegistrySnapshot> {
        self.call(FETCH_FULL_METHOD, json!({})).await
    }

    async fn fetch_delta_registry(&self) -> Result<DeltaBatch> {
        self.call(FETCH_DELTA_METHOD, json!({})).await
    }

    async fn cancel_instance(&self, service_name: &str, instance_id: &str) -> Result<()> {
        let _: Value = self
            .call(
                CANCEL_METHOD,
                json!({ "service_name": service_name, "instance_id": instance_id }),
            )
            .await?;
        Ok(())
    }
}
