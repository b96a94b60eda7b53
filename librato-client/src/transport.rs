//! Dual-mode delivery of payloads to the metrics API.
//!
//! A post is delivered in one of two ways:
//!
//! - **Synchronous**: a managed HTTP request that waits for the response and
//!   decodes its JSON body.
//! - **Fire-and-forget**: a raw socket connect (bounded by the configured
//!   timeout), a single hand-off of the serialized request and an immediate
//!   close. No response is read. The outcome only says whether bytes were
//!   accepted by the socket, not whether the service accepted the data.
//!
//! Every call opens and tears down its own connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_TYPE, HOST};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use librato_types::{Payload, METRICS_PATH};

use crate::connector::{BoxedStream, Connector, TcpConnector, TlsConnector};
use crate::encode::{form_body, ContentType, MetricsQuery};
use crate::{ConnectError, RawRequest, TransportConfig, TransportError};

/// How a post is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Wait for and decode the response.
    Sync,
    /// Write the request and close without reading a response.
    FireAndForget,
}

/// Per-call options for [`MetricsTransport::post`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostOptions {
    /// Delivery mode; `None` uses the transport's configured default.
    pub mode: Option<DeliveryMode>,
    /// Body encoding of a synchronous post. Fire-and-forget always sends a form body.
    pub content_type: ContentType,
}

impl PostOptions {
    pub fn sync() -> Self {
        Self::default().mode(DeliveryMode::Sync)
    }

    pub fn fire_and_forget() -> Self {
        Self::default().mode(DeliveryMode::FireAndForget)
    }

    pub fn mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

/// Result of a successful post.
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// Fire-and-forget result: `true` means bytes were handed to the socket.
    ///
    /// Treat `true` as "attempted", never as "delivered".
    Dispatched(bool),
    /// Decoded body of a synchronous response.
    Response(Value),
}

impl PostOutcome {
    /// Whether a fire-and-forget send handed off any bytes.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, PostOutcome::Dispatched(true))
    }

    /// The decoded response body, if this was a synchronous post.
    pub fn into_response(self) -> Option<Value> {
        match self {
            PostOutcome::Response(value) => Some(value),
            PostOutcome::Dispatched(_) => None,
        }
    }
}

/// Delivers payloads and queries metrics.
///
/// Implemented by [`HttpTransport`]; tests and callers may substitute their own.
#[async_trait]
pub trait MetricsTransport: Send + Sync {
    /// Submit a payload.
    ///
    /// Synchronous failures are returned as errors. Fire-and-forget never
    /// returns an error; connect failures become `Dispatched(false)`.
    async fn post(
        &self,
        payload: &Payload,
        options: PostOptions,
    ) -> Result<PostOutcome, TransportError>;

    /// List metrics matching `query`; always synchronous.
    async fn get(&self, query: &MetricsQuery) -> Result<Value, TransportError>;
}

/// HTTP transport for the metrics API.
///
/// # Example
///
/// ```rust,no_run
/// use librato_client::{HttpTransport, MetricsTransport, PostOptions, TransportConfig};
/// use librato_types::MeasurementBuilder;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = TransportConfig::builder()
///         .credentials("foo@domain.org", "token")
///         .build();
///     let transport = HttpTransport::new(config)?;
///
///     let payload = MeasurementBuilder::default().gauge("cpu.load", 0.42, None, Default::default());
///     let outcome = transport.post(&payload, PostOptions::sync()).await?;
///     println!("{:?}", outcome);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: Arc<TransportConfig>,
    client: Client,
    connector: Arc<dyn Connector>,
}

impl HttpTransport {
    /// Create a transport, choosing a TLS or plain connector from `config.secure`.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let connector: Arc<dyn Connector> = if config.secure {
            Arc::new(TlsConnector::new()?)
        } else {
            Arc::new(TcpConnector)
        };
        Self::with_connector(config, connector)
    }

    /// Create a transport with the default configuration.
    pub fn from_defaults() -> Result<Self, TransportError> {
        Self::new(TransportConfig::default())
    }

    /// Create a transport with an explicit raw-socket connector.
    pub fn with_connector(
        config: TransportConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, TransportError> {
        // No idle pool: every request opens and closes its own connection.
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
            connector,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Fire and forget on a background task, returning immediately.
    ///
    /// The task is bounded by twice the configured timeout (connect, then
    /// write) and its outcome is discarded. Outside a tokio runtime nothing is
    /// sent and a warning is logged.
    pub fn post_detached(&self, payload: Payload) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Detached post dropped, no tokio runtime: {}", e);
                return;
            }
        };
        let transport = self.clone();
        let bound = self.config.timeout * 2;
        runtime.spawn(async move {
            match tokio::time::timeout(bound, transport.fire_and_forget(&payload)).await {
                Ok(sent) => debug!(sent, "detached post finished"),
                Err(_) => debug!("detached post abandoned after {:?}", bound),
            }
        });
    }

    async fn post_sync(
        &self,
        payload: &Payload,
        content_type: ContentType,
    ) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.config.base_url(), METRICS_PATH);
        let creds = &self.config.credentials;

        let request = self
            .client
            .post(&url)
            .basic_auth(&creds.username, Some(&creds.token));
        let request = match content_type {
            ContentType::Json => request.json(payload),
            ContentType::Form => request
                .header(CONTENT_TYPE, ContentType::Form.mime())
                .body(form_body(payload)),
        };

        debug!(gauges = payload.len(), ?content_type, "POST {}", url);
        decode(request.send().await?).await
    }

    /// Connect, write the request once and close.
    ///
    /// Returns `true` iff more than zero bytes were written. The service's
    /// answer is never read.
    async fn fire_and_forget(&self, payload: &Payload) -> bool {
        let request = match self.raw_request(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!("Cannot build fire-and-forget request: {}", e);
                return false;
            }
        };

        let stream = match self.connect().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(host = %self.config.host, "Fire-and-forget connect failed: {}", e);
                return false;
            }
        };

        let written = hand_off(stream, &request.to_bytes(), self.config.timeout).await;
        debug!(gauges = payload.len(), written, "fire-and-forget POST {}", METRICS_PATH);
        written > 0
    }

    async fn connect(&self) -> Result<BoxedStream, ConnectError> {
        let (host, port) = self.config.authority();
        tokio::time::timeout(self.config.timeout, self.connector.connect(&host, port))
            .await
            .map_err(|_| ConnectError::TimedOut)?
    }

    pub(crate) fn raw_request(&self, payload: &Payload) -> Result<RawRequest, TransportError> {
        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|e| TransportError::Http(e.to_string()))
        };

        Ok(RawRequest::new(Method::POST, METRICS_PATH)
            .header(HOST, header(&self.config.host)?)
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .header(CONTENT_TYPE, HeaderValue::from_static(ContentType::Form.mime()))
            .header(
                AUTHORIZATION,
                header(&self.config.credentials.basic_auth_header())?,
            )
            .body(form_body(payload).into_bytes())
            .header(CONNECTION, HeaderValue::from_static("Close")))
    }
}

#[async_trait]
impl MetricsTransport for HttpTransport {
    async fn post(
        &self,
        payload: &Payload,
        options: PostOptions,
    ) -> Result<PostOutcome, TransportError> {
        let mode = options.mode.unwrap_or(if self.config.async_default {
            DeliveryMode::FireAndForget
        } else {
            DeliveryMode::Sync
        });

        match mode {
            DeliveryMode::FireAndForget => {
                Ok(PostOutcome::Dispatched(self.fire_and_forget(payload).await))
            }
            DeliveryMode::Sync => Ok(PostOutcome::Response(
                self.post_sync(payload, options.content_type).await?,
            )),
        }
    }

    async fn get(&self, query: &MetricsQuery) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.config.base_url(), METRICS_PATH);
        let creds = &self.config.credentials;

        debug!(?query, "GET {}", url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&creds.username, Some(&creds.token))
            .query(&query.pairs())
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode(response: reqwest::Response) -> Result<Value, TransportError> {
    let status = response.status();
    let text = response.text().await?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(TransportError::Auth("Invalid credentials".to_string()));
    }

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).map_err(|e| TransportError::Parse(e.to_string()))?
    };

    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

// Writes as much of `bytes` as the socket accepts within `limit`, then closes it.
// Returns the number of bytes written; a short write still counts.
async fn hand_off(mut stream: BoxedStream, bytes: &[u8], limit: Duration) -> usize {
    let mut written = 0;
    let write_and_close = async {
        while written < bytes.len() {
            match stream.write(&bytes[written..]).await {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) => {
                    debug!("fire-and-forget write stopped after {} bytes: {}", written, e);
                    break;
                }
            }
        }
        if let Err(e) = stream.shutdown().await {
            debug!("fire-and-forget close failed: {}", e);
        }
    };
    let stalled = tokio::time::timeout(limit, write_and_close).await.is_err();
    if stalled {
        debug!("fire-and-forget hand-off stalled after {} bytes", written);
    }
    written
}
