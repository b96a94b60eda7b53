//! High-level gauge submission and metric listing.

use serde_json::Value;

use librato_types::{MeasurementBuilder, Params, Payload};

use crate::{
    HttpTransport, MetricsQuery, MetricsTransport, PostOptions, PostOutcome, TransportConfig,
    TransportError,
};

/// Builds gauges and hands them to a transport.
///
/// # Example
///
/// ```rust,no_run
/// use librato_client::{Metrics, MetricsQuery, TransportConfig};
/// use librato_types::Params;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let metrics = Metrics::from_config(
///         TransportConfig::builder()
///             .credentials("foo@domain.org", "token")
///             .build(),
///     )?;
///
///     // Fire-and-forget by default: `true` means the bytes left, nothing more.
///     let outcome = metrics.gauge("cpu.load", 0.42, None, Params::new()).await?;
///     println!("attempted: {}", outcome.is_dispatched());
///
///     let found = metrics.list(&MetricsQuery::new().name("cpu")).await?;
///     println!("{}", found);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Metrics<T = HttpTransport> {
    transport: T,
    builder: MeasurementBuilder,
}

impl Metrics<HttpTransport> {
    /// HTTP transport for `config` with the default measurement builder.
    pub fn from_config(config: TransportConfig) -> Result<Self, TransportError> {
        Ok(Self::new(HttpTransport::new(config)?, MeasurementBuilder::default()))
    }
}

impl<T: MetricsTransport> Metrics<T> {
    pub fn new(transport: T, builder: MeasurementBuilder) -> Self {
        Self { transport, builder }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Track a gauge using the transport's default delivery mode.
    pub async fn gauge(
        &self,
        name: impl Into<String>,
        value: f64,
        source: Option<&str>,
        params: Params,
    ) -> Result<PostOutcome, TransportError> {
        self.gauge_with(name, value, source, params, PostOptions::default())
            .await
    }

    /// Track a gauge with explicit post options.
    pub async fn gauge_with(
        &self,
        name: impl Into<String>,
        value: f64,
        source: Option<&str>,
        params: Params,
        options: PostOptions,
    ) -> Result<PostOutcome, TransportError> {
        let payload = self.builder.gauge(name, value, source, params);
        self.post(&payload, options).await
    }

    /// Submit a prepared payload.
    pub async fn post(
        &self,
        payload: &Payload,
        options: PostOptions,
    ) -> Result<PostOutcome, TransportError> {
        self.transport.post(payload, options).await
    }

    /// List metrics, optionally filtered by name substring and tags.
    pub async fn list(&self, query: &MetricsQuery) -> Result<Value, TransportError> {
        self.transport.get(query).await
    }
}
