//! # librato-client
//!
//! Client for submitting gauges to the Librato metrics API and listing the
//! metrics already collected.
//!
//! Posts are delivered in one of two modes:
//!
//! - **Synchronous** - a managed HTTPS request; the JSON response is decoded
//!   and returned, failures surface as [`TransportError`]
//! - **Fire-and-forget** (the default) - a raw TLS socket write that returns as
//!   soon as the bytes are handed to the socket. No response is read, so a
//!   `true` outcome means "attempted", not "delivered"
//!
//! Nothing is retried, queued or batched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use librato_client::{Metrics, PostOptions, TransportConfig};
//! use librato_types::Params;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TransportConfig::builder()
//!         .credentials("foo@domain.org", "token")
//!         .build();
//!     let metrics = Metrics::from_config(config)?;
//!
//!     metrics.gauge("cpu.load", 0.42, None, Params::new()).await?;
//!
//!     let response = metrics
//!         .gauge_with("cpu.load", 0.40, Some("web-1"), Params::new(), PostOptions::sync())
//!         .await?;
//!     println!("{:?}", response.into_response());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! [`TransportConfig::from_env`] reads `LIBRATO_HOST`, `LIBRATO_TIMEOUT`,
//! `LIBRATO_USERNAME`, `LIBRATO_TOKEN`, `LIBRATO_ASYNC` and `LIBRATO_SECURE`.

mod client;
mod connector;
mod encode;
mod error;
mod raw;
mod settings;
mod transport;

pub use client::Metrics;
pub use connector::{BoxedStream, Connector, TcpConnector, TlsConnector};
pub use encode::{form_body, ContentType, MetricsQuery};
pub use error::{ConnectError, TransportError};
pub use raw::RawRequest;
pub use settings::{
    Credentials, TransportConfig, TransportConfigBuilder, DEFAULT_HOST, DEFAULT_TIMEOUT,
    ENV_PREFIX,
};
pub use transport::{DeliveryMode, HttpTransport, MetricsTransport, PostOptions, PostOutcome};

// Re-export types for convenience
pub use librato_types::{Field, Measurement, MeasurementBuilder, Params, Payload};
