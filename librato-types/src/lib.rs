//! # librato-types
//!
//! Core types for submitting gauges to the Librato metrics API. This crate
//! defines the measurement record, the batch payload the service accepts and
//! the builder that fills in default fields.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature for JSON payloads
//! - **Injectable context**: The deployment environment and the clock are traits,
//!   so defaults can be pinned in tests
//! - **Identity wins**: `name`, `value` and `source` can never be overwritten by extra params
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use librato_types::{FixedClock, MeasurementBuilder, Params, StaticEnvironment};
//!
//! let builder = MeasurementBuilder::new(StaticEnvironment::new("prod"), FixedClock(1_700_000_000));
//!
//! let payload = builder.gauge("cpu.load", 0.42, None, Params::new());
//!
//! assert_eq!(payload.gauges.len(), 1);
//! assert_eq!(payload.gauges[0].source, "prod");
//! assert_eq!(payload.gauges[0].measure_time, 1_700_000_000);
//! ```

mod builder;
mod context;
mod measurement;

pub use builder::*;
pub use context::*;
pub use measurement::*;

/// Path of the metrics collection on the remote service.
pub const METRICS_PATH: &str = "/v1/metrics";
