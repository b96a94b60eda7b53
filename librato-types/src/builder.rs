//! Gauge construction with defaulted `source` and `measure_time`.

use std::sync::Arc;

use crate::{
    Clock, EnvironmentResolver, Measurement, Params, Payload, ProcessEnvironment, SystemClock,
    RESERVED_FIELDS,
};

/// Assembles measurements from caller values and defaults.
///
/// Fields are resolved in three layers, later layers winning:
///
/// 1. defaults (`measure_time` from the [`Clock`], `source` from the
///    [`EnvironmentResolver`])
/// 2. caller-supplied extra params
/// 3. the identity fields `name`, `value` and `source`
///
/// # Example
///
/// ```rust
/// use librato_types::{Field, FixedClock, MeasurementBuilder, Params, StaticEnvironment};
///
/// let builder = MeasurementBuilder::new(StaticEnvironment::new("prod"), FixedClock(100));
///
/// let mut params = Params::new();
/// params.insert("name".to_string(), Field::from("forged"));
/// params.insert("period".to_string(), Field::Int(60));
///
/// let m = builder.measurement("cpu.load", 0.42, None, params);
/// assert_eq!(m.name, "cpu.load");
/// assert_eq!(m.extra.get("period"), Some(&Field::Int(60)));
/// ```
#[derive(Debug, Clone)]
pub struct MeasurementBuilder {
    environment: Arc<dyn EnvironmentResolver>,
    clock: Arc<dyn Clock>,
}

impl MeasurementBuilder {
    /// Create a builder from explicit collaborators.
    pub fn new(
        environment: impl EnvironmentResolver + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            environment: Arc::new(environment),
            clock: Arc::new(clock),
        }
    }

    /// Build a single gauge record.
    ///
    /// An absent or empty `source` is replaced by the current environment.
    pub fn measurement(
        &self,
        name: impl Into<String>,
        value: f64,
        source: Option<&str>,
        params: Params,
    ) -> Measurement {
        let source = match source {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => self.environment.current(),
        };

        let mut measure_time = self.clock.now();
        let mut extra = params;
        if let Some(ts) = extra.get("measure_time").and_then(|f| f.as_timestamp()) {
            measure_time = ts;
        }
        for key in RESERVED_FIELDS {
            extra.remove(key);
        }

        Measurement {
            measure_time,
            source,
            extra,
            name: name.into(),
            value,
        }
    }

    /// Build a gauge and wrap it in a submission payload.
    pub fn gauge(
        &self,
        name: impl Into<String>,
        value: f64,
        source: Option<&str>,
        params: Params,
    ) -> Payload {
        Payload::single(self.measurement(name, value, source, params))
    }
}

impl Default for MeasurementBuilder {
    /// Uses [`ProcessEnvironment::default`] and the system clock.
    fn default() -> Self {
        Self::new(ProcessEnvironment::default(), SystemClock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, FixedClock, StaticEnvironment};

    fn builder() -> MeasurementBuilder {
        MeasurementBuilder::new(StaticEnvironment::new("prod"), FixedClock(1_700_000_000))
    }

    #[test]
    fn test_defaults_applied() {
        let m = builder().measurement("cpu.load", 0.42, None, Params::new());
        assert_eq!(m.name, "cpu.load");
        assert_eq!(m.value, 0.42);
        assert_eq!(m.source, "prod");
        assert_eq!(m.measure_time, 1_700_000_000);
        assert!(m.extra.is_empty());
    }

    #[test]
    fn test_empty_source_uses_environment() {
        let m = builder().measurement("cpu.load", 1.0, Some(""), Params::new());
        assert_eq!(m.source, "prod");
    }

    #[test]
    fn test_explicit_source_kept() {
        let m = builder().measurement("cpu.load", 1.0, Some("web-1"), Params::new());
        assert_eq!(m.source, "web-1");
    }

    #[test]
    fn test_identity_fields_win_over_params() {
        let mut params = Params::new();
        params.insert("name".to_string(), Field::from("forged"));
        params.insert("value".to_string(), Field::Float(99.0));
        params.insert("source".to_string(), Field::from("elsewhere"));

        let m = builder().measurement("cpu.load", 0.42, None, params);
        assert_eq!(m.name, "cpu.load");
        assert_eq!(m.value, 0.42);
        assert_eq!(m.source, "prod");
        assert!(m.extra.is_empty());
    }

    #[test]
    fn test_params_override_measure_time() {
        let mut params = Params::new();
        params.insert("measure_time".to_string(), Field::Int(1_600_000_000));
        params.insert("period".to_string(), Field::Int(60));

        let m = builder().measurement("cpu.load", 0.42, None, params);
        assert_eq!(m.measure_time, 1_600_000_000);
        assert_eq!(m.extra.len(), 1);
        assert_eq!(m.extra.get("period"), Some(&Field::Int(60)));
    }

    #[test]
    fn test_unusable_measure_time_param_ignored() {
        let mut params = Params::new();
        params.insert("measure_time".to_string(), Field::from("soon"));

        let m = builder().measurement("cpu.load", 0.42, None, params);
        assert_eq!(m.measure_time, 1_700_000_000);
        assert!(m.extra.is_empty());
    }

    #[test]
    fn test_gauge_wraps_single_measurement() {
        let payload = builder().gauge("cpu.load", 0.42, None, Params::new());
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.gauges[0].name, "cpu.load");
    }

    #[test]
    fn test_default_builder_uses_wall_clock() {
        let before = SystemClock.now();
        let m = MeasurementBuilder::default().measurement("cpu.load", 1.0, None, Params::new());
        assert!(m.measure_time >= before);
        assert!(m.measure_time - before <= 1);
        assert!(!m.source.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_gauge_payload_json() {
        let payload = builder().gauge("cpu.load", 0.42, None, Params::new());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "gauges": [{
                    "measure_time": 1_700_000_000u64,
                    "source": "prod",
                    "name": "cpu.load",
                    "value": 0.42
                }]
            })
        );
    }
}
