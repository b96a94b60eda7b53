//! Measurement records and the batch payload submitted to the service.

use std::collections::BTreeMap;
use std::fmt;

/// Additional fields merged into a measurement, keyed by field name.
pub type Params = BTreeMap<String, Field>;

/// Field names that belong to the typed part of a [`Measurement`].
///
/// Extra params using one of these keys never reach the wire as extras.
pub const RESERVED_FIELDS: [&str; 4] = ["measure_time", "source", "name", "value"];

/// A scalar value carried by an extra param.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Field {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Field {
    /// Interpret the field as a Unix timestamp in seconds.
    ///
    /// Negative numbers and text that does not parse as a number yield `None`.
    pub fn as_timestamp(&self) -> Option<u64> {
        match self {
            Field::Int(v) => u64::try_from(*v).ok(),
            Field::Float(v) if v.is_finite() && *v >= 0.0 => Some(v.trunc() as u64),
            Field::Text(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Form encoding represents booleans as 1/0.
            Field::Bool(true) => f.write_str("1"),
            Field::Bool(false) => f.write_str("0"),
            Field::Int(v) => write!(f, "{v}"),
            Field::Float(v) => write!(f, "{v}"),
            Field::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Field {
    fn from(v: bool) -> Self {
        Field::Bool(v)
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v.into())
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Int(v)
    }
}

impl From<u32> for Field {
    fn from(v: u32) -> Self {
        Field::Int(v.into())
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Float(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::Text(v.to_string())
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::Text(v)
    }
}

/// A single gauge reading.
///
/// Built fresh for every submission by [`crate::MeasurementBuilder`]; the
/// remote service is the only place it is stored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    /// Unix timestamp in seconds when the value was measured.
    pub measure_time: u64,

    /// Origin of the measurement, usually the deployment environment.
    pub source: String,

    /// Extra fields forwarded verbatim (e.g. `period`).
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub extra: Params,

    /// Metric name.
    pub name: String,

    /// Measured value.
    pub value: f64,
}

impl Measurement {
    /// Flatten the record into `(field, value)` pairs in wire order.
    ///
    /// Order is `measure_time`, `source`, extras sorted by key, `name`, `value`.
    pub fn fields(&self) -> Vec<(&str, String)> {
        let mut fields = Vec::with_capacity(self.extra.len() + 4);
        fields.push(("measure_time", self.measure_time.to_string()));
        fields.push(("source", self.source.clone()));
        for (key, value) in &self.extra {
            fields.push((key.as_str(), value.to_string()));
        }
        fields.push(("name", self.name.clone()));
        fields.push(("value", self.value.to_string()));
        fields
    }
}

/// The batch body accepted by `POST /v1/metrics`.
///
/// Always a sequence of gauges, even when only one measurement is sent.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payload {
    pub gauges: Vec<Measurement>,
}

impl Payload {
    /// Wrap a single measurement.
    pub fn single(measurement: Measurement) -> Self {
        Self {
            gauges: vec![measurement],
        }
    }

    /// Check if the payload carries no gauges.
    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Number of gauges in the payload.
    pub fn len(&self) -> usize {
        self.gauges.len()
    }
}

impl From<Measurement> for Payload {
    fn from(measurement: Measurement) -> Self {
        Self::single(measurement)
    }
}

impl FromIterator<Measurement> for Payload {
    fn from_iter<I: IntoIterator<Item = Measurement>>(iter: I) -> Self {
        Self {
            gauges: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Measurement {
        let mut extra = Params::new();
        extra.insert("period".to_string(), Field::Int(60));
        extra.insert("display".to_string(), Field::Bool(true));
        Measurement {
            measure_time: 1_700_000_000,
            source: "prod".to_string(),
            extra,
            name: "cpu.load".to_string(),
            value: 0.42,
        }
    }

    #[test]
    fn test_fields_order() {
        let m = sample();
        let fields = m.fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["measure_time", "source", "display", "period", "name", "value"]
        );
        assert_eq!(fields[2].1, "1");
        assert_eq!(fields[5].1, "0.42");
    }

    #[test]
    fn test_field_timestamp() {
        assert_eq!(Field::Int(1_700_000_000).as_timestamp(), Some(1_700_000_000));
        assert_eq!(Field::Float(1_700_000_000.9).as_timestamp(), Some(1_700_000_000));
        assert_eq!(Field::from("1700000000").as_timestamp(), Some(1_700_000_000));
        assert_eq!(Field::Int(-1).as_timestamp(), None);
        assert_eq!(Field::from("yesterday").as_timestamp(), None);
        assert_eq!(Field::Bool(true).as_timestamp(), None);
    }

    #[test]
    fn test_payload_collect() {
        let payload: Payload = vec![sample(), sample()].into_iter().collect();
        assert_eq!(payload.len(), 2);
        assert!(!payload.is_empty());
        assert!(Payload::default().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_flattens_extras() {
        let json = serde_json::to_value(Payload::single(sample())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "gauges": [{
                    "measure_time": 1_700_000_000u64,
                    "source": "prod",
                    "display": true,
                    "period": 60,
                    "name": "cpu.load",
                    "value": 0.42
                }]
            })
        );
    }
}
