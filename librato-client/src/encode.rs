//! Body and query-string encoding for the metrics API.

use std::collections::BTreeSet;

use librato_types::Payload;
use url::form_urlencoded;

/// Body encoding of a synchronous post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    /// `application/json`
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`, bracketed batch keys
    Form,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Form => "application/x-www-form-urlencoded",
        }
    }
}

/// Encode a payload in the service's bracketed form format.
///
/// `gauges[0][measure_time]=…&gauges[0][source]=…&…&gauges[0][value]=…`
pub fn form_body(payload: &Payload) -> String {
    let mut form = form_urlencoded::Serializer::new(String::new());
    for (index, gauge) in payload.gauges.iter().enumerate() {
        for (field, value) in gauge.fields() {
            form.append_pair(&format!("gauges[{index}][{field}]"), &value);
        }
    }
    form.finish()
}

/// Filter for listing metrics.
///
/// An empty name and an empty tag set both mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsQuery {
    /// Case-insensitive substring of the metric name.
    pub name: Option<String>,
    pub tags: BTreeSet<String>,
}

impl MetricsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by name substring.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a tag to the filter.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Replace the tag filter.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Query-string pairs; tags are sent as `tags[0]`, `tags[1]`, ...
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.tags.len() + 1);
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            pairs.push(("name".to_string(), name.to_string()));
        }
        for (index, tag) in self.tags.iter().enumerate() {
            pairs.push((format!("tags[{index}]"), tag.clone()));
        }
        pairs
    }
}

impl From<&str> for MetricsQuery {
    /// A bare string is a name filter.
    fn from(name: &str) -> Self {
        MetricsQuery::new().name(name)
    }
}
