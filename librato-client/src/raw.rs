//! Minimal HTTP/1.1 request serialization for the raw socket path.

use reqwest::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use reqwest::Method;

/// A request written straight to a socket, without a response being read.
///
/// Headers are emitted in insertion order with canonical casing.
///
/// # Example
///
/// ```rust
/// use librato_client::RawRequest;
/// use reqwest::header::{HeaderValue, HOST};
/// use reqwest::Method;
///
/// let request = RawRequest::new(Method::POST, "/v1/metrics")
///     .header(HOST, HeaderValue::from_static("example.org"))
///     .body(b"a=1".to_vec());
///
/// let bytes = request.to_bytes();
/// assert!(bytes.starts_with(b"POST /v1/metrics HTTP/1.1\r\nHost: example.org\r\n"));
/// assert!(bytes.ends_with(b"Content-Length: 3\r\n\r\na=1"));
/// ```
#[derive(Debug, Clone)]
pub struct RawRequest {
    method: Method,
    path: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Vec<u8>,
}

impl RawRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Append a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Set the body and append a matching `Content-Length` header.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.headers.retain(|(name, _)| name != CONTENT_LENGTH);
        self.headers.push((CONTENT_LENGTH, HeaderValue::from(body.len())));
        self.body = body;
        self
    }

    /// Look up the first value of a header.
    pub fn header_value(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Serialize request line, headers, blank line and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(self.method.as_str().as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.path.as_bytes());
        out.extend_from_slice(b" HTTP/1.1\r\n");
        for (name, value) in &self.headers {
            out.extend_from_slice(canonical_name(name).as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}

// "content-type" -> "Content-Type"
fn canonical_name(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT, CONNECTION, CONTENT_TYPE, HOST};

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name(&CONTENT_TYPE), "Content-Type");
        assert_eq!(canonical_name(&HOST), "Host");
        assert_eq!(canonical_name(&HeaderName::from_static("x-api-key")), "X-Api-Key");
    }

    #[test]
    fn test_to_bytes() {
        let request = RawRequest::new(Method::POST, "/v1/metrics")
            .header(HOST, HeaderValue::from_static("metrics-api.librato.com"))
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .body(b"x=1&y=2".to_vec())
            .header(CONNECTION, HeaderValue::from_static("Close"));

        let text = String::from_utf8(request.to_bytes()).unwrap();
        assert_eq!(
            text,
            "POST /v1/metrics HTTP/1.1\r\n\
             Host: metrics-api.librato.com\r\n\
             Accept: */*\r\n\
             Content-Length: 7\r\n\
             Connection: Close\r\n\
             \r\n\
             x=1&y=2"
        );
    }

    #[test]
    fn test_body_replaces_content_length() {
        let request = RawRequest::new(Method::POST, "/")
            .body(b"first".to_vec())
            .body(b"second!".to_vec());
        assert_eq!(
            request.header_value(&CONTENT_LENGTH),
            Some(&HeaderValue::from(7usize))
        );
        assert_eq!(request.body_bytes(), b"second!");
    }

    #[test]
    fn test_empty_body() {
        let request = RawRequest::new(Method::POST, "/").body(Vec::new());
        let text = String::from_utf8(request.to_bytes()).unwrap();
        assert!(text.ends_with("Content-Length: 0\r\n\r\n"));
    }
}
