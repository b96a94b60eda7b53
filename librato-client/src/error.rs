//! Error types for the transport.

use thiserror::Error;

/// Errors surfaced by synchronous requests and transport construction.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The metrics API request could not be sent or its body not read.
    #[error("metrics API request failed: {0}")]
    Http(String),

    /// The metrics API answered with a body that is not JSON.
    #[error("metrics API response is not JSON: {0}")]
    Parse(String),

    /// The metrics API rejected the configured credentials (401).
    #[error("metrics API rejected credentials: {0}")]
    Auth(String),

    /// No connection to the metrics host could be opened.
    #[error("cannot reach metrics host: {0}")]
    Connection(String),

    /// No answer from the metrics API within the configured timeout.
    #[error("metrics API request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("metrics API returned status {status}")]
    Status {
        status: u16,
        body: serde_json::Value,
    },

    /// TLS setup failed.
    #[error("TLS configuration failed: {0}")]
    Tls(String),

    /// Configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match err {
            e if e.is_timeout() => TransportError::Timeout,
            e if e.is_connect() => TransportError::Connection(e.to_string()),
            e if e.is_decode() => TransportError::Parse(e.to_string()),
            e => TransportError::Http(e.to_string()),
        }
    }
}

impl From<config::ConfigError> for TransportError {
    fn from(err: config::ConfigError) -> Self {
        TransportError::Config(err.to_string())
    }
}

/// Failure to open a raw socket for a fire-and-forget send.
///
/// Never returned from [`crate::HttpTransport::post`]; it is logged and
/// reported as a `false` dispatch outcome.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connect failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("connect timed out")]
    TimedOut,

    #[error("invalid host '{0}'")]
    InvalidHost(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            TransportError::Timeout.to_string(),
            "metrics API request timed out"
        );
        assert_eq!(
            TransportError::Status {
                status: 400,
                body: serde_json::Value::Null
            }
            .to_string(),
            "metrics API returned status 400"
        );
        assert_eq!(ConnectError::TimedOut.to_string(), "connect timed out");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: TransportError = config::ConfigError::Message("bad timeout".to_string()).into();
        assert!(matches!(err, TransportError::Config(msg) if msg == "bad timeout"));
    }
}
