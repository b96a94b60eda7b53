//! Transport configuration and credentials.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use config::{Config, Environment};
use serde::Deserialize;

use crate::TransportError;

/// Hostname of the metrics API.
pub const DEFAULT_HOST: &str = "metrics-api.librato.com";

/// Two seconds keeps a slow endpoint from stalling the instrumented application.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Prefix of the variables read by [`TransportConfig::from_env`].
pub const ENV_PREFIX: &str = "LIBRATO";

/// Account credentials for HTTP Basic authentication.
///
/// Not validated locally; the service rejects bad credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Value of the `Authorization` header: `Basic base64(username:token)`.
    pub fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.username, self.token))
        )
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Configuration read by every request a transport makes.
///
/// A transport owns its configuration; to change it, build a new transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Remote host, optionally with an explicit `:port`.
    pub host: String,
    /// Bound on the synchronous request, or on the connect step when firing and forgetting.
    pub timeout: Duration,
    /// Whether `post` fires and forgets unless told otherwise.
    pub async_default: bool,
    /// Use TLS (HTTPS / port 443). Turning this off is meant for local testing.
    pub secure: bool,
    pub credentials: Credentials,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            async_default: true,
            secure: true,
            credentials: Credentials::default(),
        }
    }
}

impl TransportConfig {
    /// Create a new builder for TransportConfig.
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }

    /// Load configuration from `LIBRATO_*` process variables over the defaults.
    ///
    /// Recognised variables: `LIBRATO_HOST`, `LIBRATO_TIMEOUT` (seconds),
    /// `LIBRATO_USERNAME`, `LIBRATO_TOKEN`, `LIBRATO_ASYNC`, `LIBRATO_SECURE`.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(source: Environment) -> Result<Self, TransportError> {
        let settings: EnvSettings = Config::builder()
            .add_source(source.try_parsing(true))
            .build()?
            .try_deserialize()?;

        let defaults = Self::default();
        Ok(Self {
            host: settings.host.unwrap_or(defaults.host),
            timeout: settings
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            async_default: settings.async_default.unwrap_or(defaults.async_default),
            secure: settings.secure.unwrap_or(defaults.secure),
            credentials: Credentials {
                username: settings.username.unwrap_or_default(),
                token: settings.token.unwrap_or_default(),
            },
        })
    }

    /// Host name and port used by the raw socket.
    ///
    /// Without an explicit port, 443 is used (80 when `secure` is off).
    pub fn authority(&self) -> (String, u16) {
        let default_port = if self.secure { 443 } else { 80 };
        match self.host.rsplit_once(':') {
            Some((name, port)) if !name.contains(':') => match port.parse() {
                Ok(port) => (name.to_string(), port),
                Err(_) => (self.host.clone(), default_port),
            },
            _ => (self.host.clone(), default_port),
        }
    }

    /// Base URL for the managed HTTP client, e.g. `https://metrics-api.librato.com`.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }
}

#[derive(Debug, Default, Deserialize)]
struct EnvSettings {
    host: Option<String>,
    timeout: Option<u64>,
    username: Option<String>,
    token: Option<String>,
    #[serde(rename = "async")]
    async_default: Option<bool>,
    secure: Option<bool>,
}

/// Builder for TransportConfig.
#[derive(Debug, Default)]
pub struct TransportConfigBuilder {
    host: Option<String>,
    timeout: Option<Duration>,
    async_default: Option<bool>,
    secure: Option<bool>,
    credentials: Option<Credentials>,
}

impl TransportConfigBuilder {
    /// Set the remote host (default: "metrics-api.librato.com").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the request timeout (default: 2 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the username and token for authentication.
    pub fn credentials(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, token));
        self
    }

    /// Set whether posts fire and forget by default (default: true).
    pub fn async_default(mut self, enabled: bool) -> Self {
        self.async_default = Some(enabled);
        self
    }

    /// Set whether to use TLS (default: true).
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Build the TransportConfig.
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            host: self.host.unwrap_or(defaults.host),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            async_default: self.async_default.unwrap_or(defaults.async_default),
            secure: self.secure.unwrap_or(defaults.secure),
            credentials: self.credentials.unwrap_or(defaults.credentials),
        }
    }
}
