//! Raw socket connectors for fire-and-forget sends.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;

use crate::{ConnectError, TransportError};

/// A connected, write-only stream.
pub type BoxedStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Opens the socket a fire-and-forget request is written to.
///
/// The caller applies the connect timeout.
#[async_trait]
pub trait Connector: Debug + Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> Result<BoxedStream, ConnectError>;
}

/// Plain TCP, for hosts that do not speak TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<BoxedStream, ConnectError> {
        let stream = TcpStream::connect((host, port)).await?;
        let _ = stream.set_nodelay(true);
        Ok(Box::new(stream))
    }
}

/// TLS over TCP, verified against the webpki root store.
///
/// `connect` resolves only after the handshake completes, so bytes written
/// to the returned stream are application data.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    pub fn new() -> Result<Self, TransportError> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(format!("tls protocol version error: {e}")))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        Ok(Self::from(Arc::new(config)))
    }
}

impl From<Arc<rustls::ClientConfig>> for TlsConnector {
    fn from(config: Arc<rustls::ClientConfig>) -> Self {
        Self {
            inner: tokio_rustls::TlsConnector::from(config),
        }
    }
}

impl Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for TlsConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<BoxedStream, ConnectError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| ConnectError::InvalidHost(host.to_string()))?;

        let tcp = TcpStream::connect((host, port)).await?;
        let _ = tcp.set_nodelay(true);

        let stream = self
            .inner
            .connect(server_name, tcp)
            .await
            .map_err(|e| ConnectError::Tls(e.to_string()))?;
        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_connector_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let mut stream = TcpConnector.connect("127.0.0.1", port).await.unwrap();
        stream.write_all(b"ping").await.unwrap();
        stream.shutdown().await.unwrap();
        drop(stream);

        assert_eq!(server.await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn test_tcp_connector_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpConnector.connect("127.0.0.1", port).await;
        assert!(matches!(result, Err(ConnectError::Io(_))));
    }

    #[tokio::test]
    async fn test_tls_connector_rejects_invalid_host() {
        let connector = TlsConnector::new().unwrap();
        let result = connector.connect("not a host", 443).await;
        assert!(matches!(result, Err(ConnectError::InvalidHost(_))));
    }
}
