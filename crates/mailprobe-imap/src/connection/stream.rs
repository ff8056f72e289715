//! TLS stream setup for IMAP connections.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::Config;
use crate::{Error, Result};

/// Implicit-TLS stream to an IMAP server.
pub type ImapStream = TlsStream<TcpStream>;

/// Creates a TLS connector with default root certificates.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Connects to a server with TLS from the start.
///
/// The server certificate is verified against `config.host`. TCP connect and
/// TLS handshake together must finish within `config.connect_timeout`.
///
/// # Errors
///
/// Returns [`Error::Timeout`] on deadline expiry, otherwise the DNS, socket or
/// TLS error that stopped the connection.
pub async fn connect_tls(config: &Config) -> Result<ImapStream> {
    let server_name = ServerName::try_from(config.host.clone())?;
    let addr = (config.host.as_str(), config.port);

    let handshake = async {
        let tcp = TcpStream::connect(addr).await?;
        tracing::debug!(host = %config.host, port = config.port, "TCP connected");

        let tls = create_tls_connector().connect(server_name, tcp).await?;
        Ok::<_, Error>(tls)
    };

    tokio::time::timeout(config.connect_timeout, handshake)
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout))?
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_server_name() {
        let config = Config::new("not a hostname");
        let err = connect_tls(&config).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDnsName(_)));
    }
}
