//! WebSocket connection setup.

use crate::domain::config::ClientConfig;
use crate::domain::error::{ClientError, ClientResult};
use std::path::Path;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};

pub type VssSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the socket described by `config`.
///
/// Secure connections present `Client.pem`/`Client.key` and trust `CA.pem`
/// from the certificates directory. The server certificate is not checked
/// against the host name.
pub async fn open_socket(config: &ClientConfig) -> ClientResult<VssSocket> {
    let url = config.ws_url();
    info!(url = %url, "Connecting WebSocket");

    let (socket, response) = if config.insecure {
        connect_async(url.as_str()).await?
    } else {
        let connector = tls_connector(config)?;
        connect_async_tls_with_config(
            url.as_str(),
            None,
            false,
            Some(Connector::NativeTls(connector)),
        )
        .await?
    };

    debug!(status = %response.status(), "WebSocket handshake complete");
    Ok(socket)
}

fn tls_connector(config: &ClientConfig) -> ClientResult<native_tls::TlsConnector> {
    let cert = read_pem(&config.client_cert_path())?;
    let key = read_pem(&config.client_key_path())?;
    let ca = read_pem(&config.ca_cert_path())?;

    let identity = native_tls::Identity::from_pkcs8(&cert, &key)
        .map_err(|e| ClientError::Connection(format!("invalid client identity: {}", e)))?;
    let ca = native_tls::Certificate::from_pem(&ca)
        .map_err(|e| ClientError::Connection(format!("invalid CA certificate: {}", e)))?;

    native_tls::TlsConnector::builder()
        .identity(identity)
        .add_root_certificate(ca)
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| ClientError::Connection(format!("TLS setup failed: {}", e)))
}

pub(crate) fn read_pem(path: &Path) -> ClientResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| ClientError::Connection(format!("cannot read {}: {}", path.display(), e)))
}
