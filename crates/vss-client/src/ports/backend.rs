//! Transport-neutral operation contract.

use crate::domain::config::ClientConfig;
use crate::domain::error::ClientResult;
use crate::domain::types::{Attribute, Protocol, SignalUpdate, SubscriptionId};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

/// A live subscription.
///
/// `updates` ends after unsubscribe or when the connection goes away.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub updates: mpsc::Receiver<SignalUpdate>,
}

/// Operations offered by both transports
#[async_trait]
pub trait VssBackend: Send + Sync {
    /// Authorize the connection.
    ///
    /// The configured token wins over `token_or_tokenfile`; with neither,
    /// this fails with an authorization error.
    async fn authorize(&self, token_or_tokenfile: Option<&str>) -> ClientResult<()>;

    /// Read `attribute` of `path`, one string per returned entry
    async fn get_value(&self, path: &str, attribute: Attribute) -> ClientResult<Vec<String>>;

    /// Write `value` to `attribute` of `path`
    async fn set_value(&self, path: &str, value: &str, attribute: Attribute) -> ClientResult<()>;

    /// Metadata of `path` as JSON strings
    async fn get_metadata(&self, path: &str) -> ClientResult<Vec<String>>;

    async fn subscribe(&self, path: &str, attribute: Attribute) -> ClientResult<Subscription>;

    /// Stop a subscription. Unknown IDs are not an error.
    async fn unsubscribe(&self, id: &SubscriptionId) -> ClientResult<()>;

    async fn close(&self);

    fn protocol(&self) -> Protocol;
}

/// Connect with the transport selected by `config.protocol`.
pub async fn connect(config: &ClientConfig) -> ClientResult<Box<dyn VssBackend>> {
    info!(protocol = %config.protocol, "Connecting to {}:{}", config.server_address, config.server_port);
    let backend: Box<dyn VssBackend> = match config.protocol {
        Protocol::Ws => Box::new(crate::ws::WsBackend::connect(config).await?),
        Protocol::Grpc => Box::new(crate::rpc::GrpcBackend::connect(config).await?),
    };
    Ok(backend)
}
