//! Message transport backend.

use crate::auth::resolve_token;
use crate::domain::config::ClientConfig;
use crate::domain::error::{ClientError, ClientResult};
use crate::domain::types::{Attribute, Protocol, SubscriptionId};
use crate::engine::{CorrelationEngine, EngineOptions};
use crate::ports::backend::{Subscription, VssBackend};
use crate::ws::connect::open_socket;
use crate::ws::protocol::{
    extract_datapoint, extract_metadata, extract_subscription_id, VssRequest,
};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info};

/// [`VssBackend`] over the JSON WebSocket protocol
pub struct WsBackend {
    engine: CorrelationEngine,
    configured_token: String,
}

impl WsBackend {
    /// Dial the server and start the engine.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let socket = open_socket(config).await?;
        info!("WebSocket connected");
        Ok(Self::with_socket(socket, config))
    }

    /// Start the engine on an already open socket.
    pub fn with_socket<S>(socket: WebSocketStream<S>, config: &ClientConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let options = EngineOptions {
            request_timeout: config.request_timeout(),
            subscription_buffer: config.subscription_buffer,
        };
        Self {
            engine: CorrelationEngine::start(socket, options),
            configured_token: config.token_or_tokenfile.clone(),
        }
    }

    pub fn engine(&self) -> &CorrelationEngine {
        &self.engine
    }
}

#[async_trait]
impl VssBackend for WsBackend {
    async fn authorize(&self, token_or_tokenfile: Option<&str>) -> ClientResult<()> {
        let token = resolve_token(&self.configured_token, token_or_tokenfile)?;
        match self.engine.request(&VssRequest::authorize(&token)).await {
            Ok(_) => {
                info!("Connection authorized");
                Ok(())
            }
            Err(ClientError::Server(e)) => Err(ClientError::Authorization(e.to_string())),
            Err(e) => Err(e),
        }
    }

    async fn get_value(&self, path: &str, attribute: Attribute) -> ClientResult<Vec<String>> {
        if attribute == Attribute::Metadata {
            return self.get_metadata(path).await;
        }
        let reply = self.engine.request(&VssRequest::get(path, attribute)).await?;
        Ok(extract_datapoint(&reply, attribute).into_iter().collect())
    }

    async fn set_value(&self, path: &str, value: &str, attribute: Attribute) -> ClientResult<()> {
        let request = VssRequest::set(path, value, attribute)?;
        self.engine.request(&request).await?;
        Ok(())
    }

    async fn get_metadata(&self, path: &str) -> ClientResult<Vec<String>> {
        let reply = self.engine.request(&VssRequest::get_metadata(path)).await?;
        Ok(extract_metadata(&reply).into_iter().collect())
    }

    async fn subscribe(&self, path: &str, attribute: Attribute) -> ClientResult<Subscription> {
        let reply = self
            .engine
            .request(&VssRequest::subscribe(path, attribute))
            .await?;
        let id = extract_subscription_id(&reply)
            .ok_or_else(|| ClientError::Protocol("subscribe reply without subscriptionId".into()))?;

        let updates = self.engine.subscriptions().register(id.clone());
        info!(subscription_id = %id, path = path, attribute = %attribute, "Subscribed");
        Ok(Subscription { id, updates })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> ClientResult<()> {
        // Detached up front so concurrent callers see it as already inactive
        let Some(tx) = self.engine.subscriptions().take(id) else {
            debug!(subscription_id = %id, "Unsubscribe for inactive subscription");
            return Ok(());
        };

        match self.engine.request(&VssRequest::unsubscribe(id)).await {
            Ok(_) => {
                drop(tx);
                info!(subscription_id = %id, "Unsubscribed");
                Ok(())
            }
            Err(e) => {
                if !self.engine.is_closed() {
                    self.engine.subscriptions().restore(id.clone(), tx);
                }
                Err(e)
            }
        }
    }

    async fn close(&self) {
        self.engine.close().await;
    }

    fn protocol(&self) -> Protocol {
        Protocol::Ws
    }
}
