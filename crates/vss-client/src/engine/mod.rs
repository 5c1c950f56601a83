//! Correlation engine.
//!
//! Multiplexes concurrent requests and live subscriptions over one socket.
//!
//! ```text
//!   callers ──request()──► outbound queue ──► [pump] ──► socket sink
//!      ▲                                                     │
//!      │ oneshot                                             ▼ server
//!      │                                                     │
//!  PendingRequestTable ◄── reply ──┐                         ▼
//!                                  [dispatcher] ◄──── socket stream
//!  SubscriptionTable  ◄── push ────┘
//!      │ mpsc
//!      ▼
//!  Subscription receivers
//! ```
//!
//! The pump is the only writer and the dispatcher the only reader. Both stop
//! when the socket fails or closes, when `close()` is called, or when the
//! engine is dropped. Stopping the dispatcher ends every subscription
//! receiver; pending callers run into their deadline.

pub mod pending;
pub mod subscriptions;

pub use pending::{PendingRequestTable, PendingStats};
pub use subscriptions::{Delivery, SubscriptionStats, SubscriptionTable, DEFAULT_SUBSCRIPTION_BUFFER};

use crate::domain::error::{ClientError, ClientResult};
use crate::ws::protocol::{classify, extract_update, reply_error, Inbound, VssRequest, WireRequest};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

/// Capacity of the outbound queue feeding the pump
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Engine tuning
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub request_timeout: Duration,
    pub subscription_buffer: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            subscription_buffer: DEFAULT_SUBSCRIPTION_BUFFER,
        }
    }
}

/// Request/reply correlation over one WebSocket.
pub struct CorrelationEngine {
    outbound: mpsc::Sender<Message>,
    pending: Arc<PendingRequestTable>,
    subscriptions: Arc<SubscriptionTable>,
    request_timeout: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl CorrelationEngine {
    /// Split `socket` and spawn the pump and dispatcher.
    ///
    /// Must be called within a tokio runtime.
    pub fn start<S>(socket: WebSocketStream<S>, options: EngineOptions) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = socket.split();
        let (outbound, queue) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pending = Arc::new(PendingRequestTable::new());
        let subscriptions = Arc::new(SubscriptionTable::new(options.subscription_buffer));

        tokio::spawn(pump(sink, queue, shutdown_rx.clone()));
        tokio::spawn(dispatch(
            stream,
            pending.clone(),
            subscriptions.clone(),
            outbound.clone(),
            shutdown_rx,
        ));

        Self {
            outbound,
            pending,
            subscriptions,
            request_timeout: options.request_timeout,
            shutdown_tx,
        }
    }

    /// Send `request` and wait for its reply.
    ///
    /// A reply carrying an `error` member becomes [`ClientError::Server`].
    pub async fn request(&self, request: &VssRequest) -> ClientResult<Value> {
        // A request queued behind the close frame would never be written
        if *self.shutdown_tx.borrow() {
            return Err(ClientError::Closed);
        }
        let action = request.action.as_str();
        let (correlation_id, rx) = self.pending.register(action);

        let wire = WireRequest {
            request_id: correlation_id,
            body: request,
        };
        let text = match serde_json::to_string(&wire) {
            Ok(text) => text,
            Err(e) => {
                self.pending.cancel(&correlation_id);
                return Err(e.into());
            }
        };

        if self.outbound.send(Message::Text(text.into())).await.is_err() {
            self.pending.cancel(&correlation_id);
            return Err(ClientError::Closed);
        }

        let reply = self
            .pending
            .wait(correlation_id, rx, self.request_timeout, action)
            .await?;

        match reply_error(&reply) {
            Some(error) => Err(ClientError::Server(error)),
            None => Ok(reply),
        }
    }

    pub fn pending(&self) -> &PendingRequestTable {
        &self.pending
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send a close frame and stop both loops.
    ///
    /// Idempotent.
    pub async fn close(&self) {
        if *self.shutdown_tx.borrow() {
            return;
        }
        // Pump checks the queue before the shutdown flag, so the frame goes out first
        let _ = self.outbound.try_send(Message::Close(None));
        let _ = self.shutdown_tx.send(true);
        self.subscriptions.clear();
        info!("Connection closed");
    }

    /// Whether the pump has stopped or `close()` was called
    pub fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow() || self.outbound.is_closed()
    }
}

impl Drop for CorrelationEngine {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Single writer: drains the outbound queue into the socket.
async fn pump<S>(
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut queue: mpsc::Receiver<Message>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let message = tokio::select! {
            biased;
            message = queue.recv() => match message {
                Some(message) => message,
                None => break,
            },
            _ = shutdown.changed() => break,
        };

        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            warn!(error = %e, "Outbound write failed, stopping pump");
            break;
        }
        if closing {
            break;
        }
    }
    debug!("Outbound pump stopped");
}

/// Single reader: routes replies and pushes.
async fn dispatch<S>(
    mut stream: SplitStream<WebSocketStream<S>>,
    pending: Arc<PendingRequestTable>,
    subscriptions: Arc<SubscriptionTable>,
    outbound: mpsc::Sender<Message>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => route(text.as_str(), &pending, &subscriptions),
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => route(text, &pending, &subscriptions),
                Err(_) => debug!(len = bytes.len(), "Dropping non-UTF-8 binary message"),
            },
            Some(Ok(Message::Ping(payload))) => {
                let _ = outbound.try_send(Message::Pong(payload));
            }
            Some(Ok(Message::Close(frame))) => {
                info!(frame = ?frame, "Server closed connection");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "Connection error, stopping dispatcher");
                break;
            }
            None => {
                info!("Connection stream ended");
                break;
            }
        }
    }

    let dropped = subscriptions.clear();
    debug!(subscriptions = dropped, "Inbound dispatcher stopped");
}

/// Route one inbound document to its caller or listener.
fn route(text: &str, pending: &PendingRequestTable, subscriptions: &SubscriptionTable) {
    let message: Value = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "Dropping unparseable message");
            return;
        }
    };

    match classify(&message) {
        Inbound::Reply(correlation_id) => {
            pending.complete(&correlation_id, message);
        }
        Inbound::Push(subscription_id) => {
            subscriptions.deliver(&subscription_id, extract_update(&message));
        }
        Inbound::Unknown => debug!("Dropping unclassifiable message"),
    }
}
