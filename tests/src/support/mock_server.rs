//! # In-Process VSS Server
//!
//! Answers the JSON WebSocket protocol from an in-memory signal store, the
//! way a KUKSA.val server would. Tests drive it through [`MockHandle`]:
//! seed signals, inject pushes or raw frames, make paths go silent, and
//! inspect every request the client sent.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use vss_client::{ClientConfig, WsBackend};

/// Token the mock accepts in `authorize` requests
pub const VALID_TOKEN: &str = "mock-token";

/// Size of the in-memory pipe between client and server
const DUPLEX_BUFFER: usize = 64 * 1024;

/// Commands sent from a test to the running server
#[derive(Debug)]
enum ServerCommand {
    Push { subscription_id: String, data: Value },
    Raw(String),
    Close,
}

#[derive(Debug, Clone)]
struct ActiveSubscription {
    path: String,
    attribute: String,
}

#[derive(Debug, Default)]
struct ServerState {
    /// Keyed by `(path, attribute)`
    signals: HashMap<(String, String), Value>,
    metadata: HashMap<String, Value>,
    subscriptions: HashMap<String, ActiveSubscription>,
    silent_paths: HashSet<String>,
    rejected_actions: HashSet<String>,
    authorized: bool,
    next_subscription: u64,
    requests: Vec<Value>,
}

/// Test-side control over a running mock server
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<ServerState>>,
    commands: mpsc::UnboundedSender<ServerCommand>,
}

impl MockHandle {
    /// Seed a signal attribute.
    pub fn set_signal(&self, path: &str, attribute: &str, value: Value) {
        self.state
            .lock()
            .signals
            .insert((path.to_string(), attribute.to_string()), value);
    }

    pub fn signal(&self, path: &str, attribute: &str) -> Option<Value> {
        self.state
            .lock()
            .signals
            .get(&(path.to_string(), attribute.to_string()))
            .cloned()
    }

    /// Seed the metadata object returned for `path`.
    pub fn set_metadata(&self, path: &str, metadata: Value) {
        self.state.lock().metadata.insert(path.to_string(), metadata);
    }

    /// Stop answering requests that name `path`.
    pub fn silence(&self, path: &str) {
        self.state.lock().silent_paths.insert(path.to_string());
    }

    /// Answer every request for `action` with a server error.
    pub fn reject(&self, action: &str) {
        self.state.lock().rejected_actions.insert(action.to_string());
    }

    /// Undo [`reject`](Self::reject).
    pub fn accept(&self, action: &str) {
        self.state.lock().rejected_actions.remove(action);
    }

    pub fn is_authorized(&self) -> bool {
        self.state.lock().authorized
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.state.lock().requests.clone()
    }

    /// Requests received for one action.
    pub fn requests_for(&self, action: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r["action"] == action)
            .collect()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Send a push frame for `subscription_id` carrying `data`.
    pub fn push(&self, subscription_id: &str, data: Value) {
        let _ = self.commands.send(ServerCommand::Push {
            subscription_id: subscription_id.to_string(),
            data,
        });
    }

    /// Send an arbitrary text frame.
    pub fn send_raw(&self, text: &str) {
        let _ = self.commands.send(ServerCommand::Raw(text.to_string()));
    }

    /// Send a close frame and stop serving.
    pub fn close(&self) {
        let _ = self.commands.send(ServerCommand::Close);
    }
}

/// Connect a [`WsBackend`] to a fresh mock server over an in-memory pipe.
pub async fn start_with_config(config: &ClientConfig) -> (WsBackend, MockHandle) {
    let (client_io, server_io) = tokio::io::duplex(DUPLEX_BUFFER);
    let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
    let server: WebSocketStream<DuplexStream> =
        WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;

    let handle = spawn_server(server);
    (WsBackend::with_socket(client, config), handle)
}

/// [`start_with_config`] with a short request timeout.
pub async fn start() -> (WsBackend, MockHandle) {
    start_with_config(&test_config()).await
}

/// Bind a TCP listener on an ephemeral port and serve the first connection.
///
/// Returns a config pointing at the listener, for tests that go through
/// [`vss_client::connect`].
pub async fn start_tcp() -> (ClientConfig, MockHandle) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let port = listener.local_addr().expect("local addr").port();

    let state = Arc::new(Mutex::new(ServerState::default()));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = MockHandle {
        state: state.clone(),
        commands: tx,
    };

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        if let Ok(socket) = tokio_tungstenite::accept_async(stream).await {
            serve(socket, state, rx).await;
        }
    });

    let config = ClientConfig {
        server_address: "127.0.0.1".into(),
        server_port: port,
        insecure: true,
        ..test_config()
    };
    (config, handle)
}

/// Client config used by the mock helpers
pub fn test_config() -> ClientConfig {
    ClientConfig {
        insecure: true,
        token_or_tokenfile: VALID_TOKEN.into(),
        request_timeout_ms: 300,
        ..ClientConfig::default()
    }
}

fn spawn_server<S>(socket: WebSocketStream<S>) -> MockHandle
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let state = Arc::new(Mutex::new(ServerState::default()));
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(serve(socket, state.clone(), rx));
    MockHandle {
        state,
        commands: tx,
    }
}

async fn serve<S>(
    mut socket: WebSocketStream<S>,
    state: Arc<Mutex<ServerState>>,
    mut commands: mpsc::UnboundedReceiver<ServerCommand>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    loop {
        tokio::select! {
            frame = socket.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().to_string(),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Binary(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
                    _ => break,
                };
                let Ok(request) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                let outgoing = handle_request(&state, request);
                for frame in outgoing {
                    if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                        return;
                    }
                }
            }
            command = commands.recv() => match command {
                Some(ServerCommand::Push { subscription_id, data }) => {
                    let frame = push_frame(&subscription_id, data);
                    if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                        return;
                    }
                }
                Some(ServerCommand::Raw(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        return;
                    }
                }
                Some(ServerCommand::Close) | None => {
                    let _ = socket.close(None).await;
                    return;
                }
            }
        }
    }
}

fn push_frame(subscription_id: &str, data: Value) -> Value {
    json!({
        "action": "subscription",
        "subscriptionId": subscription_id,
        "data": data,
        "ts": "2026-01-01T00:00:00.000Z",
    })
}

fn error_reply(request: &Value, number: u16, reason: &str, message: &str) -> Value {
    json!({
        "action": request["action"],
        "requestId": request["requestId"],
        "error": {"number": number, "reason": reason, "message": message},
        "ts": "2026-01-01T00:00:00.000Z",
    })
}

/// Frames to send in answer to `request`: the reply, then any pushes it caused.
fn handle_request(state: &Mutex<ServerState>, request: Value) -> Vec<Value> {
    let mut state = state.lock();
    state.requests.push(request.clone());

    let path = request["path"].as_str().unwrap_or_default().to_string();
    if state.silent_paths.contains(&path) {
        return Vec::new();
    }

    let request_id = request["requestId"].clone();
    let action = request["action"].as_str().unwrap_or_default();
    if state.rejected_actions.contains(action) {
        return vec![error_reply(&request, 500, "Internal Server Error", "Rejected")];
    }
    match action {
        "authorize" => {
            if request["tokens"] == VALID_TOKEN {
                state.authorized = true;
                vec![json!({"action": "authorize", "requestId": request_id, "TTL": 3600})]
            } else {
                vec![error_reply(&request, 401, "Invalid Token", "Token is not valid")]
            }
        }
        "get" => {
            let attribute = request["attribute"].as_str().unwrap_or("value").to_string();
            match state.signals.get(&(path.clone(), attribute.clone())) {
                Some(value) => vec![json!({
                    "action": "get",
                    "requestId": request_id,
                    "data": {"path": path, "dp": {attribute: value, "ts": "2026-01-01T00:00:00.000Z"}},
                })],
                None => vec![error_reply(&request, 404, "Path not found", "I can not find this path")],
            }
        }
        "set" => {
            let (attribute, value) = match (request.get("value"), request.get("targetValue")) {
                (Some(value), _) => ("value", value.clone()),
                (None, Some(value)) => ("targetValue", value.clone()),
                (None, None) => {
                    return vec![error_reply(&request, 400, "Bad Request", "No value")];
                }
            };
            state
                .signals
                .insert((path.clone(), attribute.to_string()), value.clone());

            let mut frames = vec![json!({"action": "set", "requestId": request_id})];
            for (id, sub) in &state.subscriptions {
                if sub.path == path && sub.attribute == attribute {
                    frames.push(push_frame(
                        id,
                        json!({"path": path, "dp": {attribute: value}}),
                    ));
                }
            }
            frames
        }
        "getMetaData" => match state.metadata.get(&path) {
            Some(metadata) => vec![json!({
                "action": "getMetaData",
                "requestId": request_id,
                "metadata": metadata,
            })],
            None => vec![error_reply(&request, 404, "Path not found", "I can not find this path")],
        },
        "subscribe" => {
            state.next_subscription += 1;
            let id = format!("sub-{}", state.next_subscription);
            let attribute = request["attribute"].as_str().unwrap_or("value").to_string();
            state
                .subscriptions
                .insert(id.clone(), ActiveSubscription { path, attribute });
            vec![json!({"action": "subscribe", "requestId": request_id, "subscriptionId": id})]
        }
        "unsubscribe" => {
            let id = request["subscriptionId"].as_str().unwrap_or_default();
            if state.subscriptions.remove(id).is_some() {
                vec![json!({"action": "unsubscribe", "requestId": request_id, "subscriptionId": id})]
            } else {
                vec![error_reply(&request, 404, "Unknown subscription", "No such subscription")]
            }
        }
        _ => vec![error_reply(&request, 400, "Bad Request", "Unknown action")],
    }
}
