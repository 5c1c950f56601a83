//! RPC transport backend.

use crate::auth::resolve_token;
use crate::domain::config::ClientConfig;
use crate::domain::error::{ClientError, ClientResult, ServerError};
use crate::domain::types::{Attribute, Protocol, SignalUpdate, SubscriptionId};
use crate::ports::backend::{Subscription, VssBackend};
use crate::rpc::datapoint::{encode_datapoint, entry_to_string};
use crate::rpc::field_view::FieldViewTable;
use crate::rpc::proto::{
    DataEntry, DataEntryError, DataType, EntryRequest, EntryUpdate, Error, GetRequest,
    GetServerInfoRequest, SetRequest, SubscribeEntry, SubscribeRequest, SubscribeResponse,
    ValClient,
};
use crate::ws::connect::read_pem;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Certificate, ClientTlsConfig, Endpoint, Identity};
use tracing::{debug, info, warn};

/// Forwarder tasks by subscription
type Forwarders = Arc<RwLock<HashMap<SubscriptionId, JoinHandle<()>>>>;

/// [`VssBackend`] over the `kuksa.val.v1` gRPC service
pub struct GrpcBackend {
    client: ValClient,
    field_views: FieldViewTable,
    authorization: RwLock<Option<AsciiMetadataValue>>,
    configured_token: String,
    request_timeout: Duration,
    subscription_buffer: usize,
    forwarders: Forwarders,
}

impl GrpcBackend {
    /// Open the channel described by `config`.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let url = config.grpc_url();
        info!(url = %url, "Connecting gRPC channel");

        let mut endpoint = Endpoint::from_shared(url)
            .map_err(|e| ClientError::Config(format!("invalid server address: {}", e)))?
            .connect_timeout(config.request_timeout());

        if !config.insecure {
            let ca = read_pem(&config.ca_cert_path())?;
            let cert = read_pem(&config.client_cert_path())?;
            let key = read_pem(&config.client_key_path())?;

            let mut tls = ClientTlsConfig::new()
                .ca_certificate(Certificate::from_pem(ca))
                .identity(Identity::from_pem(cert, key));
            if let Some(name) = &config.tls_server_name {
                tls = tls.domain_name(name.clone());
            }
            endpoint = endpoint.tls_config(tls)?;
        }

        let channel = endpoint.connect().await?;
        info!("gRPC channel connected");

        Ok(Self {
            client: ValClient::new(channel),
            field_views: FieldViewTable::new(),
            authorization: RwLock::new(None),
            configured_token: config.token_or_tokenfile.clone(),
            request_timeout: config.request_timeout(),
            subscription_buffer: config.subscription_buffer.max(1),
            forwarders: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Server name and version
    pub async fn server_info(&self) -> ClientResult<(String, String)> {
        let mut client = self.client.clone();
        let response = self
            .call("getServerInfo", client.get_server_info(self.request(GetServerInfoRequest {})))
            .await?;
        Ok((response.name, response.version))
    }

    /// Subscriptions whose stream is still being forwarded
    pub fn active_subscriptions(&self) -> usize {
        self.forwarders.read().len()
    }

    /// Wrap `message` with the authorization header, if any
    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        if let Some(token) = self.authorization.read().clone() {
            request.metadata_mut().insert("authorization", token);
        }
        request
    }

    async fn call<T, F>(&self, action: &str, call: F) -> ClientResult<T>
    where
        F: Future<Output = Result<tonic::Response<T>, tonic::Status>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status)) => Err(status.into()),
            Err(_) => {
                warn!(action = action, "Request timed out");
                Err(ClientError::timeout(action))
            }
        }
    }

    async fn get_entries(&self, path: &str, attribute: Attribute) -> ClientResult<Vec<DataEntry>> {
        let field_view = self.field_views.lookup(attribute);
        let request = GetRequest {
            entries: vec![EntryRequest {
                path: path.to_string(),
                view: field_view.view as i32,
                fields: vec![field_view.field as i32],
            }],
        };

        let mut client = self.client.clone();
        let response = self.call("get", client.get(self.request(request))).await?;
        if let Some(error) = response_error(response.error.as_ref(), &response.errors) {
            return Err(ClientError::Server(error));
        }
        Ok(response.entries)
    }
}

#[async_trait]
impl VssBackend for GrpcBackend {
    async fn authorize(&self, token_or_tokenfile: Option<&str>) -> ClientResult<()> {
        let token = resolve_token(&self.configured_token, token_or_tokenfile)?;
        let header = AsciiMetadataValue::try_from(format!("Bearer {}", token))
            .map_err(|e| ClientError::Authorization(format!("malformed token: {}", e)))?;
        *self.authorization.write() = Some(header);
        info!("Bearer token attached to requests");
        Ok(())
    }

    async fn get_value(&self, path: &str, attribute: Attribute) -> ClientResult<Vec<String>> {
        let entries = self.get_entries(path, attribute).await?;
        Ok(entries
            .iter()
            .filter_map(|entry| entry_to_string(entry, attribute))
            .collect())
    }

    async fn set_value(&self, path: &str, value: &str, attribute: Attribute) -> ClientResult<()> {
        if attribute == Attribute::Metadata {
            return Err(ClientError::UnsupportedAttribute(format!(
                "cannot set {}",
                attribute
            )));
        }

        // The datatype decides how the text is encoded
        let data_type = self
            .get_entries(path, Attribute::Metadata)
            .await?
            .iter()
            .filter_map(|entry| entry.metadata.as_ref())
            .map(|metadata| metadata.data_type())
            .last()
            .unwrap_or(DataType::Unspecified);
        let datapoint = encode_datapoint(data_type, value)?;
        debug!(path = path, data_type = data_type.type_name(), "Encoded value");

        let mut entry = DataEntry {
            path: path.to_string(),
            ..Default::default()
        };
        if attribute == Attribute::TargetValue {
            entry.actuator_target = Some(datapoint);
        } else {
            entry.value = Some(datapoint);
        }

        let request = SetRequest {
            updates: vec![EntryUpdate {
                entry: Some(entry),
                fields: vec![self.field_views.lookup(attribute).field as i32],
            }],
        };
        let mut client = self.client.clone();
        let response = self.call("set", client.set(self.request(request))).await?;
        match response_error(response.error.as_ref(), &response.errors) {
            Some(error) => Err(ClientError::Server(error)),
            None => Ok(()),
        }
    }

    async fn get_metadata(&self, path: &str) -> ClientResult<Vec<String>> {
        self.get_value(path, Attribute::Metadata).await
    }

    async fn subscribe(&self, path: &str, attribute: Attribute) -> ClientResult<Subscription> {
        let field_view = self.field_views.lookup(attribute);
        let request = SubscribeRequest {
            entries: vec![SubscribeEntry {
                path: path.to_string(),
                view: field_view.view as i32,
                fields: vec![field_view.field as i32],
            }],
        };

        // Only the stream setup is bounded; the stream itself has no deadline
        let mut client = self.client.clone();
        let stream = self
            .call("subscribe", client.subscribe(self.request(request)))
            .await?;

        let id = SubscriptionId::generate();
        let (tx, updates) = mpsc::channel(self.subscription_buffer);
        {
            // Held across the spawn so the task's own removal runs after the insert
            let mut forwarders = self.forwarders.write();
            let registry = Arc::clone(&self.forwarders);
            let task_id = id.clone();
            let handle = tokio::spawn(async move {
                forward_updates(stream, tx, attribute, &task_id).await;
                registry.write().remove(&task_id);
            });
            forwarders.insert(id.clone(), handle);
        }

        info!(subscription_id = %id, path = path, attribute = %attribute, "Subscribed");
        Ok(Subscription { id, updates })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> ClientResult<()> {
        match self.forwarders.write().remove(id) {
            Some(handle) => {
                // Dropping the stream cancels the call
                handle.abort();
                info!(subscription_id = %id, "Unsubscribed");
            }
            None => debug!(subscription_id = %id, "Unsubscribe for inactive subscription"),
        }
        Ok(())
    }

    async fn close(&self) {
        let forwarders: Vec<_> = self.forwarders.write().drain().collect();
        for (_, handle) in forwarders {
            handle.abort();
        }
        info!("gRPC client closed");
    }

    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }
}

/// Pump one subscription stream into its update queue, dropping on full.
async fn forward_updates(
    mut stream: tonic::Streaming<SubscribeResponse>,
    tx: mpsc::Sender<SignalUpdate>,
    attribute: Attribute,
    id: &SubscriptionId,
) {
    loop {
        let response = match stream.message().await {
            Ok(Some(response)) => response,
            Ok(None) => {
                info!(subscription_id = %id, "Subscription stream ended");
                return;
            }
            Err(status) => {
                warn!(subscription_id = %id, status = %status, "Subscription stream failed");
                return;
            }
        };

        for entry in response.updates.into_iter().filter_map(|u| u.entry) {
            let Some(value) = entry_to_string(&entry, attribute) else {
                continue;
            };
            let update = SignalUpdate {
                path: Some(entry.path).filter(|p| !p.is_empty()),
                value,
            };
            match tx.try_send(update) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(subscription_id = %id, "Dropped subscription update, queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }
    }
}

/// First error reported by a response: the global one, else the first per-entry one
pub fn response_error(error: Option<&Error>, errors: &[DataEntryError]) -> Option<ServerError> {
    if let Some(error) = error.filter(|e| e.code != 0) {
        return Some(to_server_error(error, None));
    }
    errors
        .iter()
        .find_map(|e| e.error.as_ref().map(|error| to_server_error(error, Some(&e.path))))
}

fn to_server_error(error: &Error, path: Option<&str>) -> ServerError {
    let message = match path {
        Some(path) if !path.is_empty() => format!("{}: {}", path, error.message),
        _ => error.message.clone(),
    };
    let reason = Some(error.reason.clone()).filter(|r| !r.is_empty());
    ServerError::new(Some(i64::from(error.code)), reason, message)
}
