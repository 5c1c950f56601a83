//! JSON wire format of the message transport.
//!
//! Requests carry a `requestId`; replies echo it. Pushes carry
//! `action = "subscription"` and a `subscriptionId` instead.

use crate::domain::correlation::CorrelationId;
use crate::domain::error::{ClientError, ClientResult, ServerError};
use crate::domain::types::{Attribute, SignalUpdate, SubscriptionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request action tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Get,
    Set,
    Subscribe,
    Unsubscribe,
    Authorize,
    #[serde(rename = "getMetaData")]
    GetMetaData,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Authorize => "authorize",
            Self::GetMetaData => "getMetaData",
        }
    }
}

/// Action value marking a subscription push
pub const PUSH_ACTION: &str = "subscription";

/// A request before its correlation ID is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VssRequest {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<SubscriptionId>,
}

impl VssRequest {
    fn new(action: Action) -> Self {
        Self {
            action,
            path: None,
            attribute: None,
            value: None,
            target_value: None,
            tokens: None,
            subscription_id: None,
        }
    }

    pub fn get(path: &str, attribute: Attribute) -> Self {
        Self {
            path: Some(path.to_string()),
            attribute: Some(attribute),
            ..Self::new(Action::Get)
        }
    }

    /// The value travels in the member named after the attribute.
    pub fn set(path: &str, value: &str, attribute: Attribute) -> ClientResult<Self> {
        let mut request = Self {
            path: Some(path.to_string()),
            attribute: Some(attribute),
            ..Self::new(Action::Set)
        };
        match attribute {
            Attribute::Value => request.value = Some(value.to_string()),
            Attribute::TargetValue => request.target_value = Some(value.to_string()),
            Attribute::Metadata => {
                return Err(ClientError::UnsupportedAttribute(format!(
                    "cannot set {}",
                    attribute
                )))
            }
        }
        Ok(request)
    }

    pub fn subscribe(path: &str, attribute: Attribute) -> Self {
        Self {
            path: Some(path.to_string()),
            attribute: Some(attribute),
            ..Self::new(Action::Subscribe)
        }
    }

    pub fn unsubscribe(id: &SubscriptionId) -> Self {
        Self {
            subscription_id: Some(id.clone()),
            ..Self::new(Action::Unsubscribe)
        }
    }

    pub fn authorize(token: &str) -> Self {
        Self {
            tokens: Some(token.to_string()),
            ..Self::new(Action::Authorize)
        }
    }

    pub fn get_metadata(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::new(Action::GetMetaData)
        }
    }
}

/// Request as written to the socket
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest<'a> {
    pub request_id: CorrelationId,
    #[serde(flatten)]
    pub body: &'a VssRequest,
}

/// How the dispatcher should route an inbound document
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Reply(CorrelationId),
    Push(SubscriptionId),
    /// Unrecognized shape, or a `requestId` that is not ours
    Unknown,
}

/// Classify an inbound document by its shape.
pub fn classify(message: &Value) -> Inbound {
    if let Some(request_id) = message.get("requestId") {
        return request_id
            .as_str()
            .and_then(|s| CorrelationId::parse(s).ok())
            .map_or(Inbound::Unknown, Inbound::Reply);
    }

    // A push without a subscriptionId cannot be routed, so the id decides
    message
        .get("subscriptionId")
        .and_then(Value::as_str)
        .map_or(Inbound::Unknown, |id| Inbound::Push(SubscriptionId::from(id)))
}

/// Error payload of a reply, if any
pub fn reply_error(reply: &Value) -> Option<ServerError> {
    reply
        .get("error")
        .filter(|e| !e.is_null())
        .map(ServerError::from_payload)
}

/// Value of `data.dp.<attribute>` rendered as text
pub fn extract_datapoint(reply: &Value, attribute: Attribute) -> Option<String> {
    reply
        .pointer(&format!("/data/dp/{}", attribute.as_str()))
        .map(value_to_string)
}

/// `metadata` member serialized as JSON
pub fn extract_metadata(reply: &Value) -> Option<String> {
    reply.get("metadata").map(Value::to_string)
}

pub fn extract_subscription_id(reply: &Value) -> Option<SubscriptionId> {
    reply
        .get("subscriptionId")
        .and_then(Value::as_str)
        .map(SubscriptionId::from)
}

/// Update carried by a push: `data.dp.value`, else `data.dp.targetValue`,
/// else the whole `data` member.
pub fn extract_update(push: &Value) -> SignalUpdate {
    let path = push
        .pointer("/data/path")
        .and_then(Value::as_str)
        .map(str::to_string);
    let value = push
        .pointer("/data/dp/value")
        .or_else(|| push.pointer("/data/dp/targetValue"))
        .or_else(|| push.get("data"))
        .map(value_to_string)
        .unwrap_or_default();
    SignalUpdate { path, value }
}

/// Strings unquoted, everything else as compact JSON
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
