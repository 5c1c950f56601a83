//! Core value types shared by both transports.

use crate::domain::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which facet of a signal a request addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    /// Current value of a sensor or actuator
    #[default]
    Value,
    /// Target value requested for an actuator
    TargetValue,
    /// Static metadata (datatype, unit, description, ...)
    Metadata,
}

impl Attribute {
    /// All attributes, in wire order
    pub const ALL: [Attribute; 3] = [Self::Value, Self::TargetValue, Self::Metadata];

    /// Wire name of the attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::TargetValue => "targetValue",
            Self::Metadata => "metadata",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| ClientError::UnsupportedAttribute(s.to_string()))
    }
}

/// Server-issued (or, for gRPC, client-generated) name of a live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random ID for transports where the server does not issue one
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Transport used to talk to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// JSON request/response over a WebSocket
    #[default]
    #[serde(alias = "websocket")]
    Ws,
    /// kuksa.val.v1 gRPC service
    #[serde(alias = "rpc")]
    Grpc,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ws => f.write_str("ws"),
            Self::Grpc => f.write_str("grpc"),
        }
    }
}

impl FromStr for Protocol {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ws" | "websocket" => Ok(Self::Ws),
            "grpc" | "rpc" => Ok(Self::Grpc),
            other => Err(ClientError::Config(format!(
                "unknown protocol '{}', expected ws or grpc",
                other
            ))),
        }
    }
}

/// One update delivered on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalUpdate {
    /// Signal path, when the server includes it
    pub path: Option<String>,
    /// Updated value rendered as text
    pub value: String,
}

impl fmt::Display for SignalUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.value),
            None => f.write_str(&self.value),
        }
    }
}
