//! Correlation ID for request/reply matching.
//!
//! Uses UUID v7 for time-ordered, unique identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Correlation ID linking one outbound request to its eventual reply.
///
/// Serialized as the `requestId` field of every message-transport request.
/// UUID v7 is time-ordered, which keeps log lines for a burst of concurrent
/// requests sortable by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID (UUID v7)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from the string form carried on the wire
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Get timestamp from UUID v7 (milliseconds since Unix epoch)
    pub fn timestamp_ms(&self) -> Option<u64> {
        let bytes = self.0.as_bytes();
        if (bytes[6] >> 4) == 7 {
            let ts = bytes[..6]
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            Some(ts)
        } else {
            None
        }
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
