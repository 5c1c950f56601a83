//! Vehicle signal client for KUKSA.val servers.
//!
//! Get, set, subscribe to and read metadata of VSS signal paths over one of
//! two transports: JSON over a WebSocket, or the `kuksa.val.v1` gRPC service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         dyn VssBackend                           │
//! │     authorize · get_value · set_value · get_metadata · ...       │
//! ├───────────────────────────────┬──────────────────────────────────┤
//! │          WsBackend            │           GrpcBackend            │
//! │  ┌─────────────────────────┐  │  ┌────────────────────────────┐  │
//! │  │   Correlation Engine    │  │  │  ValClient (tonic/prost)   │  │
//! │  │  pump ─► socket sink    │  │  │  FieldViewTable            │  │
//! │  │  dispatcher ◄─ stream   │  │  │  Datapoint encoding        │  │
//! │  ├────────────┬────────────┤  │  │  per-subscription          │  │
//! │  │  Pending   │Subscription│  │  │  forwarder tasks           │  │
//! │  │  Requests  │   Table    │  │  └────────────────────────────┘  │
//! │  └────────────┴────────────┘  │                                  │
//! └───────────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vss_client::{connect, Attribute, ClientConfig};
//!
//! let config = ClientConfig::load(None)?;
//! let backend = connect(&config).await?;
//! backend.authorize(None).await?;
//! let speed = backend.get_value("Vehicle.Speed", Attribute::Value).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod rpc;
pub mod ws;

pub use domain::{
    parse_array, tokenize, ArrayValue, Attribute, ClientConfig, ClientError, ClientResult,
    CorrelationId, ElementType, ParseError, Protocol, ServerError, SignalUpdate, SubscriptionId,
};
pub use engine::{CorrelationEngine, EngineOptions};
pub use ports::{connect, Subscription, VssBackend};
pub use rpc::GrpcBackend;
pub use ws::WsBackend;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
