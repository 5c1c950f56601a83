//! Ports: the capability interface both transports implement.

pub mod backend;

pub use backend::{connect, Subscription, VssBackend};
