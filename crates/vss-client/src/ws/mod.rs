//! Message transport: JSON documents over a WebSocket.

pub mod backend;
pub mod connect;
pub mod protocol;

pub use backend::WsBackend;
pub use connect::{open_socket, VssSocket};
pub use protocol::{Action, VssRequest};
