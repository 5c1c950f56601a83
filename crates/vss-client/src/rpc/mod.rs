//! RPC transport: the `kuksa.val.v1.VAL` gRPC service.

pub mod backend;
pub mod datapoint;
pub mod field_view;
pub mod proto;

pub use backend::GrpcBackend;
pub use field_view::{FieldView, FieldViewTable};
