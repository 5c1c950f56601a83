//! Domain types for the vehicle signal client.
//!
//! Value types, configuration, error handling and the array literal parser.
//! The async machinery (pending requests, subscriptions) lives in `engine`.

pub mod array;
pub mod config;
pub mod correlation;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use array::{parse_array, tokenize, ArrayValue, ElementType};
pub use config::ClientConfig;
pub use correlation::CorrelationId;
pub use error::{ClientError, ClientResult, ParseError, ServerError};
pub use types::*;
