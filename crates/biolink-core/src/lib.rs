//! Shared value types, wire constants and payload codec for the biolink
//! fingerprint client.

pub mod codec;
pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
