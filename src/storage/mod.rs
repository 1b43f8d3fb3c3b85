//! Storage Layer
//!
//! Handles all data persistence: the two-scope key-value store mirrored from
//! the extension and the host's JSON config.

pub mod config;
pub mod store;

pub use config::*;
pub use store::*;
