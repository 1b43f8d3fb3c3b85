//! Data Models
//!
//! Contains the data structures exchanged with the extension.

pub mod messages;
pub mod response;
pub mod settings;
pub mod video;

pub use messages::*;
pub use response::*;
pub use settings::*;
pub use video::*;
