//! Services
//!
//! Business logic behind the host's actions. Commands parse requests and
//! hand them to the [`Coordinator`], which drives everything else here.

pub mod coordinator;
pub mod free_tier;
pub mod page_agent;
pub mod quota;
pub mod transcript;
pub mod youtube;

pub use coordinator::{Coordinator, Credentials, KeySource, Preferences};
pub use free_tier::FreeTier;
pub use page_agent::{ensure_agent_ready, HandshakePolicy, PageAgent, UserSurface};
pub use quota::{Clock, QuotaClass, QuotaStatus, QuotaTracker, SystemClock};
pub use transcript::{SupadataClient, TranscriptSource};
