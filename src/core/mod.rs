pub mod config;
pub mod model;
pub mod normalize;
pub mod service;

// Re-export commonly used types
pub use config::AgentConfig;
pub use model::{CredentialFinding, IssueFlag, Location, RawHit, ScanItem, SourceType};
pub use normalize::normalize_raw_hit;
pub use service::{ScanService, ScanSummary};
