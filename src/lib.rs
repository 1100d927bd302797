#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the rostersync application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod auth;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod settings;
pub mod source;
pub mod sync;
pub mod utils;

// Shared fakes for unit and integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use auth::{Credential, ServiceAccountTokenProvider, TokenSource};
pub use directory::{DirectoryApi, GoogleDirectoryClient, MemberOutcome};
pub use error::{SourceError, SyncError};
pub use settings::RostersyncSettings;
pub use source::{RestUserSource, UserRecord, UserSource};
pub use sync::{SyncConfig, SyncCoordinator, SyncReport, SyncRequest, SyncTally};
