//! Reconciliation job
//!
//! A single run pages through the user source in creation order and drives
//! one directory call at a time, with fixed-delay pacing instead of a rate
//! limiter: the external API enforces a request-rate ceiling, and serial
//! calls with an explicit delay are the simplest way to stay under it.

pub mod coordinator;
pub mod pacing;
pub mod tally;

pub use coordinator::{SyncConfig, SyncCoordinator, SyncReport, SyncRequest};
pub use pacing::{Pacer, TokioPacer};
pub use tally::SyncTally;
