//! Pacing seam
//!
//! All sleeps go through one trait so tests can observe the pacing pattern
//! without waiting on wall-clock time, and so a proper rate limiter could
//! replace the fixed delays without touching the coordinator's contract.

use async_trait::async_trait;
use std::time::Duration;

/// Cooperative pause between external calls
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Production pacer backed by the tokio timer
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
