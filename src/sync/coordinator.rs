//! Reconciliation coordinator
//!
//! Drives one run: count the source, acquire a token, then page through the
//! roster adding each member with pacing, a single rate-limit retry, and a
//! token refresh check before every page. Per-record failures are tallied,
//! never thrown; only configuration and token-acquisition failures abort
//! the run.

use crate::auth::TokenSource;
use crate::directory::{DirectoryApi, MemberOutcome};
use crate::error::SyncError;
use crate::settings::RostersyncSettings;
use crate::source::UserSource;
use crate::sync::pacing::Pacer;
use crate::sync::tally::SyncTally;
use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Resume point for a run
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SyncRequest {
    /// Position in the stable-ordered source to start from
    pub offset: u64,
}

/// Final output of one run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    #[serde(flatten)]
    pub tally: SyncTally,
    /// Offset from which a follow-up run should continue; absent when the
    /// source was exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

impl SyncReport {
    fn complete(tally: SyncTally) -> Self {
        Self {
            tally,
            next_offset: None,
        }
    }

    fn partial(tally: SyncTally, next_offset: u64) -> Self {
        Self {
            tally,
            next_offset: Some(next_offset),
        }
    }
}

/// Tuning knobs for one run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub batch_size: u64,
    pub record_delay: Duration,
    pub batch_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub token_refresh: ChronoDuration,
    /// Wall-clock budget; `None` means run to exhaustion
    pub deadline: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            record_delay: Duration::from_millis(200),
            batch_delay: Duration::from_millis(2000),
            rate_limit_cooldown: Duration::from_millis(10_000),
            token_refresh: ChronoDuration::minutes(45),
            deadline: None,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn from_settings(settings: &RostersyncSettings) -> Self {
        let deadline = if settings.sync.deadline_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(settings.sync.deadline_secs))
        };
        Self {
            batch_size: settings.sync.batch_size.max(1),
            record_delay: Duration::from_millis(settings.sync.record_delay_ms),
            batch_delay: Duration::from_millis(settings.sync.batch_delay_ms),
            rate_limit_cooldown: Duration::from_millis(settings.sync.rate_limit_cooldown_ms),
            token_refresh: ChronoDuration::minutes(
                i64::try_from(settings.google.token_refresh_minutes).unwrap_or(45),
            ),
            deadline,
        }
    }
}

/// Orchestrates one reconciliation pass over the roster
pub struct SyncCoordinator<'a> {
    config: SyncConfig,
    tokens: &'a dyn TokenSource,
    directory: &'a dyn DirectoryApi,
    source: &'a dyn UserSource,
    pacer: &'a dyn Pacer,
}

impl<'a> SyncCoordinator<'a> {
    #[must_use]
    pub fn new(
        config: SyncConfig,
        tokens: &'a dyn TokenSource,
        directory: &'a dyn DirectoryApi,
        source: &'a dyn UserSource,
        pacer: &'a dyn Pacer,
    ) -> Self {
        Self {
            config,
            tokens,
            directory,
            source,
            pacer,
        }
    }

    /// Run the job to completion, deadline, or end of data
    ///
    /// # Errors
    ///
    /// Returns `SyncError` only for configuration or token-exchange
    /// failures; every per-record outcome is absorbed into the tally.
    pub async fn run(self, request: SyncRequest) -> Result<SyncReport, SyncError> {
        let started = Instant::now();

        let total = match self.source.count().await {
            Ok(total) => total,
            Err(e) => {
                // Best-effort job: an unreachable source ends the run
                // without crashing the caller
                log::error!("User source count failed: {e}");
                return Ok(SyncReport::partial(SyncTally::new(0), request.offset));
            }
        };

        let mut tally = SyncTally::new(total);
        let mut credential = self.tokens.acquire().await?;
        let mut offset = request.offset;

        log::info!(
            "Starting roster sync: {total} users, batch size {}, offset {offset}",
            self.config.batch_size
        );

        loop {
            if let Some(deadline) = self.config.deadline {
                if started.elapsed() >= deadline {
                    log::warn!(
                        "Deadline reached after {} records; resume from offset {offset}",
                        tally.processed
                    );
                    return Ok(SyncReport::partial(tally, offset));
                }
            }

            if credential.age() >= self.config.token_refresh {
                log::info!("Access token near expiry, refreshing");
                credential = self.tokens.acquire().await?;
            }

            let page = match self.source.fetch_page(offset, self.config.batch_size).await {
                Ok(page) => page,
                Err(e) => {
                    log::error!("Page fetch at offset {offset} failed, ending run: {e}");
                    return Ok(SyncReport::partial(tally, offset));
                }
            };

            if page.is_empty() {
                break;
            }
            let page_len = page.len() as u64;

            for record in &page {
                let Some(email) = record.usable_email() else {
                    continue;
                };

                let outcome = self.directory.add_member(&credential, email).await;
                tally.record(outcome);

                if outcome == MemberOutcome::RateLimited {
                    self.pacer.pause(self.config.rate_limit_cooldown).await;
                    let retry = self.directory.add_member(&credential, email).await;
                    if retry != MemberOutcome::RateLimited {
                        // The transient state resolved; count the real
                        // outcome instead of the backoff signal
                        tally.convert(MemberOutcome::RateLimited, retry);
                    }
                }

                self.pacer.pause(self.config.record_delay).await;
            }

            offset += self.config.batch_size;
            log::debug!(
                "Page complete: {}/{} processed, next offset {offset}",
                tally.processed,
                tally.total
            );

            // A short page means the source is exhausted
            if page_len < self.config.batch_size {
                break;
            }
            self.pacer.pause(self.config.batch_delay).await;
        }

        log::info!(
            "Roster sync finished: {} processed of {} ({} added, {} already members, {} failed, {} rate limited, {} errors)",
            tally.processed,
            tally.total,
            tally.added,
            tally.already_member,
            tally.failed,
            tally.rate_limited,
            tally.error
        );
        Ok(SyncReport::complete(tally))
    }
}
