//! Per-run outcome accounting

use crate::directory::MemberOutcome;
use serde::Serialize;

/// Aggregate counters produced by one coordinator run
///
/// `processed` counts records attempted (once per record, even when a
/// rate-limited call is retried); the per-outcome counters always sum to
/// `processed`, and `processed` never exceeds `total`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncTally {
    pub total: u64,
    pub processed: u64,
    pub added: u64,
    pub already_member: u64,
    pub failed: u64,
    pub rate_limited: u64,
    pub error: u64,
}

impl SyncTally {
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Record the outcome of one attempted record
    pub fn record(&mut self, outcome: MemberOutcome) {
        *self.counter_mut(outcome) += 1;
        self.processed += 1;
    }

    /// Reclassify a previously recorded outcome without touching
    /// `processed`; used when the single rate-limit retry lands on a
    /// different status
    pub fn convert(&mut self, from: MemberOutcome, to: MemberOutcome) {
        let counter = self.counter_mut(from);
        *counter = counter.saturating_sub(1);
        *self.counter_mut(to) += 1;
    }

    /// Sum of the per-outcome counters; equals `processed` by construction
    #[must_use]
    pub fn outcome_sum(&self) -> u64 {
        self.added + self.already_member + self.failed + self.rate_limited + self.error
    }

    fn counter_mut(&mut self, outcome: MemberOutcome) -> &mut u64 {
        match outcome {
            MemberOutcome::Added => &mut self.added,
            MemberOutcome::AlreadyMember => &mut self.already_member,
            MemberOutcome::RateLimited => &mut self.rate_limited,
            MemberOutcome::Failed => &mut self.failed,
            MemberOutcome::Error => &mut self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_counters_and_processed() {
        let mut tally = SyncTally::new(10);

        tally.record(MemberOutcome::Added);
        tally.record(MemberOutcome::Added);
        tally.record(MemberOutcome::AlreadyMember);
        tally.record(MemberOutcome::Failed);

        assert_eq!(tally.added, 2);
        assert_eq!(tally.already_member, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.processed, 4);
        assert_eq!(tally.outcome_sum(), tally.processed);
    }

    #[test]
    fn test_convert_preserves_processed() {
        let mut tally = SyncTally::new(3);

        tally.record(MemberOutcome::RateLimited);
        tally.convert(MemberOutcome::RateLimited, MemberOutcome::Added);

        assert_eq!(tally.rate_limited, 0);
        assert_eq!(tally.added, 1);
        assert_eq!(tally.processed, 1);
        assert_eq!(tally.outcome_sum(), tally.processed);
    }

    #[test]
    fn test_convert_never_underflows() {
        let mut tally = SyncTally::new(1);

        tally.convert(MemberOutcome::RateLimited, MemberOutcome::Added);

        assert_eq!(tally.rate_limited, 0);
        assert_eq!(tally.added, 1);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut tally = SyncTally::new(2);
        tally.record(MemberOutcome::Added);
        tally.record(MemberOutcome::AlreadyMember);

        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["processed"], 2);
        assert_eq!(json["added"], 1);
        assert_eq!(json["already_member"], 1);
        assert_eq!(json["rate_limited"], 0);
        assert_eq!(json["failed"], 0);
        assert_eq!(json["error"], 0);
    }
}
