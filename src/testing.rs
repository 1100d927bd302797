//! Shared fakes for unit and integration tests
//!
//! Available to integration tests through the `testing` feature, mirroring
//! how the handlers and coordinator are exercised without any network.

use crate::auth::{Credential, TokenSource};
use crate::directory::{DirectoryApi, MemberOutcome};
use crate::error::{SourceError, SyncError};
use crate::source::{UserRecord, UserSource};
use crate::sync::Pacer;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory user source with optional scripted failures
pub struct VecSource {
    records: Vec<UserRecord>,
    fail_count: bool,
    fail_pages_from: Option<u64>,
}

impl VecSource {
    #[must_use]
    pub fn new(records: Vec<UserRecord>) -> Self {
        Self {
            records,
            fail_count: false,
            fail_pages_from: None,
        }
    }

    /// Build a source from plain email strings; an empty string becomes a
    /// record without a usable identity
    #[must_use]
    pub fn with_emails(emails: &[&str]) -> Self {
        Self::new(
            emails
                .iter()
                .map(|email| UserRecord {
                    email: if email.is_empty() {
                        None
                    } else {
                        Some((*email).to_string())
                    },
                })
                .collect(),
        )
    }

    /// Make the count query fail
    #[must_use]
    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    /// Make page fetches at or beyond `offset` fail
    #[must_use]
    pub fn failing_from(mut self, offset: u64) -> Self {
        self.fail_pages_from = Some(offset);
        self
    }
}

#[async_trait]
impl UserSource for VecSource {
    async fn count(&self) -> Result<u64, SourceError> {
        if self.fail_count {
            return Err(SourceError::Request("scripted count failure".to_string()));
        }
        Ok(self.records.len() as u64)
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, SourceError> {
        if let Some(fail_from) = self.fail_pages_from {
            if offset >= fail_from {
                return Err(SourceError::Request(format!(
                    "scripted page failure at offset {offset}"
                )));
            }
        }
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let end = start.saturating_add(usize::try_from(limit).unwrap_or(usize::MAX));
        if start >= self.records.len() {
            return Ok(Vec::new());
        }
        Ok(self.records[start..end.min(self.records.len())].to_vec())
    }
}

/// Directory fake returning scripted outcomes per email, `Added` by default
pub struct FakeDirectory {
    scripted: Mutex<HashMap<String, VecDeque<MemberOutcome>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripted: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue outcomes for an email; consumed one per call, `Added` after
    pub fn script(&self, email: &str, outcomes: &[MemberOutcome]) {
        self.scripted
            .lock()
            .unwrap()
            .entry(email.to_string())
            .or_default()
            .extend(outcomes.iter().copied());
    }

    /// Every email passed to `add_member`, in call order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for FakeDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryApi for FakeDirectory {
    async fn add_member(&self, _credential: &Credential, email: &str) -> MemberOutcome {
        self.calls.lock().unwrap().push(email.to_string());
        self.scripted
            .lock()
            .unwrap()
            .get_mut(email)
            .and_then(VecDeque::pop_front)
            .unwrap_or(MemberOutcome::Added)
    }
}

/// Token source handing out a fixed test token and counting acquisitions
pub struct StaticTokenSource {
    acquires: AtomicUsize,
}

impl StaticTokenSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            acquires: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn acquired(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }
}

impl Default for StaticTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn acquire(&self) -> Result<Credential, SyncError> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new("test-token".to_string()))
    }
}

/// Pacer that records requested pauses instead of sleeping
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pauses: Mutex::new(Vec::new()),
        }
    }

    /// All requested pauses, in order
    #[must_use]
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

impl Default for RecordingPacer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
