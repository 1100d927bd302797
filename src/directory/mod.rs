//! Directory API client
//!
//! Wraps the single external mutation this service performs — adding one
//! email address to a Workspace group — and classifies every possible
//! outcome into a fixed five-way result. `add_member` is total: transport
//! errors classify as [`MemberOutcome::Error`] instead of propagating, so
//! the coordinator's loop never needs per-call error handling.

use crate::auth::Credential;
use crate::error::SyncError;
use crate::settings::GoogleSettings;
use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

/// Classified outcome of a single add-member attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOutcome {
    /// Member was created
    Added,
    /// Member was already present; the target state holds, not a failure
    AlreadyMember,
    /// The API asked us to back off; transient, retried once
    RateLimited,
    /// Any other API-level rejection
    Failed,
    /// Transport-level failure (network error, malformed response)
    Error,
}

impl MemberOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MemberOutcome::Added => "added",
            MemberOutcome::AlreadyMember => "already_member",
            MemberOutcome::RateLimited => "rate_limited",
            MemberOutcome::Failed => "failed",
            MemberOutcome::Error => "error",
        }
    }
}

/// External group-membership mutation
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Attempt to add `email` to the configured group
    async fn add_member(&self, credential: &Credential, email: &str) -> MemberOutcome;
}

/// Admin Directory API client for one target group
#[derive(Debug)]
pub struct GoogleDirectoryClient {
    client: reqwest::Client,
    members_url: Url,
    group_email: String,
}

impl GoogleDirectoryClient {
    /// Build a client from settings
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` when the group email is missing
    /// or the API base URL does not parse.
    pub fn from_settings(google: &GoogleSettings) -> Result<Self, SyncError> {
        if google.group_email.is_empty() {
            return Err(SyncError::Configuration(
                "target group email not configured".to_string(),
            ));
        }

        let base = Url::parse(&google.api_base_url).map_err(|e| {
            SyncError::Configuration(format!(
                "invalid directory API base URL {}: {e}",
                google.api_base_url
            ))
        })?;
        let members_url = base
            .join(&format!(
                "admin/directory/v1/groups/{}/members",
                google.group_email
            ))
            .map_err(|e| SyncError::Configuration(format!("invalid members endpoint: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            members_url,
            group_email: google.group_email.clone(),
        })
    }

    /// Map an HTTP status onto the five-way outcome
    #[must_use]
    pub fn classify(status: StatusCode) -> MemberOutcome {
        if status.is_success() {
            MemberOutcome::Added
        } else if status == StatusCode::CONFLICT {
            MemberOutcome::AlreadyMember
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            MemberOutcome::RateLimited
        } else {
            MemberOutcome::Failed
        }
    }
}

#[async_trait]
impl DirectoryApi for GoogleDirectoryClient {
    async fn add_member(&self, credential: &Credential, email: &str) -> MemberOutcome {
        let result = self
            .client
            .post(self.members_url.clone())
            .bearer_auth(&credential.access_token)
            .json(&serde_json::json!({
                "email": email,
                "role": "MEMBER",
            }))
            .send()
            .await;

        match result {
            Ok(response) => {
                let outcome = Self::classify(response.status());
                if outcome == MemberOutcome::Failed {
                    log::warn!(
                        "Directory API rejected {email} for {}: status {}",
                        self.group_email,
                        response.status()
                    );
                }
                outcome
            }
            Err(e) => {
                log::warn!("Directory API call for {email} failed in transport: {e}");
                MemberOutcome::Error
            }
        }
    }
}
