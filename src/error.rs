//! Error types for the synchronization job
//!
//! Only two conditions abort a run outright: missing configuration and a
//! failed token exchange. Everything else is absorbed into the tally so a
//! single bad record cannot take down a run over thousands of records.

use std::fmt;

/// Fatal synchronization job errors
#[derive(Debug)]
pub enum SyncError {
    /// A required secret or setting is absent or unusable; raised before
    /// any network activity
    Configuration(String),
    /// The token endpoint rejected the assertion or returned malformed
    /// data; carries the provider's error envelope for diagnostics
    TokenExchange { code: String, description: String },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            SyncError::TokenExchange { code, description } => {
                write!(f, "token exchange failed: {code}: {description}")
            }
        }
    }
}

impl std::error::Error for SyncError {}

/// User source failures
///
/// Never fatal for the job: the coordinator logs these and treats the page
/// as end-of-data, reporting a resume offset instead of propagating.
#[derive(Debug)]
pub enum SourceError {
    /// Request could not be sent or came back with a non-success status
    Request(String),
    /// Response arrived but could not be interpreted
    Decode(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Request(msg) => write!(f, "source request failed: {msg}"),
            SourceError::Decode(msg) => write!(f, "source response invalid: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::Configuration("service account email missing".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: service account email missing"
        );

        let err = SyncError::TokenExchange {
            code: "invalid_grant".to_string(),
            description: "Invalid JWT signature".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "token exchange failed: invalid_grant: Invalid JWT signature"
        );
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Request("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = SourceError::Decode("missing Content-Range".to_string());
        assert!(err.to_string().starts_with("source response invalid"));
    }
}
