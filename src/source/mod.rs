//! User source
//!
//! The source of truth for the roster is the hosted backend's REST surface
//! over the user table. Pages are ordered by creation time so offset-based
//! resumption is well-defined: a re-invoked run with offset N sees the same
//! Nth record as the prior run, provided no records ahead of that position
//! were deleted.

use crate::error::{SourceError, SyncError};
use crate::settings::SourceSettings;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use url::Url;

/// Minimal identity needed to perform the directory operation
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRecord {
    /// The usable identity, if any; records without one are skipped by the
    /// coordinator without counting
    #[must_use]
    pub fn usable_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }
}

/// Queryable, stable-ordered collection of user records
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Count records with a usable identity
    ///
    /// # Errors
    ///
    /// Returns a `SourceError` when the backend cannot be queried.
    async fn count(&self) -> Result<u64, SourceError>;

    /// Fetch records `[offset, offset + limit)` in creation order
    ///
    /// # Errors
    ///
    /// Returns a `SourceError` when the backend cannot be queried or the
    /// response cannot be decoded.
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, SourceError>;
}

/// PostgREST-style user source over the hosted backend
pub struct RestUserSource {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl RestUserSource {
    /// Build a source from settings
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Configuration` when the base URL or API key is
    /// missing, or the URL does not parse.
    pub fn from_settings(source: &SourceSettings) -> Result<Self, SyncError> {
        if source.base_url.is_empty() {
            return Err(SyncError::Configuration(
                "user source base URL not configured".to_string(),
            ));
        }
        if source.api_key.is_empty() {
            return Err(SyncError::Configuration(
                "user source API key not configured".to_string(),
            ));
        }

        let base = Url::parse(&source.base_url).map_err(|e| {
            SyncError::Configuration(format!("invalid source base URL {}: {e}", source.base_url))
        })?;
        let endpoint = base
            .join(&format!("rest/v1/{}", source.table))
            .map_err(|e| SyncError::Configuration(format!("invalid source endpoint: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: source.api_key.clone(),
        })
    }

    fn request(&self) -> reqwest::RequestBuilder {
        self.client
            .get(self.endpoint.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Range-Unit", "items")
    }
}

#[async_trait]
impl UserSource for RestUserSource {
    async fn count(&self) -> Result<u64, SourceError> {
        let response = self
            .request()
            .query(&[("select", "email"), ("email", "not.is.null")])
            .header(header::RANGE, "0-0")
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Request(format!(
                "count query returned status {}",
                response.status()
            )));
        }

        let content_range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                SourceError::Decode("count response missing Content-Range header".to_string())
            })?;

        parse_content_range_total(content_range)
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, SourceError> {
        let last = offset + limit.saturating_sub(1);
        let response = self
            .request()
            .query(&[
                ("select", "email"),
                ("email", "not.is.null"),
                ("order", "created_at.asc"),
            ])
            .header(header::RANGE, format!("{offset}-{last}"))
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Request(format!(
                "page query at offset {offset} returned status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<UserRecord>>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

/// Extract the total from a `Content-Range` header value such as `0-49/1234`
fn parse_content_range_total(value: &str) -> Result<u64, SourceError> {
    value
        .rsplit('/')
        .next()
        .and_then(|total| total.parse::<u64>().ok())
        .ok_or_else(|| SourceError::Decode(format!("unparseable Content-Range: {value}")))
}
