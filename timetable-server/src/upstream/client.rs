//! Timetable API HTTP client.
//!
//! Performs the two upstream calls (`GET /timetables` and
//! `GET /timetables/{id}`), unwraps their envelopes and parses the result
//! into a `TimetableDocument`. Caching lives one layer up, in
//! `crate::cache`.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::TimetableDocument;
use crate::domain::fields::{is_truthy, truncate};

use super::envelope::{extract_payload, normalize_listing, select_timetable, timetable_id};
use super::error::FetchError;
use super::types::TimetableSummary;

/// Default base URL for the timetable API.
pub const DEFAULT_BASE_URL: &str = "https://www.timetablemaster.com/api";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// How much of a response body to keep in logs and errors.
const BODY_SNIPPET_CHARS: usize = 2000;

/// How much of a listing entry to keep in logs and errors.
const ENTRY_SNIPPET_CHARS: usize = 300;

/// How much of an unusable document response to keep in logs.
const PAYLOAD_SNIPPET_CHARS: usize = 4000;

/// Configuration for the timetable client.
#[derive(Debug, Clone)]
pub struct TimetableConfig {
    /// Bearer token. Required for any request.
    pub api_key: Option<String>,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Fetch this timetable instead of picking one from the listing
    pub timetable_id: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timetable_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TimetableConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::default().with_api_key(api_key)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Always fetch the given timetable.
    pub fn with_timetable_id(mut self, id: impl Into<String>) -> Self {
        self.timetable_id = Some(id.into());
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Where timetable documents come from.
///
/// This abstraction allows the cache to be tested without network access.
pub trait TimetableSource: Send + Sync {
    /// Fetch the configured (or best available) timetable.
    fn fetch_document(&self) -> impl Future<Output = Result<TimetableDocument, FetchError>> + Send;

    /// Fetch the catalog of available timetables.
    fn list_timetables(
        &self,
    ) -> impl Future<Output = Result<Vec<TimetableSummary>, FetchError>> + Send;
}

/// Timetable API client.
#[derive(Debug, Clone)]
pub struct TimetableClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timetable_id: Option<String>,
}

impl TimetableClient {
    /// Create a new client with the given configuration.
    ///
    /// A missing API key is not an error here; requests fail fast instead.
    pub fn new(config: TimetableConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.filter(|k| !k.is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timetable_id: config.timetable_id.filter(|id| !id.is_empty()),
        })
    }

    fn listing_url(&self) -> String {
        format!("{}/timetables", self.base_url)
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/timetables/{}", self.base_url, id)
    }

    /// The API key, or why no request may be made.
    fn credentials(&self) -> Result<&str, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::ConfigurationMissing("TIMETABLE_API_KEY is not set"))?;

        if self.base_url.is_empty() {
            return Err(FetchError::ConfigurationMissing("BASE_URL is empty"));
        }

        Ok(api_key)
    }

    /// GET a URL and decode its body. A body that is not JSON decodes to
    /// `Value::Null` rather than failing.
    async fn get_json(&self, url: &str, api_key: &str) -> Result<Value, FetchError> {
        debug!(url, "timetable API request");

        let response = self
            .http
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .inspect_err(|e| warn!(url, error = %e, "timetable API request failed"))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "timetable API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate(&body, BODY_SNIPPET_CHARS);
            warn!(
                url,
                status = status.as_u16(),
                body = %body,
                "timetable API returned an error status"
            );
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;

        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(
                url,
                error = %e,
                body = %truncate(&body, BODY_SNIPPET_CHARS),
                "response is not valid JSON; treating it as empty"
            );
            Value::Null
        }))
    }

    /// Fetch and normalize the listing.
    pub async fn fetch_listing(&self) -> Result<Vec<Value>, FetchError> {
        let api_key = self.credentials()?;
        let url = self.listing_url();

        let listing = self.get_json(&url, api_key).await?;
        let entries = normalize_listing(&listing);

        if entries.is_empty() {
            warn!(
                url,
                listing = %truncate(&listing.to_string(), BODY_SNIPPET_CHARS),
                "no timetables in listing response"
            );
        }

        Ok(entries)
    }

    /// Fetch a timetable by identifier.
    pub async fn fetch_by_id(&self, id: &str) -> Result<TimetableDocument, FetchError> {
        let api_key = self.credentials()?;
        let url = self.document_url(id);

        let response = self.get_json(&url, api_key).await?;

        let Some(payload) = extract_payload(&response).filter(|p| is_truthy(p)) else {
            warn!(
                url,
                response = %truncate(&response.to_string(), PAYLOAD_SNIPPET_CHARS),
                "no timetable data returned"
            );
            return Err(FetchError::EmptyPayload { url });
        };

        TimetableDocument::from_value(payload).ok_or_else(|| {
            warn!(
                url,
                payload = %truncate(&payload.to_string(), PAYLOAD_SNIPPET_CHARS),
                "timetable payload is not a mapping"
            );
            FetchError::NotADocument { url: url.clone() }
        })
    }
}

impl TimetableSource for TimetableClient {
    async fn fetch_document(&self) -> Result<TimetableDocument, FetchError> {
        self.credentials()?;

        if let Some(id) = &self.timetable_id {
            debug!(id, "fetching configured timetable");
            return self.fetch_by_id(id).await;
        }

        let listing = self.fetch_listing().await?;
        let chosen = select_timetable(&listing).ok_or(FetchError::NoTimetables)?;

        let id = timetable_id(chosen).ok_or_else(|| {
            let entry = truncate(&chosen.to_string(), ENTRY_SNIPPET_CHARS);
            warn!(entry = %entry, "could not determine timetable id from listing entry");
            FetchError::MissingIdentifier { entry }
        })?;

        debug!(id, "fetching chosen timetable");
        self.fetch_by_id(&id).await
    }

    async fn list_timetables(&self) -> Result<Vec<TimetableSummary>, FetchError> {
        let listing = self.fetch_listing().await?;
        Ok(listing.iter().map(TimetableSummary::from_value).collect())
    }
}
