//! Caching layer for timetable documents.
//!
//! The upstream API is slow and rate-sensitive, and every page view needs
//! the whole document. We keep the last successfully fetched document for a
//! short TTL and serve it to every caller within that window.
//!
//! There is a single entry, not one per timetable id: changing the configured
//! id before the entry expires still serves the previous document.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;
use tracing::{debug, error, info};

use crate::domain::TimetableDocument;
use crate::upstream::{FetchError, TimetableClient, TimetableSource, TimetableSummary};

/// Default TTL in seconds.
pub const DEFAULT_TTL_SECS: u64 = 25;

/// Longest TTL accepted, one day. Longer TTLs are clamped to it.
pub const MAX_TTL_SECS: u64 = 24 * 60 * 60;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for the cached document.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

impl CacheConfig {
    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A fetched document and when it was fetched.
#[derive(Debug, Clone)]
pub struct CachedTimetable {
    pub fetched_at: DateTime<Utc>,
    pub document: Arc<TimetableDocument>,
}

impl CachedTimetable {
    /// Seconds since the document was fetched.
    pub fn age_secs(&self) -> f64 {
        (Utc::now() - self.fetched_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Single-entry TTL cache for the current document.
///
/// Entries are swapped whole, so readers see either the previous or the new
/// document, never a mix.
pub struct DocumentCache {
    entry: MokaCache<(), Arc<CachedTimetable>>,
    ttl: Duration,
}

impl DocumentCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let ttl = config.ttl.min(Duration::from_secs(MAX_TTL_SECS));
        let entry = MokaCache::builder().time_to_live(ttl).build();

        Self { entry, ttl }
    }

    /// The cached document, if one was stored less than a TTL ago.
    pub async fn get(&self) -> Option<Arc<CachedTimetable>> {
        self.entry.get(&()).await
    }

    /// Replace the cached document.
    pub async fn store(&self, document: TimetableDocument) -> Arc<CachedTimetable> {
        let cached = Arc::new(CachedTimetable {
            fetched_at: Utc::now(),
            document: Arc::new(document),
        });
        self.entry.insert((), Arc::clone(&cached)).await;
        cached
    }

    /// Drop the cached document.
    pub fn invalidate(&self) {
        self.entry.invalidate_all();
    }

    /// Effective TTL after clamping.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Timetable client with caching.
///
/// Wraps a `TimetableSource` and caches the fetched document. This is the
/// failure boundary: every error is logged here before being returned, and
/// a failed fetch leaves the previous entry in place.
pub struct CachedTimetableClient<S = TimetableClient> {
    source: S,
    cache: DocumentCache,
}

impl<S: TimetableSource> CachedTimetableClient<S> {
    /// Create a new cached client.
    pub fn new(source: S, cache_config: &CacheConfig) -> Self {
        Self {
            source,
            cache: DocumentCache::new(cache_config),
        }
    }

    /// Get the current timetable, using the cache unless `force_refresh`.
    pub async fn fetch_timetable_data(
        &self,
        force_refresh: bool,
    ) -> Result<Arc<CachedTimetable>, FetchError> {
        if !force_refresh && let Some(cached) = self.cache.get().await {
            debug!(age_secs = cached.age_secs(), "using cached timetable");
            return Ok(cached);
        }

        match self.source.fetch_document().await {
            Ok(document) => {
                let cached = self.cache.store(document).await;
                info!(
                    id = cached.document.id.as_deref().unwrap_or("-"),
                    entries = cached.document.schedule.len(),
                    "timetable fetched and cached"
                );
                Ok(cached)
            }
            Err(e) => {
                error!(error = %e, "failed to fetch timetable");
                Err(e)
            }
        }
    }

    /// List available timetables for the catalog. Never fails: any error is
    /// logged and yields an empty list.
    pub async fn list_available_timetables(&self) -> Vec<TimetableSummary> {
        match self.source.list_timetables().await {
            Ok(summaries) => {
                if summaries.is_empty() {
                    info!("no timetables found in catalog listing");
                }
                summaries
            }
            Err(e) => {
                error!(error = %e, "failed to list timetables");
                Vec::new()
            }
        }
    }

    /// The cached document without fetching.
    pub async fn cached(&self) -> Option<Arc<CachedTimetable>> {
        self.cache.get().await
    }

    /// Access the underlying source for operations that bypass cache.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Invalidate the cached document.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock source serving queued results and counting calls.
    struct MockSource {
        documents: Mutex<Vec<Result<TimetableDocument, FetchError>>>,
        fetches: AtomicUsize,
        listing: Option<Vec<TimetableSummary>>,
    }

    impl MockSource {
        fn new(documents: Vec<Result<TimetableDocument, FetchError>>) -> Self {
            Self {
                documents: Mutex::new(documents),
                fetches: AtomicUsize::new(0),
                listing: None,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl TimetableSource for MockSource {
        async fn fetch_document(&self) -> Result<TimetableDocument, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut documents = self.documents.lock().unwrap();
            if documents.is_empty() {
                return Err(FetchError::NoTimetables);
            }
            documents.remove(0)
        }

        async fn list_timetables(&self) -> Result<Vec<TimetableSummary>, FetchError> {
            self.listing.clone().ok_or(FetchError::NoTimetables)
        }
    }

    fn doc(id: &str) -> TimetableDocument {
        TimetableDocument {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(25));
    }

    #[test]
    fn ttl_reports_configured_value() {
        let config = CacheConfig::default().with_ttl(Duration::from_secs(90));
        let client = CachedTimetableClient::new(MockSource::new(Vec::new()), &config);
        assert_eq!(client.ttl(), Duration::from_secs(90));
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let config = CacheConfig::default().with_ttl(Duration::from_secs(99_999_999_999_999));
        let cache = DocumentCache::new(&config);
        assert_eq!(cache.ttl(), Duration::from_secs(MAX_TTL_SECS));
    }

    #[tokio::test]
    async fn second_call_within_ttl_uses_cache() {
        let client = CachedTimetableClient::new(
            MockSource::new(vec![Ok(doc("a")), Ok(doc("b"))]),
            &CacheConfig::default(),
        );

        let first = client.fetch_timetable_data(false).await.unwrap();
        let second = client.fetch_timetable_data(false).await.unwrap();

        assert_eq!(client.source().fetches(), 1);
        assert_eq!(first.document, second.document);
        assert_eq!(second.document.id.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn force_refresh_bypasses_cache() {
        let client = CachedTimetableClient::new(
            MockSource::new(vec![Ok(doc("a")), Ok(doc("b"))]),
            &CacheConfig::default(),
        );

        client.fetch_timetable_data(false).await.unwrap();
        let refreshed = client.fetch_timetable_data(true).await.unwrap();

        assert_eq!(client.source().fetches(), 2);
        assert_eq!(refreshed.document.id.as_deref(), Some("b"));

        // The refreshed document replaced the cached one.
        let cached = client.fetch_timetable_data(false).await.unwrap();
        assert_eq!(cached.document.id.as_deref(), Some("b"));
        assert_eq!(client.source().fetches(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_entry() {
        let client = CachedTimetableClient::new(
            MockSource::new(vec![
                Ok(doc("a")),
                Err(FetchError::EmptyPayload {
                    url: "http://api/timetables/a".into(),
                }),
            ]),
            &CacheConfig::default(),
        );

        client.fetch_timetable_data(false).await.unwrap();
        let err = client.fetch_timetable_data(true).await.unwrap_err();
        assert!(matches!(err, FetchError::EmptyPayload { .. }));

        let cached = client.fetch_timetable_data(false).await.unwrap();
        assert_eq!(cached.document.id.as_deref(), Some("a"));
        assert_eq!(client.source().fetches(), 2);
    }

    #[tokio::test]
    async fn failure_without_cache_is_an_error() {
        let client =
            CachedTimetableClient::new(MockSource::new(Vec::new()), &CacheConfig::default());

        assert!(client.fetch_timetable_data(false).await.is_err());
        assert!(client.cached().await.is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let config = CacheConfig::default().with_ttl(Duration::from_millis(50));
        let client =
            CachedTimetableClient::new(MockSource::new(vec![Ok(doc("a")), Ok(doc("b"))]), &config);

        client.fetch_timetable_data(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let second = client.fetch_timetable_data(false).await.unwrap();

        assert_eq!(client.source().fetches(), 2);
        assert_eq!(second.document.id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn invalidate_forces_fetch() {
        let client = CachedTimetableClient::new(
            MockSource::new(vec![Ok(doc("a")), Ok(doc("b"))]),
            &CacheConfig::default(),
        );

        client.fetch_timetable_data(false).await.unwrap();
        client.invalidate_cache();
        let second = client.fetch_timetable_data(false).await.unwrap();

        assert_eq!(second.document.id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn catalog_failure_is_empty() {
        let client =
            CachedTimetableClient::new(MockSource::new(Vec::new()), &CacheConfig::default());
        assert!(client.list_available_timetables().await.is_empty());
    }

    #[tokio::test]
    async fn catalog_passes_summaries_through() {
        let mut source = MockSource::new(Vec::new());
        source.listing = Some(vec![TimetableSummary {
            id: Some("x".into()),
            ..Default::default()
        }]);
        let client = CachedTimetableClient::new(source, &CacheConfig::default());

        let summaries = client.list_available_timetables().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id.as_deref(), Some("x"));
    }

    #[test]
    fn age_is_measured_from_fetch() {
        let cached = CachedTimetable {
            fetched_at: Utc::now() - chrono::Duration::seconds(10),
            document: Arc::new(doc("a")),
        };
        assert!(cached.age_secs() >= 10.0);
    }
}
