//! Fragrance Note Catalog
//!
//! Looks up a perfume's note pyramid in an external catalog.
//! Lookups are keyed by a normalized query and cached with a bounded TTL
//! cache; failures are typed so callers can tell "not listed" apart from
//! "site unreachable" or "page layout changed".

pub mod cache;
pub mod fragrantica;

use async_trait::async_trait;
use serde::ser::{Serialize, Serializer};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use cache::TtlCache;
pub use fragrantica::{FragranticaSource, HttpFetcher, PageFetcher};

/// Note categories in page order, each with its notes in page order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteProfile {
    categories: Vec<(String, Vec<String>)>,
}

impl NoteProfile {
    /// Create an empty profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category. An existing category keeps its position and gets the new notes.
    pub fn insert(&mut self, category: impl Into<String>, notes: Vec<String>) {
        let category = category.into();
        if let Some(existing) = self.categories.iter_mut().find(|(name, _)| *name == category) {
            existing.1 = notes;
        } else {
            self.categories.push((category, notes));
        }
    }

    /// Notes for a category
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, notes)| notes.as_slice())
    }

    /// Category names in page order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no categories were found
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Serialize for NoteProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.categories.iter().map(|(name, notes)| (name, notes)))
    }
}

/// A successful catalog lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Notes parsed from the perfume's page
    pub notes: NoteProfile,
    /// Page the notes were taken from
    pub url: String,
}

/// Catalog lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No search result for the query
    #[error("Could not find perfume \"{query}\" on Fragrantica.")]
    NotFound { query: String },
    /// The perfume page has no note pyramid
    #[error("Could not find the fragrance pyramid on the page.")]
    StructureMissing,
    /// Network or HTTP failure
    #[error("Error fetching from Fragrantica: {0}")]
    Transport(String),
    /// Unexpected document shape
    #[error("An error occurred during scraping: {0}")]
    Parse(String),
}

impl CatalogError {
    /// Stable identifier for the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::StructureMissing => "structure_missing",
            CatalogError::Transport(_) => "transport",
            CatalogError::Parse(_) => "parse",
        }
    }
}

/// Outcome of a catalog lookup
pub type CatalogResult = Result<CatalogEntry, CatalogError>;

/// Uncached source of note profiles
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Look up notes for an already-normalized query
    async fn fetch_notes(&self, query: &str) -> CatalogResult;
}

/// Normalize a perfume name into a cache key / search query.
///
/// Lower-cases, turns `-` and `_` into spaces and collapses whitespace.
pub fn normalize_query(name: &str) -> String {
    name.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cached note catalog
///
/// The cache is injected so it can be shared or swapped without touching
/// lookup logic.
#[derive(Clone)]
pub struct NoteCatalog {
    source: Arc<dyn NoteSource>,
    cache: Arc<TtlCache<CatalogResult>>,
    cache_failures: bool,
}

impl NoteCatalog {
    /// Create a catalog over `source` using `cache`
    pub fn new(
        source: Arc<dyn NoteSource>,
        cache: Arc<TtlCache<CatalogResult>>,
        cache_failures: bool,
    ) -> Self {
        Self {
            source,
            cache,
            cache_failures,
        }
    }

    /// Look up notes for `name`, serving from cache while the entry is live
    pub async fn lookup(&self, name: &str) -> CatalogResult {
        let key = normalize_query(name);
        if key.is_empty() {
            return Err(CatalogError::NotFound {
                query: name.to_string(),
            });
        }

        if let Some(cached) = self.cache.get(&key) {
            debug!("Catalog cache hit for '{}'", key);
            return cached;
        }

        debug!("Catalog cache miss for '{}'", key);
        let result = self.source.fetch_notes(&key).await;

        match &result {
            Ok(entry) => info!(
                "Catalog lookup '{}' found {} note categories at {}",
                key,
                entry.notes.len(),
                entry.url
            ),
            Err(e) => warn!("Catalog lookup '{}' failed: {}", key, e),
        }

        if result.is_ok() || self.cache_failures {
            self.cache.insert(key, result.clone());
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source that counts calls and answers from a fixed script
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NoteSource for CountingSource {
        async fn fetch_notes(&self, query: &str) -> CatalogResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogError::NotFound {
                    query: query.to_string(),
                });
            }
            let mut notes = NoteProfile::new();
            notes.insert("Top Notes", vec![query.to_string()]);
            Ok(CatalogEntry {
                notes,
                url: format!("https://example.test/{}", query.replace(' ', "-")),
            })
        }
    }

    fn catalog(
        source: Arc<CountingSource>,
        capacity: usize,
        ttl: Duration,
        cache_failures: bool,
    ) -> NoteCatalog {
        NoteCatalog::new(source, Arc::new(TtlCache::new(capacity, ttl)), cache_failures)
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("Aventus"), "aventus");
        assert_eq!(normalize_query("  Chanel-No_5  "), "chanel no 5");
        assert_eq!(normalize_query("Bleu  de\tChanel"), "bleu de chanel");
        assert_eq!(normalize_query(" - "), "");
    }

    #[test]
    fn test_note_profile_preserves_order() {
        let mut profile = NoteProfile::new();
        profile.insert("Top Notes", vec!["Bergamot".to_string()]);
        profile.insert("Middle Notes", vec!["Rose".to_string()]);
        profile.insert("Base Notes", vec!["Musk".to_string(), "Amber".to_string()]);

        let categories: Vec<_> = profile.categories().collect();
        assert_eq!(categories, vec!["Top Notes", "Middle Notes", "Base Notes"]);
        assert_eq!(profile.get("Base Notes").unwrap(), ["Musk", "Amber"]);

        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(
            json,
            r#"{"Top Notes":["Bergamot"],"Middle Notes":["Rose"],"Base Notes":["Musk","Amber"]}"#
        );
    }

    #[test]
    fn test_note_profile_replace_keeps_position() {
        let mut profile = NoteProfile::new();
        profile.insert("Top Notes", vec!["A".to_string()]);
        profile.insert("Base Notes", vec!["B".to_string()]);
        profile.insert("Top Notes", vec!["C".to_string()]);

        assert_eq!(profile.len(), 2);
        assert_eq!(profile.categories().next(), Some("Top Notes"));
        assert_eq!(profile.get("Top Notes").unwrap(), ["C"]);
    }

    #[test]
    fn test_empty_profile_serializes_as_object() {
        assert_eq!(serde_json::to_string(&NoteProfile::new()).unwrap(), "{}");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CatalogError::NotFound { query: "x".into() }.kind(), "not_found");
        assert_eq!(CatalogError::StructureMissing.kind(), "structure_missing");
        assert_eq!(CatalogError::Transport("x".into()).kind(), "transport");
        assert_eq!(CatalogError::Parse("x".into()).kind(), "parse");
        assert_eq!(
            CatalogError::NotFound { query: "Aventus".into() }.to_string(),
            "Could not find perfume \"Aventus\" on Fragrantica."
        );
    }

    #[tokio::test]
    async fn test_lookup_hits_cache_within_ttl() {
        let source = CountingSource::new(false);
        let catalog = catalog(source.clone(), 8, Duration::from_secs(60), true);

        let first = catalog.lookup("Aventus").await.unwrap();
        let second = catalog.lookup("aventus ").await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_lookup_refetches_after_expiry() {
        let source = CountingSource::new(false);
        let catalog = catalog(source.clone(), 8, Duration::ZERO, true);

        catalog.lookup("Aventus").await.unwrap();
        catalog.lookup("Aventus").await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_evicted_key_is_fresh_miss() {
        let source = CountingSource::new(false);
        let catalog = catalog(source.clone(), 2, Duration::from_secs(60), true);

        catalog.lookup("one").await.unwrap();
        catalog.lookup("two").await.unwrap();
        catalog.lookup("three").await.unwrap();
        assert_eq!(source.calls(), 3);

        // "one" was the oldest entry and got evicted
        catalog.lookup("one").await.unwrap();
        assert_eq!(source.calls(), 4);

        // "three" is still cached
        catalog.lookup("three").await.unwrap();
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let source = CountingSource::new(true);
        let catalog = catalog(source.clone(), 8, Duration::from_secs(60), true);

        assert!(catalog.lookup("Unknown").await.is_err());
        assert!(catalog.lookup("Unknown").await.is_err());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_not_cached_when_disabled() {
        let source = CountingSource::new(true);
        let catalog = catalog(source.clone(), 8, Duration::from_secs(60), false);

        assert!(catalog.lookup("Unknown").await.is_err());
        assert!(catalog.lookup("Unknown").await.is_err());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_blank_name_skips_source() {
        let source = CountingSource::new(false);
        let catalog = catalog(source.clone(), 8, Duration::from_secs(60), true);

        assert!(matches!(
            catalog.lookup("  ").await,
            Err(CatalogError::NotFound { .. })
        ));
        assert_eq!(source.calls(), 0);
    }
}
