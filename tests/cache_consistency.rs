//! Read-through consistency tests for the cached client.
//!
//! These exercise `ContentService` directly against a counting stub source,
//! below the HTTP layer, so the caching policy is observable without any
//! response shaping in the way.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use portico::application::content::ContentService;
use portico::application::source::{ContentQuery, ContentSource, FetchError};
use portico::cache::{CacheConfig, CacheStore};
use portico::domain::entities::EntityType;

/// Answers every list with a version-stamped payload and counts fetches.
struct CountingSource {
    version: AtomicU64,
    fetches: AtomicU64,
}

impl CountingSource {
    fn new() -> Self {
        Self {
            version: AtomicU64::new(1),
            fetches: AtomicU64::new(0),
        }
    }

    fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for CountingSource {
    async fn fetch_list(
        &self,
        entity: EntityType,
        _query: &ContentQuery,
    ) -> Result<Value, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(json!([{
            "collection": entity.as_str(),
            "version": self.version.load(Ordering::SeqCst),
        }]))
    }

    async fn fetch_one(
        &self,
        _entity: EntityType,
        id_or_slug: &str,
        _locale: Option<&str>,
    ) -> Result<Option<Value>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if id_or_slug == "missing" {
            return Ok(None);
        }
        Ok(Some(json!({ "slug": id_or_slug })))
    }
}

fn service(source: Arc<CountingSource>, config: CacheConfig) -> ContentService {
    ContentService::new(source, Arc::new(CacheStore::new()), config)
}

#[tokio::test]
async fn repeated_reads_return_identical_data_with_one_fetch() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());
    let query = ContentQuery::default();

    let first = service.list(EntityType::Hotels, &query).await.unwrap();
    let second = service.list(EntityType::Hotels, &query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn purge_forces_the_next_read_to_repopulate() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());
    let query = ContentQuery::default();

    let stale = service.list(EntityType::Hotels, &query).await.unwrap();
    source.bump_version();

    let removed = service.purge(EntityType::Hotels.tag(), Some("h1"));
    assert_eq!(removed, 1);

    let fresh = service.list(EntityType::Hotels, &query).await.unwrap();
    assert_ne!(stale, fresh);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn purge_of_one_tag_spares_other_entity_types() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());
    let query = ContentQuery::default();

    service.list(EntityType::Hotels, &query).await.unwrap();
    service.list(EntityType::Pages, &query).await.unwrap();

    service.purge(EntityType::Hotels.tag(), None);

    service.list(EntityType::Pages, &query).await.unwrap();
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn rooms_collection_change_purges_hotel_entries() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());
    let query = ContentQuery::default();

    service.list(EntityType::Hotels, &query).await.unwrap();

    let tag = EntityType::tag_for_collection("rooms");
    let removed = service.purge(tag, Some("r1"));
    assert_eq!(removed, 1);

    service.list(EntityType::Hotels, &query).await.unwrap();
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn bypass_refetches_then_populates_for_plain_reads() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());

    let plain = ContentQuery::default();
    let bypass = ContentQuery {
        bypass_cache: true,
        ..ContentQuery::default()
    };

    service.list(EntityType::Hotels, &plain).await.unwrap();
    source.bump_version();

    let refreshed = service.list(EntityType::Hotels, &bypass).await.unwrap();
    assert_eq!(refreshed[0]["version"], 2);
    assert_eq!(source.fetch_count(), 2);

    let observed = service.list(EntityType::Hotels, &plain).await.unwrap();
    assert_eq!(observed[0]["version"], 2);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn disabled_cache_always_fetches() {
    let source = Arc::new(CountingSource::new());
    let config = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };
    let service = service(source.clone(), config);
    let query = ContentQuery::default();

    service.list(EntityType::Hotels, &query).await.unwrap();
    service.list(EntityType::Hotels, &query).await.unwrap();

    assert_eq!(source.fetch_count(), 2);
    assert_eq!(service.stats().entries, 0);
}

#[tokio::test]
async fn found_items_are_cached_but_absent_items_are_not() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());

    let found = service
        .find_one(EntityType::Hotels, "grand-palace", None, false)
        .await
        .unwrap();
    assert!(found.is_some());

    service
        .find_one(EntityType::Hotels, "grand-palace", None, false)
        .await
        .unwrap();
    assert_eq!(source.fetch_count(), 1);

    // Absent records refetch every time: no negative entries.
    let missing = service
        .find_one(EntityType::Hotels, "missing", None, false)
        .await
        .unwrap();
    assert!(missing.is_none());

    service
        .find_one(EntityType::Hotels, "missing", None, false)
        .await
        .unwrap();
    assert_eq!(source.fetch_count(), 3);
}

#[tokio::test]
async fn locale_variants_are_cached_independently() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());

    service
        .find_one(EntityType::Pages, "imprint", Some("de-DE"), false)
        .await
        .unwrap();
    service
        .find_one(EntityType::Pages, "imprint", Some("fr-FR"), false)
        .await
        .unwrap();
    service
        .find_one(EntityType::Pages, "imprint", Some("de-DE"), false)
        .await
        .unwrap();

    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn stats_track_hits_misses_and_purges() {
    let source = Arc::new(CountingSource::new());
    let service = service(source.clone(), CacheConfig::default());
    let query = ContentQuery::default();

    service.list(EntityType::Hotels, &query).await.unwrap();
    service.list(EntityType::Hotels, &query).await.unwrap();
    service.purge_all();

    let stats = service.stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.purged, 1);
}
