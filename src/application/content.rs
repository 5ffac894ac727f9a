//! The cached read-through client.
//!
//! `ContentService` is the only component that talks to both the cache
//! store and the content source. It derives cache keys, serves hits,
//! populates on miss with the entity's TTL and tag, and exposes the
//! tag-granular purge used by the webhook and revalidate endpoints.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{CacheConfig, CacheStats, CacheStore, item_key, list_key};
use crate::domain::entities::EntityType;

use super::source::{ContentQuery, ContentSource, FetchError};

pub struct ContentService {
    source: Arc<dyn ContentSource>,
    store: Arc<CacheStore>,
    config: CacheConfig,
}

impl ContentService {
    pub fn new(source: Arc<dyn ContentSource>, store: Arc<CacheStore>, config: CacheConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fetch a list of records, served from cache when possible.
    ///
    /// A backend failure propagates unmodified; nothing is cached on
    /// failure and any previously cached value is left intact.
    pub async fn list(
        &self,
        entity: EntityType,
        query: &ContentQuery,
    ) -> Result<serde_json::Value, FetchError> {
        let key = list_key(entity, query);

        if self.config.enabled && !query.bypass_cache {
            if let Some(hit) = self.store.get(&key) {
                debug!(
                    target = "portico::content",
                    entity = %entity,
                    key = %key,
                    "cache hit"
                );
                return Ok(hit);
            }
        }

        let fresh = self.source.fetch_list(entity, query).await?;
        if self.config.enabled {
            self.store.set(
                key,
                fresh.clone(),
                self.config.ttl_for(entity),
                &[entity.tag()],
            );
        }
        Ok(fresh)
    }

    /// Fetch one record by identifier or slug.
    ///
    /// Only found records are cached; an absent record returns `Ok(None)`
    /// every time so that newly published content appears without waiting
    /// out a negative entry.
    pub async fn find_one(
        &self,
        entity: EntityType,
        id_or_slug: &str,
        locale: Option<&str>,
        bypass_cache: bool,
    ) -> Result<Option<serde_json::Value>, FetchError> {
        let key = item_key(entity, id_or_slug, locale);

        if self.config.enabled && !bypass_cache {
            if let Some(hit) = self.store.get(&key) {
                debug!(
                    target = "portico::content",
                    entity = %entity,
                    key = %key,
                    "cache hit"
                );
                return Ok(Some(hit));
            }
        }

        let fetched = self.source.fetch_one(entity, id_or_slug, locale).await?;
        if let Some(found) = &fetched {
            if self.config.enabled {
                self.store.set(
                    key,
                    found.clone(),
                    self.config.ttl_for(entity),
                    &[entity.tag()],
                );
            }
        }
        Ok(fetched)
    }

    /// Purge every entry carrying `tag`.
    ///
    /// Invalidation is tag-granular by design; `entity_id` is advisory
    /// metadata recorded in the log line and nothing narrower is removed.
    pub fn purge(&self, tag: &str, entity_id: Option<&str>) -> usize {
        let removed = self.store.invalidate_tag(tag);
        info!(
            target = "portico::content",
            tag,
            entity_id = entity_id.unwrap_or(""),
            removed,
            "cache tag purged"
        );
        removed
    }

    /// Drop the entire store.
    pub fn purge_all(&self) -> usize {
        let removed = self.store.clear();
        info!(target = "portico::content", removed, "cache cleared");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}
