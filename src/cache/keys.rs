//! Cache key derivation.
//!
//! A key is the entity type plus a hash over every request parameter that
//! changes the upstream response. Identical logical requests always derive
//! the same key; any differing filter/sort/pagination/locale derives a
//! different one, so the cache can never answer for the wrong query.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::application::source::ContentQuery;
use crate::domain::entities::EntityType;

/// Identifies one cached upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity: EntityType,
    pub variant: u64,
}

impl CacheKey {
    pub fn new(entity: EntityType, variant: u64) -> Self {
        Self { entity, variant }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.entity, self.variant)
    }
}

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Key for a list request.
pub fn list_key(entity: EntityType, query: &ContentQuery) -> CacheKey {
    let mut hasher = DefaultHasher::new();
    "list".hash(&mut hasher);
    hash_query_into(query, &mut hasher);
    CacheKey::new(entity, hasher.finish())
}

/// Key for a single-item request.
pub fn item_key(entity: EntityType, id_or_slug: &str, locale: Option<&str>) -> CacheKey {
    let mut hasher = DefaultHasher::new();
    "item".hash(&mut hasher);
    id_or_slug.hash(&mut hasher);
    locale.hash(&mut hasher);
    CacheKey::new(entity, hasher.finish())
}

fn hash_query_into(query: &ContentQuery, hasher: &mut DefaultHasher) {
    query.limit.hash(hasher);
    query.offset.hash(hasher);
    for sort in &query.sort {
        sort.field.hash(hasher);
        sort.descending.hash(hasher);
    }
    query.fields.hash(hasher);
    query.locale.hash(hasher);
    // serde_json maps are BTree-backed, so this string form is canonical
    // regardless of the order filter keys arrived in.
    query.filter.as_ref().map(|f| f.to_string()).hash(hasher);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::application::source::SortField;

    use super::*;

    #[test]
    fn identical_queries_derive_identical_keys() {
        let query = ContentQuery {
            limit: Some(10),
            offset: Some(20),
            sort: vec![SortField::parse("-published_at")],
            filter: Some(json!({ "destination": { "_eq": "lisbon" } })),
            fields: vec!["name".to_string(), "slug".to_string()],
            locale: Some("pt-PT".to_string()),
            bypass_cache: false,
        };

        let first = list_key(EntityType::Hotels, &query);
        let second = list_key(EntityType::Hotels, &query.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn differing_pagination_derives_different_keys() {
        let base = ContentQuery::default();
        let paged = ContentQuery {
            offset: Some(20),
            ..ContentQuery::default()
        };

        assert_ne!(
            list_key(EntityType::Hotels, &base),
            list_key(EntityType::Hotels, &paged)
        );
    }

    #[test]
    fn filter_key_order_does_not_change_the_key() {
        let ab = ContentQuery {
            filter: serde_json::from_str(r#"{"a":1,"b":2}"#).ok(),
            ..ContentQuery::default()
        };
        let ba = ContentQuery {
            filter: serde_json::from_str(r#"{"b":2,"a":1}"#).ok(),
            ..ContentQuery::default()
        };

        assert_eq!(
            list_key(EntityType::Pages, &ab),
            list_key(EntityType::Pages, &ba)
        );
    }

    #[test]
    fn bypass_flag_does_not_change_the_key() {
        let plain = ContentQuery::default();
        let bypassed = ContentQuery {
            bypass_cache: true,
            ..ContentQuery::default()
        };

        assert_eq!(
            list_key(EntityType::Rooms, &plain),
            list_key(EntityType::Rooms, &bypassed)
        );
    }

    #[test]
    fn item_and_list_keys_never_collide_for_same_entity() {
        let query = ContentQuery::default();
        assert_ne!(
            list_key(EntityType::Hotels, &query),
            item_key(EntityType::Hotels, "grand-palace", None)
        );
    }

    #[test]
    fn item_key_distinguishes_locale() {
        assert_ne!(
            item_key(EntityType::Pages, "imprint", Some("de-DE")),
            item_key(EntityType::Pages, "imprint", None)
        );
    }
}
