//! Cache configuration.
//!
//! Controls the per-entity-type TTL policy and sweep cadence via
//! `portico.toml`.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::entities::EntityType;

// Default values for cache configuration
const DEFAULT_TTL_HOTELS_SECS: u64 = 3_600;
const DEFAULT_TTL_DESTINATIONS_SECS: u64 = 3_600;
const DEFAULT_TTL_CATEGORIES_SECS: u64 = 7_200;
const DEFAULT_TTL_PAGES_SECS: u64 = 3_600;
const DEFAULT_TTL_TRANSLATIONS_SECS: u64 = 86_400;
const DEFAULT_TTL_ROOMS_SECS: u64 = 1_800;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;

/// Cache configuration from `portico.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the read-through cache; when off every request hits upstream.
    pub enabled: bool,
    /// TTL for hotel entries, in seconds.
    pub ttl_hotels_seconds: u64,
    /// TTL for destination entries, in seconds.
    pub ttl_destinations_seconds: u64,
    /// TTL for category entries, in seconds.
    pub ttl_categories_seconds: u64,
    /// TTL for page entries, in seconds.
    pub ttl_pages_seconds: u64,
    /// TTL for translation entries, in seconds.
    pub ttl_translations_seconds: u64,
    /// TTL for room entries, in seconds.
    pub ttl_rooms_seconds: u64,
    /// Expired-entry sweep interval (ms); hygiene only, never correctness.
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hotels_seconds: DEFAULT_TTL_HOTELS_SECS,
            ttl_destinations_seconds: DEFAULT_TTL_DESTINATIONS_SECS,
            ttl_categories_seconds: DEFAULT_TTL_CATEGORIES_SECS,
            ttl_pages_seconds: DEFAULT_TTL_PAGES_SECS,
            ttl_translations_seconds: DEFAULT_TTL_TRANSLATIONS_SECS,
            ttl_rooms_seconds: DEFAULT_TTL_ROOMS_SECS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_hotels_seconds: settings.ttl_hotels_seconds,
            ttl_destinations_seconds: settings.ttl_destinations_seconds,
            ttl_categories_seconds: settings.ttl_categories_seconds,
            ttl_pages_seconds: settings.ttl_pages_seconds,
            ttl_translations_seconds: settings.ttl_translations_seconds,
            ttl_rooms_seconds: settings.ttl_rooms_seconds,
            sweep_interval_ms: settings.sweep_interval_ms,
        }
    }
}

impl CacheConfig {
    /// TTL policy for one entity type.
    pub fn ttl_for(&self, entity: EntityType) -> Duration {
        let seconds = self.ttl_seconds_for(entity);
        Duration::from_secs(seconds)
    }

    /// TTL in whole seconds, as advertised in `Cache-Control` headers.
    pub fn ttl_seconds_for(&self, entity: EntityType) -> u64 {
        match entity {
            EntityType::Hotels => self.ttl_hotels_seconds,
            EntityType::Destinations => self.ttl_destinations_seconds,
            EntityType::Categories => self.ttl_categories_seconds,
            EntityType::Pages => self.ttl_pages_seconds,
            EntityType::Translations => self.ttl_translations_seconds,
            EntityType::Rooms => self.ttl_rooms_seconds,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl_hotels_seconds, 3_600);
        assert_eq!(config.ttl_destinations_seconds, 3_600);
        assert_eq!(config.ttl_categories_seconds, 7_200);
        assert_eq!(config.ttl_pages_seconds, 3_600);
        assert_eq!(config.ttl_translations_seconds, 86_400);
        assert_eq!(config.ttl_rooms_seconds, 1_800);
        assert_eq!(config.sweep_interval_ms, 60_000);
    }

    #[test]
    fn ttl_policy_tracks_entity_type() {
        let config = CacheConfig {
            ttl_rooms_seconds: 42,
            ..Default::default()
        };
        assert_eq!(
            config.ttl_for(EntityType::Rooms),
            Duration::from_secs(42)
        );
        assert_eq!(config.ttl_seconds_for(EntityType::Translations), 86_400);
    }

    #[test]
    fn sweep_interval_never_zero() {
        let config = CacheConfig {
            sweep_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_millis(1));
    }
}
