//! Content entity types served by the gateway.
//!
//! The entity set is fixed: every public read endpoint, cache tag, and TTL
//! policy is keyed by one of these variants. Webhook collections map onto
//! the same set, with embedded collections folded into their parent tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A content category exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Hotels,
    Destinations,
    Categories,
    Pages,
    Translations,
    Rooms,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Hotels,
        EntityType::Destinations,
        EntityType::Categories,
        EntityType::Pages,
        EntityType::Translations,
        EntityType::Rooms,
    ];

    /// Path segment, upstream collection name, and canonical cache tag.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Hotels => "hotels",
            EntityType::Destinations => "destinations",
            EntityType::Categories => "categories",
            EntityType::Pages => "pages",
            EntityType::Translations => "translations",
            EntityType::Rooms => "rooms",
        }
    }

    /// Tag attached to every cache entry for this entity type.
    pub fn tag(self) -> &'static str {
        self.as_str()
    }

    /// Tag purged when the given upstream collection changes.
    ///
    /// Embedded collections invalidate the entity that embeds them: hotel
    /// payloads carry room data, so a `rooms` mutation purges `hotels`.
    /// Unknown collections fall through to the raw name, which degrades to
    /// a no-op purge rather than an error.
    pub fn tag_for_collection(collection: &str) -> &str {
        match collection {
            "rooms" => EntityType::Hotels.tag(),
            other => match EntityType::from_str(other) {
                Ok(entity) => entity.tag(),
                Err(_) => other,
            },
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a path segment names no known entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityType(pub String);

impl fmt::Display for UnknownEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity type `{}`", self.0)
    }
}

impl std::error::Error for UnknownEntityType {}

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hotels" => Ok(EntityType::Hotels),
            "destinations" => Ok(EntityType::Destinations),
            "categories" => Ok(EntityType::Categories),
            "pages" => Ok(EntityType::Pages),
            "translations" => Ok(EntityType::Translations),
            "rooms" => Ok(EntityType::Rooms),
            other => Err(UnknownEntityType(other.to_string())),
        }
    }
}
