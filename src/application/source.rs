//! Content source trait describing the upstream adapter.
//!
//! The cached client talks to the backend only through this seam, so tests
//! can substitute an in-memory fake. "Not found" is an explicit `Ok(None)`
//! at this boundary, never an error: callers can always distinguish absent
//! content from transport failure.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::EntityType;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream transport failure: {0}")]
    Transport(String),
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transient failures are eligible for the adapter's single retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Timeout)
    }
}

/// One sort criterion, optionally descending (`-field` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl SortField {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: raw.to_string(),
                descending: false,
            },
        }
    }

    pub fn to_query(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Normalized request parameters for a list fetch.
#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Vec<SortField>,
    /// Structured predicate tree in the upstream's filter syntax.
    pub filter: Option<Value>,
    pub fields: Vec<String>,
    pub locale: Option<String>,
    /// Skip the cache lookup; the fresh result still populates the cache.
    pub bypass_cache: bool,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch an ordered page of records for one collection.
    async fn fetch_list(
        &self,
        entity: EntityType,
        query: &ContentQuery,
    ) -> Result<Value, FetchError>;

    /// Fetch one record by identifier or slug; `None` when it does not exist.
    async fn fetch_one(
        &self,
        entity: EntityType,
        id_or_slug: &str,
        locale: Option<&str>,
    ) -> Result<Option<Value>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_parses_descending_marker() {
        let sort = SortField::parse("-published_at");
        assert!(sort.descending);
        assert_eq!(sort.field, "published_at");
        assert_eq!(sort.to_query(), "-published_at");
    }

    #[test]
    fn sort_field_parses_ascending_default() {
        let sort = SortField::parse("name");
        assert!(!sort.descending);
        assert_eq!(sort.to_query(), "name");
    }

    #[test]
    fn transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Transport("reset".into()).is_transient());
        assert!(
            !FetchError::Status {
                status: 500,
                message: "boom".into()
            }
            .is_transient()
        );
        assert!(!FetchError::Decode("bad json".into()).is_transient());
    }
}
