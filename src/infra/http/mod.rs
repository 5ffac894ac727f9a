//! HTTP surface: public read endpoints, cache administration, webhooks.

pub mod content;
pub mod error;
pub mod middleware;
pub mod revalidate;
pub mod webhooks;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

use crate::application::content::ContentService;
use crate::config::AdminSettings;

#[derive(Clone)]
pub struct GatewayState {
    pub content: Arc<ContentService>,
    pub admin: Arc<AdminSettings>,
    pub started_at: OffsetDateTime,
}

impl GatewayState {
    pub fn new(content: Arc<ContentService>, admin: AdminSettings) -> Self {
        Self {
            content,
            admin: Arc::new(admin),
            started_at: OffsetDateTime::now_utc(),
        }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route(
            "/api/revalidate",
            get(revalidate::stats).post(revalidate::purge),
        )
        .route("/api/webhooks/directus", post(webhooks::directus))
        .route("/api/{entity}", get(content::list_entities))
        .route("/api/{entity}/{id_or_slug}", get(content::get_entity))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Compare a provided secret against the configured one.
///
/// Digest-then-compare keeps the comparison constant-time and uniform: an
/// unconfigured secret, a missing token, and a wrong token are all the same
/// mismatch to the caller.
pub(crate) fn secret_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    let (Some(expected), Some(provided)) = (expected, provided) else {
        return false;
    };
    let expected = Sha256::digest(expected.as_bytes());
    let provided = Sha256::digest(provided.as_bytes());
    expected[..].ct_eq(&provided[..]).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secrets_pass() {
        assert!(secret_matches(Some("s3cret"), Some("s3cret")));
    }

    #[test]
    fn mismatched_secrets_fail() {
        assert!(!secret_matches(Some("s3cret"), Some("guess")));
    }

    #[test]
    fn unconfigured_secret_never_matches() {
        assert!(!secret_matches(None, Some("anything")));
        assert!(!secret_matches(Some("s3cret"), None));
        assert!(!secret_matches(None, None));
    }
}
