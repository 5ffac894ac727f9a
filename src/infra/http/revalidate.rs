//! Cache administration endpoint.
//!
//! `GET /api/revalidate?token=` reports statistics; `POST` forces a tag
//! purge. Both require the configured secret; a mismatch is a uniform 401.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use portico_api_types::{CacheStatsBody, RevalidateRequest, RevalidateResponse};
use serde::Deserialize;

use crate::domain::entities::EntityType;

use super::error::ApiError;
use super::{GatewayState, secret_matches};

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

pub async fn stats(
    State(state): State<GatewayState>,
    Query(params): Query<TokenParams>,
) -> Result<Json<CacheStatsBody>, ApiError> {
    authorize(&state, params.token.as_deref())?;

    let stats = state.content.stats();
    Ok(Json(CacheStatsBody {
        entries: stats.entries,
        hits: stats.hits,
        misses: stats.misses,
        expired: stats.expired,
        purged: stats.purged,
        started_at: state.started_at,
    }))
}

pub async fn purge(
    State(state): State<GatewayState>,
    Query(params): Query<TokenParams>,
    body: Bytes,
) -> Result<Json<RevalidateResponse>, ApiError> {
    authorize(&state, params.token.as_deref())?;

    // No body (or an explicit "all") clears the whole store.
    if body.is_empty() {
        let purged = state.content.purge_all();
        return Ok(Json(RevalidateResponse {
            invalidated: "all".to_string(),
            purged,
        }));
    }

    let request: RevalidateRequest = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request(format!("invalid body: {err}")))?;

    if request.entity_type == "all" {
        let purged = state.content.purge_all();
        return Ok(Json(RevalidateResponse {
            invalidated: "all".to_string(),
            purged,
        }));
    }

    // Unknown entity types degrade to purging the raw name, a no-op when
    // nothing carries that tag.
    let tag = match request.entity_type.parse::<EntityType>() {
        Ok(entity) => entity.tag().to_string(),
        Err(_) => request.entity_type.clone(),
    };
    let purged = state.content.purge(&tag, request.entity_id.as_deref());

    Ok(Json(RevalidateResponse {
        invalidated: tag,
        purged,
    }))
}

fn authorize(state: &GatewayState, token: Option<&str>) -> Result<(), ApiError> {
    if secret_matches(state.admin.revalidate_token.as_deref(), token) {
        Ok(())
    } else {
        Err(ApiError::invalid_token())
    }
}
