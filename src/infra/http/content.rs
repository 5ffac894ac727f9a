//! Public read endpoints for the content entity types.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use portico_api_types::{DataEnvelope, ListMeta};
use serde::Deserialize;

use crate::application::source::{ContentQuery, SortField};
use crate::domain::entities::EntityType;

use super::GatewayState;
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// CSV of field names, `-` prefix for descending.
    pub sort: Option<String>,
    /// JSON predicate tree, forwarded to the upstream filter syntax.
    pub filter: Option<String>,
    /// CSV of field selectors.
    pub fields: Option<String>,
    pub locale: Option<String>,
    #[serde(rename = "bypassCache")]
    pub bypass_cache: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ItemParams {
    pub locale: Option<String>,
    #[serde(rename = "bypassCache")]
    pub bypass_cache: Option<bool>,
}

pub async fn list_entities(
    State(state): State<GatewayState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let entity = parse_entity(&entity)?;
    let query = build_query(params)?;

    let data = state
        .content
        .list(entity, &query)
        .await
        .map_err(|err| ApiError::from_fetch("infra::http::content::list", err))?;

    let meta = ListMeta {
        limit: query.limit,
        offset: query.offset,
        count: data.as_array().map_or(1, Vec::len),
    };
    let ttl = state.content.config().ttl_seconds_for(entity);
    Ok(cacheable(ttl, Json(DataEnvelope::list(data, meta))))
}

pub async fn get_entity(
    State(state): State<GatewayState>,
    Path((entity, id_or_slug)): Path<(String, String)>,
    Query(params): Query<ItemParams>,
) -> Result<Response, ApiError> {
    let entity = parse_entity(&entity)?;

    let found = state
        .content
        .find_one(
            entity,
            &id_or_slug,
            params.locale.as_deref(),
            params.bypass_cache.unwrap_or(false),
        )
        .await
        .map_err(|err| ApiError::from_fetch("infra::http::content::get", err))?;

    match found {
        Some(data) => {
            let ttl = state.content.config().ttl_seconds_for(entity);
            Ok(cacheable(ttl, Json(DataEnvelope::item(data))))
        }
        None => Err(ApiError::not_found(format!(
            "{entity} `{id_or_slug}` not found"
        ))),
    }
}

fn parse_entity(segment: &str) -> Result<EntityType, ApiError> {
    segment
        .parse()
        .map_err(|err: crate::domain::entities::UnknownEntityType| {
            ApiError::not_found(err.to_string())
        })
}

fn build_query(params: ListParams) -> Result<ContentQuery, ApiError> {
    let filter = match params.filter.as_deref() {
        Some(raw) => Some(
            serde_json::from_str(raw)
                .map_err(|err| ApiError::bad_request(format!("invalid filter: {err}")))?,
        ),
        None => None,
    };

    let sort = params
        .sort
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .filter(|part| !part.is_empty())
                .map(SortField::parse)
                .collect()
        })
        .unwrap_or_default();

    let fields = params
        .fields
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(ContentQuery {
        limit: params.limit,
        offset: params.offset,
        sort,
        filter,
        fields,
        locale: params.locale,
        bypass_cache: params.bypass_cache.unwrap_or(false),
    })
}

/// Success responses advertise the entity's TTL policy to downstream caches.
fn cacheable(ttl_seconds: u64, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    if let Ok(value) =
        header::HeaderValue::from_str(&format!("s-maxage={ttl_seconds}, stale-while-revalidate"))
    {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}
