//! CMS webhook endpoint.
//!
//! Receives change notifications and triggers the mapped tag purge.
//! Replaying an event is harmless: later reads simply repopulate from the
//! backend, so the handler is idempotent by construction.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use portico_api_types::{WebhookAck, WebhookEvent};
use serde_json::Value;

use crate::domain::entities::EntityType;

use super::error::ApiError;
use super::{GatewayState, secret_matches};

pub async fn directus(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let token = bearer_token(&headers);
    if !secret_matches(state.admin.webhook_secret.as_deref(), token.as_deref()) {
        return Err(ApiError::invalid_token());
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request(format!("invalid body: {err}")))?;

    let event_name = event
        .event
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing `event` field"))?;
    let collection = event
        .collection
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing `collection` field"))?;

    let item_id = event.item.as_ref().and_then(item_identifier);
    let tag = EntityType::tag_for_collection(&collection).to_string();
    let purged = state.content.purge(&tag, item_id.as_deref());

    Ok(Json(WebhookAck {
        event: event_name,
        collection,
        invalidated: tag,
        purged,
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    raw.strip_prefix("Bearer ").map(str::to_string)
}

/// Directus delivers `item` as an id, a list of ids, or the full record.
fn item_identifier(item: &Value) -> Option<String> {
    match item {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        Value::Array(ids) => ids.first().and_then(item_identifier),
        Value::Object(record) => record.get("id").and_then(item_identifier),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn item_identifier_handles_directus_shapes() {
        assert_eq!(item_identifier(&json!("r1")), Some("r1".to_string()));
        assert_eq!(item_identifier(&json!(7)), Some("7".to_string()));
        assert_eq!(item_identifier(&json!(["a", "b"])), Some("a".to_string()));
        assert_eq!(
            item_identifier(&json!({ "id": "r1", "name": "Suite" })),
            Some("r1".to_string())
        );
        assert_eq!(item_identifier(&json!(null)), None);
    }
}
