//! Shared request and response types for the portico content gateway API.
//!
//! These types define the wire contract between the gateway and its clients:
//! the `{ data, meta? }` success envelope, the `{ error, message? }` error
//! envelope, cache statistics, and the revalidation/webhook payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Success envelope for read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope {
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ListMeta>,
}

impl DataEnvelope {
    pub fn item(data: Value) -> Self {
        Self { data, meta: None }
    }

    pub fn list(data: Value, meta: ListMeta) -> Self {
        Self {
            data,
            meta: Some(meta),
        }
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Number of records in this response, not the collection total.
    pub count: usize,
}

/// Error envelope for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Cache statistics reported by `GET /api/revalidate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsBody {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub purged: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
}

/// Body of `POST /api/revalidate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevalidateRequest {
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(rename = "entityId", skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// Summary returned after a successful purge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub invalidated: String,
    pub purged: usize,
}

/// Change notification delivered by the CMS webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub item: Option<Value>,
}

/// Acknowledgement returned to the CMS after processing a webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub event: String,
    pub collection: String,
    pub invalidated: String,
    pub purged: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_body_omits_absent_message() {
        let body = ErrorBody {
            error: "not_found".to_string(),
            message: None,
        };
        let rendered = serde_json::to_value(&body).expect("serializable");
        assert_eq!(rendered, json!({ "error": "not_found" }));
    }

    #[test]
    fn revalidate_request_uses_camel_case_fields() {
        let request: RevalidateRequest =
            serde_json::from_value(json!({ "entityType": "hotels", "entityId": "h1" }))
                .expect("deserializable");
        assert_eq!(request.entity_type, "hotels");
        assert_eq!(request.entity_id.as_deref(), Some("h1"));
    }

    #[test]
    fn webhook_event_tolerates_missing_fields() {
        let event: WebhookEvent = serde_json::from_value(json!({})).expect("deserializable");
        assert!(event.event.is_none());
        assert!(event.collection.is_none());
        assert!(event.item.is_none());
    }
}
