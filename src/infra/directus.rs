//! Directus item-API fetch adapter.
//!
//! Translates a normalized `ContentQuery` into `GET /items/{collection}`
//! requests and normalizes the `{ "data": ... }` envelope. Not-found is an
//! explicit `Ok(None)`; every other failure surfaces as a typed
//! `FetchError` carrying the upstream status and message.

use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;
use url::Url;

use crate::application::source::{ContentQuery, ContentSource, FetchError};
use crate::config::UpstreamSettings;
use crate::domain::entities::EntityType;

use super::error::InfraError;

pub struct DirectusSource {
    client: Client,
    base: Url,
    token: Option<String>,
    retry_transient: bool,
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    data: Value,
}

impl DirectusSource {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let raw_base = settings
            .base_url
            .as_deref()
            .ok_or_else(|| InfraError::configuration("upstream base url is not configured"))?;
        let base = Url::parse(raw_base)
            .and_then(|url| url.join("/"))
            .map_err(|err| {
                InfraError::configuration(format!("invalid upstream base url: {err}"))
            })?;

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::upstream(err.to_string()))?;

        Ok(Self {
            client,
            base,
            token: settings.token.clone(),
            retry_transient: settings.retry_transient,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("portico/", env!("CARGO_PKG_VERSION"))
    }

    fn items_url(&self, entity: EntityType, query: &ContentQuery) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join(&format!("items/{entity}"))
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        append_query(&mut url, query);
        Ok(url)
    }

    fn item_url(
        &self,
        entity: EntityType,
        id: &str,
        locale: Option<&str>,
    ) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join(&format!("items/{entity}/{id}"))
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        if let Some(locale) = locale {
            url.query_pairs_mut()
                .append_pair("deep", &deep_locale_filter(locale).to_string());
        }
        Ok(url)
    }

    async fn get_data(&self, url: Url) -> Result<Value, FetchError> {
        let started = Instant::now();
        let mut result = self.request(url.clone()).await;

        if let Err(err) = &result {
            if self.retry_transient && err.is_transient() {
                counter!("portico_upstream_retry_total").increment(1);
                warn!(
                    target = "portico::directus",
                    url = %url,
                    error = %err,
                    "retrying transient upstream failure"
                );
                result = self.request(url).await;
            }
        }

        histogram!("portico_upstream_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        result
    }

    async fn request(&self, url: Url) -> Result<Value, FetchError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ItemsEnvelope = response
            .json()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ContentSource for DirectusSource {
    async fn fetch_list(
        &self,
        entity: EntityType,
        query: &ContentQuery,
    ) -> Result<Value, FetchError> {
        let url = self.items_url(entity, query)?;
        self.get_data(url).await
    }

    async fn fetch_one(
        &self,
        entity: EntityType,
        id_or_slug: &str,
        locale: Option<&str>,
    ) -> Result<Option<Value>, FetchError> {
        if is_item_id(id_or_slug) {
            let url = self.item_url(entity, id_or_slug, locale)?;
            match self.get_data(url).await {
                Ok(Value::Null) => Ok(None),
                Ok(value) => Ok(Some(value)),
                // Directus reports missing ids as FORBIDDEN to avoid
                // existence probes; both read as "not found" here.
                Err(FetchError::Status {
                    status: 403 | 404, ..
                }) => Ok(None),
                Err(err) => Err(err),
            }
        } else {
            let query = ContentQuery {
                limit: Some(1),
                filter: Some(json!({ "slug": { "_eq": id_or_slug } })),
                locale: locale.map(str::to_string),
                ..ContentQuery::default()
            };
            let url = self.items_url(entity, &query)?;
            match self.get_data(url).await? {
                Value::Array(mut items) => {
                    if items.is_empty() {
                        Ok(None)
                    } else {
                        Ok(Some(items.swap_remove(0)))
                    }
                }
                Value::Null => Ok(None),
                other => Ok(Some(other)),
            }
        }
    }
}

fn append_query(url: &mut Url, query: &ContentQuery) {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if let Some(limit) = query.limit {
        pairs.push(("limit", limit.to_string()));
    }
    if let Some(offset) = query.offset {
        pairs.push(("offset", offset.to_string()));
    }
    if !query.sort.is_empty() {
        let sort = query
            .sort
            .iter()
            .map(|field| field.to_query())
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("sort", sort));
    }
    if !query.fields.is_empty() {
        pairs.push(("fields", query.fields.join(",")));
    }
    if let Some(filter) = &query.filter {
        pairs.push(("filter", filter.to_string()));
    }
    if let Some(locale) = &query.locale {
        pairs.push(("deep", deep_locale_filter(locale).to_string()));
    }
    if pairs.is_empty() {
        return;
    }

    let mut serializer = url.query_pairs_mut();
    for (name, value) in pairs {
        serializer.append_pair(name, &value);
    }
}

/// Locale narrows the embedded translations relation; the item API itself
/// has no locale parameter.
fn deep_locale_filter(locale: &str) -> Value {
    json!({ "translations": { "_filter": { "languages_code": { "_eq": locale } } } })
}

/// Numeric primary keys and UUIDs resolve through the by-id item route;
/// everything else is treated as a slug filter.
fn is_item_id(value: &str) -> bool {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    looks_like_uuid(value)
}

fn looks_like_uuid(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(index, byte)| match index {
        8 | 13 | 18 | 23 => *byte == b'-',
        _ => byte.is_ascii_hexdigit(),
    })
}

fn classify_transport(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::application::source::SortField;

    use super::*;

    fn source() -> DirectusSource {
        DirectusSource::new(&UpstreamSettings {
            base_url: Some("https://cms.example.test".to_string()),
            token: Some("secret".to_string()),
            timeout: std::time::Duration::from_secs(10),
            retry_transient: true,
        })
        .expect("valid settings")
    }

    #[test]
    fn items_url_carries_every_query_part() {
        let query = ContentQuery {
            limit: Some(12),
            offset: Some(24),
            sort: vec![SortField::parse("-published_at"), SortField::parse("name")],
            filter: Some(json!({ "destination": { "_eq": "lisbon" } })),
            fields: vec!["name".to_string(), "slug".to_string()],
            locale: Some("pt-PT".to_string()),
            bypass_cache: false,
        };

        let url = source()
            .items_url(EntityType::Hotels, &query)
            .expect("url builds");

        assert_eq!(url.path(), "/items/hotels");
        let rendered = url.as_str();
        assert!(rendered.contains("limit=12"));
        assert!(rendered.contains("offset=24"));
        assert!(rendered.contains("sort=-published_at%2Cname"));
        assert!(rendered.contains("fields=name%2Cslug"));
        assert!(rendered.contains("filter="));
        assert!(rendered.contains("deep="));
    }

    #[test]
    fn empty_query_adds_no_parameters() {
        let url = source()
            .items_url(EntityType::Pages, &ContentQuery::default())
            .expect("url builds");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn id_detection_accepts_uuids_and_numbers() {
        assert!(is_item_id("42"));
        assert!(is_item_id("0191f9c2-50a2-7e3b-bd53-1a2b3c4d5e6f"));
        assert!(!is_item_id("grand-palace"));
        assert!(!is_item_id(""));
        assert!(!is_item_id("0191f9c2-50a2-7e3b-bd53-1a2b3c4d5e6g"));
    }

    #[test]
    fn deep_filter_targets_translations_relation() {
        let deep = deep_locale_filter("de-DE");
        assert_eq!(
            deep,
            json!({ "translations": { "_filter": { "languages_code": { "_eq": "de-DE" } } } })
        );
    }
}
