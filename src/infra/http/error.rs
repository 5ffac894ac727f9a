use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portico_api_types::ErrorBody;

use crate::application::error::ErrorReport;
use crate::application::source::FetchError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const UPSTREAM_UNAVAILABLE: &str = "upstream_unavailable";
    /// Fixed wire string for every authentication failure on the protected
    /// endpoints; deliberately silent about which check failed.
    pub const INVALID_TOKEN: &str = "Invalid token";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: Option<String>,
    report_source: &'static str,
    detail: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: codes::BAD_REQUEST,
            message: Some(message.into()),
            report_source: "infra::http",
            detail: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: codes::NOT_FOUND,
            message: Some(message.into()),
            report_source: "infra::http",
            detail: None,
        }
    }

    pub fn invalid_token() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: codes::INVALID_TOKEN,
            message: None,
            report_source: "infra::http::auth",
            detail: None,
        }
    }

    /// Upstream failures surface as a generic 500; the typed error goes to
    /// the diagnostic report, never to the client.
    pub fn from_fetch(source: &'static str, error: FetchError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: codes::UPSTREAM_UNAVAILABLE,
            message: Some("content backend request failed".to_string()),
            report_source: source,
            detail: Some(error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error.to_string(),
            message: self.message.clone(),
        };
        let mut response = (self.status, Json(body)).into_response();
        let detail = self
            .detail
            .or(self.message)
            .unwrap_or_else(|| self.error.to_string());
        ErrorReport::from_message(self.report_source, self.status, detail).attach(&mut response);
        response
    }
}
