use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sift_llm::LlmError;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the search API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Chat session not found")]
    SessionNotFound,

    #[error("API endpoint not found")]
    RouteNotFound,

    #[error("An error occurred")]
    Upstream(#[from] LlmError),

    #[error("Model request timed out")]
    UpstreamTimeout(Duration),
}

/// JSON body for API errors
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Validation(_) | ApiError::SessionNotFound => ErrorResponse {
                message: Some(self.to_string()),
                error: None,
            },
            ApiError::RouteNotFound => ErrorResponse {
                message: None,
                error: Some(self.to_string()),
            },
            ApiError::Upstream(e) => ErrorResponse {
                message: Some(self.to_string()),
                error: Some(e.to_string()),
            },
            ApiError::UpstreamTimeout(after) => ErrorResponse {
                message: Some(self.to_string()),
                error: Some(format!("no response from the model within {}s", after.as_secs())),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Custom JSON extractor that returns our ApiError on deserialization failures
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Custom query extractor, same error mapping as ApiJson
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        error!("JSON deserialization error: {}", message);
        ApiError::Validation(message)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let message = rejection.body_text();
        error!("Query deserialization error: {}", message);
        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(err: &ApiError) -> serde_json::Value {
        serde_json::to_value(err.body()).unwrap()
    }

    #[test]
    fn validation_is_bad_request_with_message() {
        let err = ApiError::Validation("Query parameter 'q' is required".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&err),
            serde_json::json!({ "message": "Query parameter 'q' is required" })
        );
    }

    #[test]
    fn unknown_route_uses_error_field() {
        let err = ApiError::RouteNotFound;
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(&err), serde_json::json!({ "error": "API endpoint not found" }));
    }

    #[test]
    fn upstream_failure_carries_provider_text() {
        let err = ApiError::from(LlmError::Api {
            status: 429,
            message: "quota exceeded".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(&err);
        assert_eq!(body["message"], "An error occurred");
        assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
    }

    #[test]
    fn timeout_is_gateway_timeout() {
        let err = ApiError::UpstreamTimeout(Duration::from_secs(30));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_json(&err)["error"], "no response from the model within 30s");
    }
}
