use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::research::SearchError;
use crate::storage::UploadError;
use crate::topic_map::error::{ParseError, ValidationError};

/// Failure of an external collaborator (search or generation).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("search service error: {0}")]
    Search(#[from] SearchError),

    #[error("generation service error: {0}")]
    Generation(#[from] LlmError),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Upload is not configured")]
    UploadDisabled,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        AppError::Service(e.into())
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Service(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                format!(
                    "topic map validation failed with {} violation(s)",
                    e.violations.len()
                ),
                Some(json!({ "violations": e.violations })),
            ),
            AppError::Parse(e) => {
                let details = match e {
                    ParseError::Cell { row, column, .. } => {
                        Some(json!({ "row": row, "column": column }))
                    }
                    ParseError::Row { row, .. } => Some(json!({ "row": row })),
                    ParseError::Response(_) => None,
                };
                (StatusCode::BAD_REQUEST, "PARSE_ERROR", e.to_string(), details)
            }
            AppError::Service(e) => {
                tracing::error!("Service error: {e}");
                (StatusCode::BAD_GATEWAY, "SERVICE_ERROR", e.to_string(), None)
            }
            AppError::Upload(e @ UploadError::InvalidFolder(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string(), None)
            }
            AppError::Upload(e) => {
                tracing::error!("Upload error: {e}");
                (StatusCode::BAD_GATEWAY, "UPLOAD_ERROR", e.to_string(), None)
            }
            AppError::UploadDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPLOAD_DISABLED",
                "Cloud upload is not configured on this server".to_string(),
                None,
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let (Some(details), Value::Object(map)) = (details, &mut error) {
            map.insert("details".to_string(), details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic_map::error::Violation;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_violations() {
        let err = AppError::from(ValidationError::new(vec![
            Violation::record(1, "Blog SEO Basics", "priority_score 6 is outside 1-5"),
            Violation::batch("expected exactly 1 Pillar, found 0"),
        ]));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let violations = body["error"]["details"]["violations"].as_array().unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0]["index"], 1);
        assert_eq!(violations[1]["index"], Value::Null);
    }

    #[tokio::test]
    async fn test_parse_error_names_cell() {
        let err = AppError::from(ParseError::Cell {
            row: 3,
            column: "Priority Score",
            message: "'high' is not an integer".to_string(),
        });
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "PARSE_ERROR");
        assert_eq!(body["error"]["details"]["row"], 3);
        assert_eq!(body["error"]["details"]["column"], "Priority Score");
    }

    #[tokio::test]
    async fn test_service_error_message_is_verbatim() {
        let err = AppError::from(SearchError::Api {
            status: 432,
            message: "plan limit exceeded".to_string(),
        });
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["error"]["message"],
            "search service error: search API error (status 432): plan limit exceeded"
        );
    }

    #[tokio::test]
    async fn test_upload_statuses() {
        let (status, _) = render(AppError::UploadDisabled).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = render(UploadError::InvalidFolder("..".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = render(UploadError::Put("timeout".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let (status, body) = render(anyhow::anyhow!("disk on fire").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal server error occurred");
    }
}
