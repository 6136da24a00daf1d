use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::validator::ItemRejection;

/// Error response type
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub ok: bool,
    /// Machine-readable error class
    pub code: String,
    pub reason: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Error classes surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    Conflict,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures of the resolution and write engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid item: {0}")]
    InvalidItem(#[from] ItemRejection),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Max defined path level is {max}, while your path level is {depth}")]
    PathTooDeep { max: usize, depth: usize },

    #[error("Permission denied for override.")]
    OverrideDenied,

    #[error("Permission denied in lockdown mode.")]
    LockdownDenied,

    #[error("Permission denied, admin required.")]
    AdminRequired,

    #[error("Path {0} is reserved, override is required")]
    ReservedPath(String),

    #[error("Invalid request for guests")]
    GuestForbidden,

    #[error("Item for this path already exists")]
    AlreadyExists,

    #[error("Conflict with an inherited path on {0}")]
    InheritedConflict(String),

    #[error("Not found for {0}")]
    NotFound(String),

    #[error("Bad payload URL for {path}: {source}")]
    BadPayloadUrl {
        path: String,
        source: url::ParseError,
    },

    #[error("Storage error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidItem(_)
            | EngineError::InvalidPath(_)
            | EngineError::PathTooDeep { .. } => ErrorKind::Validation,
            EngineError::OverrideDenied
            | EngineError::LockdownDenied
            | EngineError::AdminRequired
            | EngineError::ReservedPath(_)
            | EngineError::GuestForbidden => ErrorKind::Authorization,
            EngineError::AlreadyExists | EngineError::InheritedConflict(_) => ErrorKind::Conflict,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::BadPayloadUrl { .. } | EngineError::Store(_) => ErrorKind::Internal,
        }
    }
}

/// Custom error type for API endpoints
///
/// Every variant renders as an [`ErrorResponse`] JSON body with the status
/// code of its error class.
#[derive(Debug)]
pub enum ApiError {
    /// Rejected by the engine
    Engine(EngineError),
    /// Request body is not JSON
    JsonError(serde_json::Error),
    /// Method not served at this path
    MethodNotAllowed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, reason) = match self {
            ApiError::Engine(err) => {
                let kind = err.kind();
                if kind == ErrorKind::Internal {
                    tracing::error!("Request failed: {}", err);
                }
                (kind.status(), kind.code(), err.to_string())
            }
            ApiError::JsonError(err) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::Validation.code(),
                format!("JSON parse error: {}", err),
            ),
            ApiError::MethodNotAllowed(reason) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                reason,
            ),
        };

        let body = Json(ErrorResponse {
            ok: false,
            code: code.to_string(),
            reason,
        });

        (status, body).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Engine(EngineError::Store(err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: ApiError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            EngineError::PathTooDeep { max: 2, depth: 3 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(EngineError::GuestForbidden.kind(), ErrorKind::Authorization);
        assert_eq!(EngineError::AlreadyExists.kind(), ErrorKind::Conflict);
        assert_eq!(EngineError::NotFound("/x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            EngineError::Store(anyhow::anyhow!("down")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_depth_message_names_limit_and_depth() {
        let message = EngineError::PathTooDeep { max: 2, depth: 3 }.to_string();
        assert_eq!(message, "Max defined path level is 2, while your path level is 3");
    }

    #[tokio::test]
    async fn test_conflict_renders_as_bad_request() {
        let (status, body) = render(EngineError::InheritedConflict("/a".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.ok);
        assert_eq!(body.code, "conflict");
        assert_eq!(body.reason, "Conflict with an inherited path on /a");
    }

    #[tokio::test]
    async fn test_rejection_renders_reason() {
        let (status, body) = render(EngineError::from(ItemRejection::InvalidUrl).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "validation");
        assert_eq!(body.reason, "Invalid item: Invalid URL");
    }

    #[tokio::test]
    async fn test_store_failure_renders_as_internal() {
        let (status, body) = render(anyhow::anyhow!("connection reset").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "internal");
        assert!(body.reason.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (status, body) = render(ApiError::MethodNotAllowed("Invalid path for API".into())).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body.reason, "Invalid path for API");
    }
}
