use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("Failed to create {entity}: {source}")]
    CreateFailed {
        entity: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    ValidationError(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
    #[error("Rejected request: {message}")]
    Rejected { status: StatusCode, message: String },
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )*
    };
}

impl_from_rejection!(JsonRejection, PathRejection, QueryRejection);

impl AppError {
    pub fn create_failed(entity: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| AppError::CreateFailed { entity, source }
    }

    pub fn task_not_found() -> Self {
        AppError::NotFound("Task not found".to_string())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::SqlxError(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::CreateFailed { entity, source } => {
                let status = if is_unique_violation(&source) {
                    tracing::debug!("Rejected duplicate {}: {}", entity, source);
                    StatusCode::CONFLICT
                } else {
                    tracing::error!("Failed to create {}: {}", entity, source);
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, format!("Failed to create {entity}"))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Rejected { status, message } => (status, message),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_failure_hides_driver_message() {
        let response = AppError::create_failed("task")(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::task_not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
