use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// 数据层的所有失败都归一为这一类，保留后端原始信息
    #[error("Operation failed: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Authentication required")]
    Unauthenticated { redirect_to: String, from: String },

    #[error("Profile not loaded yet")]
    ProfilePending,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden { redirect_to: String },

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "OPERATION_FAILED",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::Unauthenticated { .. } => "UNAUTHENTICATED",
            AppError::ProfilePending => "PROFILE_PENDING",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden { .. } => "FORBIDDEN",
            AppError::InternalError(_) | AppError::SerdeJsonError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) | AppError::Unauthenticated { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ProfilePending => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::InternalError(_)
            | AppError::SerdeJsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }

        let mut error = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        match self {
            AppError::Unauthenticated { redirect_to, from } => {
                error["redirect_to"] = json!(redirect_to);
                error["from"] = json!(from);
            }
            AppError::Forbidden { redirect_to } => {
                error["redirect_to"] = json!(redirect_to);
            }
            _ => {}
        }

        let mut builder = HttpResponse::build(status_code);
        if matches!(self, AppError::ProfilePending) {
            builder.insert_header(("Retry-After", "1"));
        }
        builder.json(json!({
            "success": false,
            "error": error
        }))
    }
}
