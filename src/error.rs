use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Error returned by every attendance endpoint.
///
/// The display text becomes the `message` of the JSON envelope, except for
/// `Internal`, whose details are logged where the error is built and never
/// leave the process.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    /// Logs `err` with `context` and hides it behind a generic 500.
    pub fn internal(context: &str, err: impl fmt::Display) -> Self {
        tracing::error!(error = %err, "{}", context);
        ApiError::Internal
    }
}

/// Uniform error body: `{code, error, message}`.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = 409)]
    pub code: u16,
    #[schema(example = true)]
    pub error: bool,
    #[schema(example = "employee has already checked in today")]
    pub message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            code: status.as_u16(),
            error: true,
            message: self.to_string(),
        })
    }
}

/// Failure reported by a storage backend.
#[derive(Debug, Display)]
pub enum StoreError {
    /// A unique key (employee, date) already holds a row.
    #[display(fmt = "record already exists")]
    Duplicate,
    #[display(fmt = "{}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Database(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => ApiError::Conflict("Record already exists".to_string()),
            StoreError::Database(e) => ApiError::internal("Database error", e),
        }
    }
}
