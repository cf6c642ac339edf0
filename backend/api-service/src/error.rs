/// Error types for the Campus Crush API
///
/// Every handler returns `Result<T>`; errors render as
/// `{"detail": "...", "status": <code>}` with the matching HTTP status.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use std::fmt;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Database operation failed
    DatabaseError(String),

    /// Request failed validation
    ValidationError(String),

    /// Resource not found
    NotFound(String),

    /// Missing or rejected credentials
    Unauthorized(String),

    /// Authenticated but not allowed
    Forbidden(String),

    /// Malformed or inconsistent request
    BadRequest(String),

    /// Duplicate resource
    Conflict(String),

    /// Object storage failure
    Storage(String),

    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Message shown to clients in the `detail` field.
    pub fn detail(&self) -> &str {
        match self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Storage(msg)
            | AppError::Internal(msg) => msg,
            AppError::DatabaseError(_) => "Internal server error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }

        builder.json(serde_json::json!({
            "detail": self.detail(),
            "status": status.as_u16(),
        }))
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for field '{}'", field),
                })
            })
            .collect();
        messages.sort();

        AppError::ValidationError(messages.join("; "))
    }
}

impl From<s3_utils::StorageError> for AppError {
    fn from(err: s3_utils::StorageError) -> Self {
        match err {
            s3_utils::StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<crypto_core::PasswordError> for AppError {
    fn from(err: crypto_core::PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}
