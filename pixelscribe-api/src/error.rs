/// Error handling for the API server
///
/// The web client reads the `success` flag rather than the HTTP status, so
/// every error renders as HTTP 200 with a failure envelope:
///
/// ```json
/// { "success": false, "message": "No Credit Balance", "creditBalance": 0 }
/// ```
///
/// `creditBalance` is only present when the balance is known.
///
/// # Example
///
/// ```
/// use pixelscribe_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(query: String) -> ApiResult<Json<Value>> {
///     if query.is_empty() {
///         return Err(ApiError::InvalidInput("Query too short".to_string()));
///     }
///     Ok(Json(json!({ "success": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pixelscribe_shared::auth::jwt::JwtError;
use pixelscribe_shared::auth::middleware::AuthError;
use pixelscribe_shared::auth::password::PasswordError;
use pixelscribe_shared::credits::LedgerError;
use pixelscribe_shared::enhance::EnhanceError;
use pixelscribe_shared::search::SearchError;
use pixelscribe_shared::vendor::openai::ChatError;
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request data
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or rejected token
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate account
    #[error("{0}")]
    Conflict(String),

    #[error("No Credit Balance")]
    InsufficientCredit { balance: i32 },

    /// Image vendor failure
    #[error("{message}")]
    Vendor {
        message: String,
        balance: Option<i32>,
    },

    /// Chat provider failure
    #[error("{0}")]
    AuthProvider(String),

    /// Field-level validation failures
    #[error("{}", summarize(.0))]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Database or hashing failure; details are logged, not returned
    #[error("Internal server error")]
    Internal(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

fn summarize(details: &[ValidationErrorDetail]) -> String {
    details
        .first()
        .map(|detail| detail.message.clone())
        .unwrap_or_else(|| "Invalid request".to_string())
}

/// Failure envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    /// Balance at the time of the failure, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_balance: Option<i32>,

    /// Per-field validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Balance to report with the failure
    pub fn credit_balance(&self) -> Option<i32> {
        match self {
            ApiError::InsufficientCredit { balance } => Some(*balance),
            ApiError::Vendor { balance, .. } => *balance,
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal error");
        }

        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
            credit_balance: self.credit_balance(),
            details: match self {
                ApiError::ValidationError(details) => Some(details),
                _ => None,
            },
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict("User already exists".to_string())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthenticated(err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::Internal(format!("Token creation failed: {}", msg)),
            other => ApiError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<EnhanceError> for ApiError {
    fn from(err: EnhanceError) -> Self {
        match err {
            EnhanceError::InvalidInput(message) => ApiError::InvalidInput(message),
            EnhanceError::NotFound => ApiError::NotFound("User not found".to_string()),
            EnhanceError::InsufficientCredit { balance } => ApiError::InsufficientCredit { balance },
            EnhanceError::Vendor {
                message, balance, ..
            } => ApiError::Vendor {
                message,
                balance: Some(balance),
            },
            EnhanceError::Ledger(err) => err.into(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NoMessages => ApiError::InvalidInput(err.to_string()),
            other => ApiError::AuthProvider(other.to_string()),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}
