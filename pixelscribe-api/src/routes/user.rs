/// Account endpoints
///
/// - `POST /api/user/register` - Create an account and get a token
/// - `POST /api/user/login` - Exchange credentials for a token
/// - `GET /api/user/credits` - Current balance (token required)
///
/// New accounts start with the configured number of credits. Tokens are
/// HS256 JWTs whose subject is the account id.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use chrono::Duration;
use pixelscribe_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::account::{Account, CreateAccount},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Account summary returned with a token
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub name: String,
    pub credit_balance: i32,
}

/// Register and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    pub user: UserSummary,
}

/// Account name in the credits response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserName {
    pub name: String,
}

/// Credits response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreditsResponse {
    pub success: bool,
    pub credits: i32,
    pub user: UserName,
}

/// Maps validator output to per-field details, ordered by field name
pub(crate) fn validation_details(errors: ValidationErrors) -> ApiError {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));

    ApiError::ValidationError(details)
}

fn issue_token(state: &AppState, account_id: Uuid) -> ApiResult<String> {
    let lifetime = Duration::hours(state.config.jwt.expiry_hours);
    Ok(jwt::issue_for_account(account_id, state.jwt_secret(), lifetime)?)
}

/// Registers a new account
///
/// # Errors
///
/// - Validation failure (email, name, password)
/// - `User already exists` when the email is taken
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(req) = body.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    req.validate().map_err(validation_details)?;
    password::validate_password(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    let email = req.email.trim().to_string();
    if Account::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // Losing a registration race surfaces as a unique violation, mapped to Conflict
    let account = Account::create(
        &state.db,
        CreateAccount {
            name: req.name.trim().to_string(),
            email,
            password_hash,
            credit_balance: state.config.credits.starting_credits,
        },
    )
    .await?;

    tracing::info!(account_id = %account.id, "Account registered");

    Ok(Json(TokenResponse {
        success: true,
        token: issue_token(&state, account.id)?,
        user: UserSummary {
            name: account.name,
            credit_balance: account.credit_balance,
        },
    }))
}

/// Logs in with email and password
///
/// Unknown email and wrong password produce the same message.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(req) = body.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    req.validate().map_err(validation_details)?;

    let account = Account::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &account.password_hash)? {
        tracing::debug!(account_id = %account.id, "Password mismatch");
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(TokenResponse {
        success: true,
        token: issue_token(&state, account.id)?,
        user: UserSummary {
            name: account.name,
            credit_balance: account.credit_balance,
        },
    }))
}

/// Current balance of the authenticated account
pub async fn credits(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<CreditsResponse>> {
    let account = Account::find_by_id(&state.db, auth.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(CreditsResponse {
        success: true,
        credits: account.credit_balance,
        user: UserName { name: account.name },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            name: String::new(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        let err = validation_details(req.validate().unwrap_err());
        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "name", "password"]);
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_register_request() {
        let req = RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_token_response_shape() {
        let body = serde_json::to_value(TokenResponse {
            success: true,
            token: "jwt".to_string(),
            user: UserSummary {
                name: "Ada".to_string(),
                credit_balance: 5,
            },
        })
        .unwrap();

        assert_eq!(body["user"]["creditBalance"], 5);
        assert_eq!(body["user"]["name"], "Ada");
    }
}
