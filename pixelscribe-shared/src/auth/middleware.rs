/// Request authentication context
///
/// The web client sends its token either in a custom `token` header or as a
/// standard `Authorization: Bearer <jwt>` header. After verification the
/// account id is stored in request extensions as an [`AuthContext`]; handlers
/// never read the account id from the request body, where a multipart field
/// could overwrite it.
///
/// # Example
///
/// ```
/// use axum::http::HeaderMap;
/// use pixelscribe_shared::auth::jwt::{create_token, Claims};
/// use pixelscribe_shared::auth::middleware::authenticate;
/// use uuid::Uuid;
///
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let account_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(account_id), secret).unwrap();
///
/// let mut headers = HeaderMap::new();
/// headers.insert("token", token.parse().unwrap());
///
/// let context = authenticate(&headers, secret).unwrap();
/// assert_eq!(context.account_id, account_id);
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Custom header carrying the raw token
pub const TOKEN_HEADER: &str = "token";

/// Authentication context added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated account
    pub account_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from verified JWT claims
    pub fn from_jwt(account_id: Uuid) -> Self {
        Self { account_id }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token header at all
    #[error("Not Authorized. Login Again")]
    MissingCredentials,

    /// Token present but rejected
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

/// Pulls the raw token out of the request headers
///
/// The `token` header wins over `Authorization`. Blank values count as
/// missing.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let from_custom = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(token) = from_custom {
        return Ok(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingCredentials)
}

/// Verifies the request token and returns the auth context
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = extract_token(headers)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext::from_jwt(claims.sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_extract_from_custom_header() {
        let headers = headers_with("token", "abc.def.ghi");
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_from_bearer_header() {
        let headers = headers_with("authorization", "Bearer abc.def.ghi");
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_custom_header_takes_precedence() {
        let mut headers = headers_with("authorization", "Bearer from-bearer");
        headers.insert(TOKEN_HEADER, "from-custom".parse().unwrap());

        assert_eq!(extract_token(&headers).unwrap(), "from-custom");
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            extract_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            extract_token(&headers_with("authorization", "Bearer ")),
            Err(AuthError::MissingCredentials)
        ));
        assert_eq!(
            AuthError::MissingCredentials.to_string(),
            "Not Authorized. Login Again"
        );
    }

    #[test]
    fn test_authenticate_valid_token() {
        let account_id = Uuid::new_v4();
        let token = create_token(&Claims::new(account_id), SECRET).unwrap();

        let context = authenticate(&headers_with("authorization", &format!("Bearer {}", token)), SECRET)
            .unwrap();
        assert_eq!(context, AuthContext::from_jwt(account_id));
    }

    #[test]
    fn test_authenticate_expired_token() {
        let claims = Claims::with_expiration(Uuid::new_v4(), Duration::hours(-2));
        let token = create_token(&claims, SECRET).unwrap();

        let err = authenticate(&headers_with("token", &token), SECRET).unwrap_err();
        assert_eq!(err.to_string(), "Token has expired");
    }

    #[test]
    fn test_authenticate_bad_signature() {
        let token = create_token(&Claims::new(Uuid::new_v4()), "different-secret-of-32-bytes-long!!").unwrap();

        let err = authenticate(&headers_with("token", &token), SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
