/// JWT token generation and validation
///
/// Tokens identify an account and are signed with HS256 (HMAC-SHA256) using
/// the `JWT_SECRET` shared by every gateway instance. The web client keeps a
/// single token per session, so there is no refresh token pair.
///
/// # Validation
///
/// - Signature (HS256)
/// - Expiration (`exp`) and not-before (`nbf`)
/// - Issuer must be `"pixelscribe"`
///
/// # Example
///
/// ```
/// use pixelscribe_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let account_id = Uuid::new_v4();
///
/// let claims = Claims::new(account_id);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, account_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "pixelscribe";

/// Default token lifetime (7 days)
pub fn default_expiration() -> Duration {
    Duration::days(7)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claim validation failed
    #[error("{0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Issuer is not PixelScribe
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// JWT claims
///
/// - `sub`: Account ID
/// - `iss`: Always "pixelscribe"
/// - `iat` / `nbf` / `exp`: Unix timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - Account ID
    pub sub: Uuid,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims with the default expiration
    pub fn new(account_id: Uuid) -> Self {
        Self::with_expiration(account_id, default_expiration())
    }

    /// Creates claims expiring after `expires_in`
    ///
    /// # Example
    ///
    /// ```
    /// use pixelscribe_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::with_expiration(Uuid::new_v4(), Duration::hours(1));
    /// assert_eq!(claims.exp - claims.iat, 3600);
    /// ```
    pub fn with_expiration(account_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: account_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }
}

/// Signs claims into a JWT string
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// # Errors
///
/// - `JwtError::Expired` when `exp` is in the past
/// - `JwtError::InvalidIssuer` when the issuer is not `"pixelscribe"`
/// - `JwtError::ValidationError` for bad signatures or malformed tokens
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // Tokens carry no audience
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Invalid token: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Issues a token for an account with the given lifetime
pub fn issue_for_account(
    account_id: Uuid,
    secret: &str,
    expires_in: Duration,
) -> Result<String, JwtError> {
    create_token(&Claims::with_expiration(account_id, expires_in), secret)
}
