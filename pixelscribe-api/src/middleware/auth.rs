/// Token gate for protected routes
///
/// Reads the token from the `token` header or `Authorization: Bearer`,
/// verifies it and stores an [`AuthContext`] in the request extensions.
/// Handlers take the account id from there, never from the body.
///
/// Rejections use the normal failure envelope (HTTP 200, `success: false`).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use pixelscribe_shared::auth::middleware::authenticate;

use crate::{app::AppState, error::ApiError};

/// `from_fn_with_state` middleware that requires a valid token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret()).map_err(|err| {
        tracing::debug!(error = %err, path = %req.uri().path(), "Rejected request");
        ApiError::from(err)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
