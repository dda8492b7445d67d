/// Image generation endpoint
///
/// - `POST /api/image/generate-image` - `{ prompt }` (token required)
///
/// Costs one credit, like the upload operations, and answers with the
/// generated image under `resultImage`.

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use pixelscribe_shared::{
    auth::middleware::AuthContext,
    enhance::EnhanceRequest,
    vendor::OperationParams,
};
use serde::Deserialize;

use crate::{app::AppState, error::ApiResult, routes::enhance::EnhanceResponse};

/// Generation request
#[derive(Debug, Default, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Generates an image from a text prompt
pub async fn generate_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> ApiResult<Json<EnhanceResponse>> {
    // An unreadable body is a request without a prompt
    let prompt = body.map(|Json(req)| req.prompt).unwrap_or_default();

    let request = EnhanceRequest {
        image: None,
        params: OperationParams::TextToImage { prompt },
    };
    let outcome = state.enhance.handle(auth.account_id, request).await?;

    Ok(Json(outcome.into()))
}
