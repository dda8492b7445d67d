/// Image enhancement endpoints
///
/// The nine upload operations share one handler; [`route`] binds it to an
/// [`OperationKind`]. Requests are multipart forms:
///
/// | field                                           | used by              |
/// |-------------------------------------------------|----------------------|
/// | `image`                                         | every operation      |
/// | `styleId`                                       | style-transfer       |
/// | `prompt`                                        | replace-background   |
/// | `extendLeft`, `extendRight`, `extendUp`, `extendDown` | uncrop         |
/// | `mask_file`                                     | cleanup              |
///
/// On success the response carries the result under the operation's own
/// field name:
///
/// ```json
/// {
///   "success": true,
///   "message": "Image colorized successfully!",
///   "colorizedImage": "data:image/png;base64,...",
///   "creditBalance": 4
/// }
/// ```

use std::collections::HashMap;

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::{post, MethodRouter},
    Extension, Json,
};
use pixelscribe_shared::{
    auth::middleware::AuthContext,
    enhance::{EnhanceOutcome, EnhanceRequest, EnhancementResult},
    vendor::{ImageUpload, OperationKind, OperationParams, UncropExtents},
};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

const IMAGE_FIELD: &str = "image";
const MASK_FIELDS: [&str; 2] = ["mask_file", "mask"];
const TEXT_FIELDS: [&str; 6] = [
    "styleId",
    "prompt",
    "extendLeft",
    "extendRight",
    "extendUp",
    "extendDown",
];

/// Successful enhancement envelope
#[derive(Debug, Clone)]
pub struct EnhanceResponse {
    pub message: &'static str,
    pub result: EnhancementResult,

    /// Balance after the debit
    pub credit_balance: i32,
}

impl From<EnhanceOutcome> for EnhanceResponse {
    fn from(outcome: EnhanceOutcome) -> Self {
        Self {
            message: outcome.message,
            result: outcome.result,
            credit_balance: outcome.credit_balance,
        }
    }
}

impl Serialize for EnhanceResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("success", &true)?;
        map.serialize_entry("message", self.message)?;
        map.serialize_entry(self.result.kind.spec().response_field, &self.result.data_url)?;
        map.serialize_entry("creditBalance", &self.credit_balance)?;
        map.end()
    }
}

/// Parsed multipart upload
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<ImageUpload>,
    mask: Option<ImageUpload>,
    fields: HashMap<&'static str, String>,
}

const UPLOAD_TOO_LARGE: &str = "Image is too large";

fn bad_form(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::InvalidInput(UPLOAD_TOO_LARGE.to_string());
    }
    ApiError::InvalidInput(err.body_text())
}

async fn read_file(field: Field<'_>) -> ApiResult<ImageUpload> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(bad_form)?;

    Ok(ImageUpload::new(
        bytes,
        file_name.as_deref(),
        content_type.as_deref(),
    ))
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                form.image = Some(read_file(field).await?);
            } else if MASK_FIELDS.contains(&name.as_str()) {
                form.mask = Some(read_file(field).await?);
            } else if let Some(known) = TEXT_FIELDS.iter().find(|known| **known == name) {
                let value = field.text().await.map_err(bad_form)?;
                form.fields.insert(*known, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn extent(&self, name: &str) -> ApiResult<u32> {
        UncropExtents::parse_field(name, self.text(name)).map_err(ApiError::InvalidInput)
    }

    fn into_request(self, kind: OperationKind) -> ApiResult<EnhanceRequest> {
        let params = match kind {
            OperationKind::Upscale => OperationParams::Upscale,
            OperationKind::RemoveBackground => OperationParams::RemoveBackground,
            OperationKind::Colorize => OperationParams::Colorize,
            OperationKind::StyleTransfer => OperationParams::StyleTransfer {
                style_id: self.text("styleId").map(str::to_string),
            },
            OperationKind::Reimagine => OperationParams::Reimagine,
            OperationKind::ReplaceBackground => OperationParams::ReplaceBackground {
                prompt: self.text("prompt").unwrap_or_default().to_string(),
            },
            OperationKind::Uncrop => OperationParams::Uncrop(UncropExtents {
                left: self.extent("extendLeft")?,
                right: self.extent("extendRight")?,
                up: self.extent("extendUp")?,
                down: self.extent("extendDown")?,
            }),
            OperationKind::RemoveText => OperationParams::RemoveText,
            OperationKind::Cleanup => OperationParams::Cleanup { mask: self.mask },
            OperationKind::TextToImage => OperationParams::TextToImage {
                prompt: self.text("prompt").unwrap_or_default().to_string(),
            },
        };

        Ok(EnhanceRequest {
            image: self.image,
            params,
        })
    }
}

/// POST route running `kind`
pub fn route(kind: OperationKind) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>,
              Extension(auth): Extension<AuthContext>,
              multipart: Result<Multipart, MultipartRejection>| async move {
            enhance(state, auth, kind, multipart).await
        },
    )
}

/// Runs one enhancement for the authenticated account
pub async fn enhance(
    state: AppState,
    auth: AuthContext,
    kind: OperationKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<EnhanceResponse>> {
    let form = match multipart {
        Ok(multipart) => UploadForm::read(multipart).await?,
        // Not a multipart body at all: treat as a request without an image
        Err(rejection) => {
            tracing::debug!(operation = %kind, error = %rejection, "Request is not multipart");
            UploadForm::default()
        }
    };

    let request = form.into_request(kind)?;
    let outcome = state.enhance.handle(auth.account_id, request).await?;

    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(kind: OperationKind) -> serde_json::Value {
        serde_json::to_value(EnhanceResponse {
            message: kind.spec().success_message,
            result: EnhancementResult {
                kind,
                data_url: "data:image/png;base64,AAAA".to_string(),
            },
            credit_balance: 4,
        })
        .unwrap()
    }

    #[test]
    fn test_response_uses_operation_field() {
        let body = response(OperationKind::Colorize);

        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Image colorized successfully!");
        assert_eq!(body["colorizedImage"], "data:image/png;base64,AAAA");
        assert_eq!(body["creditBalance"], 4);
        assert_eq!(body.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_field_names_per_kind() {
        assert!(response(OperationKind::Upscale).get("enhancedImage").is_some());
        assert!(response(OperationKind::StyleTransfer).get("styledImage").is_some());
        assert!(response(OperationKind::Reimagine).get("reimaginedImage").is_some());
        assert!(response(OperationKind::Uncrop).get("processedImage").is_some());
    }

    fn form(fields: &[(&'static str, &str)]) -> UploadForm {
        UploadForm {
            fields: fields
                .iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_uncrop_fields_parsed() {
        let request = form(&[("extendLeft", "64"), ("extendDown", " 32 ")])
            .into_request(OperationKind::Uncrop)
            .unwrap();

        assert_eq!(
            request.params,
            OperationParams::Uncrop(UncropExtents {
                left: 64,
                right: 0,
                up: 0,
                down: 32,
            })
        );
    }

    #[test]
    fn test_negative_extent_rejected() {
        let err = form(&[("extendRight", "-10")])
            .into_request(OperationKind::Uncrop)
            .unwrap_err();
        assert_eq!(err.to_string(), "extendRight must be a non-negative integer");
    }

    #[test]
    fn test_blank_style_id_is_absent() {
        let request = form(&[("styleId", "  ")])
            .into_request(OperationKind::StyleTransfer)
            .unwrap();
        assert_eq!(request.params, OperationParams::StyleTransfer { style_id: None });
    }
}
