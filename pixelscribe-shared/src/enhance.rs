/// Credit-gated enhancement proxy
///
/// One code path serves every operation, including prompt-only generation:
///
/// 1. Validate the upload (when the operation takes one) and the parameters
/// 2. Look up the balance (`NotFound` for unknown accounts)
/// 3. Refuse when the balance is not positive; the vendor is never called
/// 4. Reserve one credit atomically
/// 5. Call the vendor
/// 6. On success return the data URL and the post-debit balance; on failure
///    refund the reserved credit and report the unchanged balance
///
/// Reserving before the vendor call means two concurrent requests against a
/// balance of 1 cannot both succeed.

use std::sync::Arc;

use uuid::Uuid;

use crate::credits::{DynCreditLedger, LedgerError};
use crate::models::account::DebitOutcome;
use crate::vendor::clipdrop::{ClipDropClient, VendorError};
use crate::vendor::data_url;
use crate::vendor::operation::{ImageUpload, OperationKind, OperationParams};

/// Default per-direction uncrop limit in pixels
pub const DEFAULT_UNCROP_MAX_EXTENT: u32 = 2048;

/// Enhancement error
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    /// Missing upload or bad parameters
    #[error("{0}")]
    InvalidInput(String),

    #[error("User not found")]
    NotFound,

    /// Balance is zero; carries the balance
    #[error("No Credit Balance")]
    InsufficientCredit { balance: i32 },

    /// Vendor failed; the reserved credit has been returned
    #[error("{message}")]
    Vendor {
        message: String,
        balance: i32,
        #[source]
        source: VendorError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EnhanceError {
    /// Balance to report alongside the error, when known
    pub fn credit_balance(&self) -> Option<i32> {
        match self {
            EnhanceError::InsufficientCredit { balance } => Some(*balance),
            EnhanceError::Vendor { balance, .. } => Some(*balance),
            _ => None,
        }
    }
}

/// One enhancement request
#[derive(Debug, Clone)]
pub struct EnhanceRequest {
    /// Uploaded image, `None` if the form had no image part. Ignored by
    /// prompt-only operations.
    pub image: Option<ImageUpload>,

    pub params: OperationParams,
}

/// Processed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancementResult {
    pub kind: OperationKind,

    /// `data:<mime>;base64,...`
    pub data_url: String,
}

/// Successful enhancement
#[derive(Debug, Clone)]
pub struct EnhanceOutcome {
    pub result: EnhancementResult,
    pub message: &'static str,

    /// Balance after the debit
    pub credit_balance: i32,
}

/// The proxy service
#[derive(Clone)]
pub struct EnhanceService {
    ledger: DynCreditLedger,
    vendor: Arc<ClipDropClient>,
    uncrop_max_extent: u32,
}

impl EnhanceService {
    pub fn new(ledger: DynCreditLedger, vendor: Arc<ClipDropClient>) -> Self {
        Self {
            ledger,
            vendor,
            uncrop_max_extent: DEFAULT_UNCROP_MAX_EXTENT,
        }
    }

    /// Overrides the per-direction uncrop limit
    pub fn with_uncrop_max_extent(mut self, max: u32) -> Self {
        self.uncrop_max_extent = max;
        self
    }

    /// Runs one enhancement for `account_id`
    pub async fn handle(
        &self,
        account_id: Uuid,
        request: EnhanceRequest,
    ) -> Result<EnhanceOutcome, EnhanceError> {
        let EnhanceRequest { image, params } = request;
        let kind = params.kind();
        let spec = kind.spec();

        let image = if params.requires_image() {
            let upload = image
                .filter(|upload| !upload.is_empty())
                .ok_or_else(|| EnhanceError::InvalidInput(params.missing_image_message().to_string()))?;
            Some(upload)
        } else {
            None
        };
        params
            .validate(self.uncrop_max_extent)
            .map_err(EnhanceError::InvalidInput)?;

        let balance = self
            .ledger
            .balance(account_id)
            .await?
            .ok_or(EnhanceError::NotFound)?;

        if balance <= 0 {
            return Err(EnhanceError::InsufficientCredit { balance });
        }

        let remaining = match self.ledger.reserve(account_id).await? {
            DebitOutcome::Debited { remaining } => remaining,
            DebitOutcome::Insufficient { balance } => {
                return Err(EnhanceError::InsufficientCredit { balance })
            }
            DebitOutcome::NotFound => return Err(EnhanceError::NotFound),
        };

        match self.vendor.process(image.as_ref(), &params).await {
            Ok(output) => {
                tracing::info!(
                    account_id = %account_id,
                    operation = %kind,
                    credit_balance = remaining,
                    "Enhancement completed"
                );

                Ok(EnhanceOutcome {
                    result: EnhancementResult {
                        kind,
                        data_url: data_url::encode(&output.bytes, output.content_type.as_deref()),
                    },
                    message: spec.success_message,
                    credit_balance: remaining,
                })
            }
            Err(err) => {
                let balance = self.refund(account_id, remaining).await;
                let message = err
                    .vendor_message()
                    .unwrap_or(spec.failure_message)
                    .to_string();

                tracing::warn!(
                    account_id = %account_id,
                    operation = %kind,
                    error = %err,
                    "Vendor call failed, credit refunded"
                );

                Err(EnhanceError::Vendor {
                    message,
                    balance,
                    source: err,
                })
            }
        }
    }

    async fn refund(&self, account_id: Uuid, remaining: i32) -> i32 {
        match self.ledger.refund(account_id).await {
            Ok(Some(balance)) => balance,
            Ok(None) => {
                tracing::error!(account_id = %account_id, "Account vanished before refund");
                remaining
            }
            Err(err) => {
                tracing::error!(account_id = %account_id, error = %err, "Credit refund failed");
                remaining
            }
        }
    }
}
