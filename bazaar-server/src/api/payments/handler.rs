//! Payment API Handlers
//!
//! The proof image arrives as multipart form data, is buffered under the
//! work directory, and handed to the media collaborator by path; only the
//! returned URL is persisted.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use uuid::Uuid;

use crate::models::{Order, PaymentMethod, PayoutDestination};
use crate::payments;
use crate::server::{AppState, Caller};
use crate::utils::{AppError, AppResult};

/// Maximum proof image size (5MB)
const MAX_PROOF_SIZE: usize = 5 * 1024 * 1024;

fn parse_method(value: &str) -> Result<PaymentMethod, AppError> {
    match value {
        "bank_transfer" => Ok(PaymentMethod::BankTransfer),
        "crypto" => Ok(PaymentMethod::Crypto),
        other => Err(AppError::Validation(format!(
            "Invalid payment method: {other}"
        ))),
    }
}

/// GET /api/payments/receiving-account/{method} - 平台收款账户
pub async fn receiving_account(
    Path(method): Path<String>,
) -> AppResult<Json<PayoutDestination>> {
    let method = parse_method(&method)?;
    Ok(Json(payments::receiving_account(method)))
}

/// POST /api/orders/{id}/payment - 买家提交付款凭证 (multipart: proof + method)
pub async fn submit_payment(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<Order>> {
    // Only the buyer submits proof for their own order
    let order = state.orders.get_order(&order_id)?;
    if order.buyer_id != caller.user_id {
        return Err(AppError::Forbidden(
            "Only the buyer may submit payment for this order".to_string(),
        ));
    }

    let mut method: Option<PaymentMethod> = None;
    let mut proof: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("method") => {
                let text = field.text().await?;
                method = Some(parse_method(&text)?);
            }
            Some("proof") => {
                let file_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "proof".to_string());
                let data = field.bytes().await?;
                if data.is_empty() {
                    return Err(AppError::Validation("Proof image is empty".to_string()));
                }
                if data.len() > MAX_PROOF_SIZE {
                    return Err(AppError::Validation(format!(
                        "Proof image too large ({} bytes, max {MAX_PROOF_SIZE})",
                        data.len()
                    )));
                }
                proof = Some((file_name, data.to_vec()));
            }
            _ => {}
        }
    }

    let method =
        method.ok_or_else(|| AppError::Validation("Missing field: method".to_string()))?;
    let (file_name, data) =
        proof.ok_or_else(|| AppError::Validation("Missing field: proof".to_string()))?;

    // Buffer the upload on disk; the media collaborator takes a path
    let upload_dir = state.upload_dir();
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {e}")))?;
    let sanitized: String = file_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let local_path = upload_dir.join(format!("{}-{}", Uuid::new_v4(), sanitized));
    tokio::fs::write(&local_path, &data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to buffer upload: {e}")))?;

    let result = state
        .payments
        .submit_payment(&order_id, &local_path, method)
        .await;

    // The buffered file is no longer needed either way
    if let Err(e) = tokio::fs::remove_file(&local_path).await {
        tracing::warn!(path = %local_path.display(), error = %e, "Failed to remove buffered upload");
    }

    Ok(Json(result?))
}
