//! Payment capture
//!
//! Payment evidence (a bank transfer screenshot, a crypto tx) cannot be
//! verified automatically, so capture is two-phase: the buyer uploads proof
//! here and claims payment; money only moves when the settlement engine
//! receives the acknowledgement (`settlement::SettlementService`).

use std::path::Path;
use std::sync::Arc;

use crate::catalog::MediaStore;
use crate::models::{Order, PaymentMethod, PaymentStatus, PayoutDestination};
use crate::store::MarketStore;
use crate::utils::{ServiceError, ServiceResult, now_millis};

// Platform receiving accounts the buyer transfers into. Static platform
// configuration, snapshotted into the API response at submission time.
const PLATFORM_BANK_ACCOUNT_NAME: &str = "Bazaar Global Ltd";
const PLATFORM_BANK_ACCOUNT_NUMBER: &str = "1234567890";
const PLATFORM_BANK_NAME: &str = "Monie Point";
const PLATFORM_WALLET_ADDRESS: &str = "0x10E0271ec47d55511a2a7301801d55eaB";
const PLATFORM_WALLET_SYMBOL: &str = "USDT";
const PLATFORM_WALLET_NETWORK: &str = "ERC20";

/// Where the buyer should send funds for the given payment method
pub fn receiving_account(method: PaymentMethod) -> PayoutDestination {
    match method {
        PaymentMethod::BankTransfer => PayoutDestination::Bank {
            account_name: PLATFORM_BANK_ACCOUNT_NAME.to_string(),
            account_number: PLATFORM_BANK_ACCOUNT_NUMBER.to_string(),
            bank_name: PLATFORM_BANK_NAME.to_string(),
        },
        PaymentMethod::Crypto => PayoutDestination::Crypto {
            wallet_address: PLATFORM_WALLET_ADDRESS.to_string(),
            symbol: PLATFORM_WALLET_SYMBOL.to_string(),
            network: PLATFORM_WALLET_NETWORK.to_string(),
        },
    }
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<MarketStore>,
    media: Arc<dyn MediaStore>,
}

impl PaymentService {
    pub fn new(store: Arc<MarketStore>, media: Arc<dyn MediaStore>) -> Self {
        Self { store, media }
    }

    /// Record the buyer's proof-of-payment against an order.
    ///
    /// Stores only the uploaded proof URL and stamps the order as
    /// buyer-claimed paid; no money moves here. Resubmission is allowed while
    /// the payment is still unsettled (a clearer screenshot replaces the
    /// old proof), rejected once settlement has ruled either way.
    pub async fn submit_payment(
        &self,
        order_id: &str,
        proof_image: &Path,
        method: PaymentMethod,
    ) -> ServiceResult<Order> {
        // Cheap existence/state checks before paying for the upload
        let order = self
            .store
            .get_order(order_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {order_id}")))?;
        if order.payment_status != PaymentStatus::Pending {
            return Err(ServiceError::InvalidState(format!(
                "Payment for order {order_id} has already been settled"
            )));
        }

        let proof_url = self.media.upload_image(proof_image).await?;

        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {order_id}")))?;
        // Re-check under the writer: settlement may have raced the upload
        if order.payment_status != PaymentStatus::Pending {
            return Err(ServiceError::InvalidState(format!(
                "Payment for order {order_id} has already been settled"
            )));
        }

        order.record_payment_proof(proof_url, method, now_millis());
        self.store.put_order_txn(&txn, &order)?;
        self.store.commit(txn)?;

        tracing::info!(order_id, method = ?method, "Payment proof recorded");
        Ok(order)
    }
}
