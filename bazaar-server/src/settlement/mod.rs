//! Settlement engine
//!
//! Converts a payment acknowledgement into seller credits. This is the
//! highest-risk path in the system: a half-applied settlement (some sellers
//! credited, order not marked, or vice versa) corrupts the ledger invariant,
//! so the whole flow runs inside one store write transaction.
//!
//! # Acknowledgement Flow
//!
//! ```text
//! acknowledge_payment(order_id, payment_received, actor_id)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Load order (NotFound if absent)
//!     ├─ 3. Re-entrancy guard: payment must still be Pending
//!     ├─ 4. Batch-load every distinct seller account
//!     ├─ 5. Per line: pending credit entry; received → credit balance,
//!     │     entry Completed; not received → entry Failed
//!     ├─ 6. Batch-insert entries, persist mutated accounts
//!     ├─ 7. Order payment status → Completed | Failed
//!     └─ 8. Commit (any earlier error drops the txn, full rollback)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{LedgerEntry, Order, PaymentStatus};
use crate::store::MarketStore;
use crate::utils::{ServiceError, ServiceResult, now_millis};

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct SettlementService {
    store: Arc<MarketStore>,
}

impl SettlementService {
    pub fn new(store: Arc<MarketStore>) -> Self {
        Self { store }
    }

    /// Settle an order's payment against every seller's ledger.
    ///
    /// `payment_received = true` credits each line's amount to its seller and
    /// completes the credit entries; `false` records the attempt as failed
    /// entries and leaves every balance untouched. Either way the order's
    /// payment status becomes terminal, and repeating the call is rejected.
    pub fn acknowledge_payment(
        &self,
        order_id: &str,
        payment_received: bool,
        actor_id: &str,
    ) -> ServiceResult<Order> {
        let now = now_millis();

        let txn = self.store.begin_write()?;

        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {order_id}")))?;

        // 重入保护：同一订单不允许二次结算
        if order.payment_status != PaymentStatus::Pending {
            return Err(ServiceError::InvalidState(format!(
                "Payment for order {} already acknowledged as {:?}",
                order_id, order.payment_status
            )));
        }

        // Load every seller account up front; a missing account aborts the
        // whole settlement before a single balance or entry is written
        let seller_ids = order.distinct_sellers();
        let mut accounts = HashMap::with_capacity(seller_ids.len());
        for seller_id in &seller_ids {
            let account = self
                .store
                .get_account_txn(&txn, seller_id)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Account not found for seller {seller_id}"))
                })?;
            accounts.insert(seller_id.clone(), account);
        }

        let mut entries = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let account = accounts.get_mut(&item.seller_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Account not found for seller {}", item.seller_id))
            })?;

            let mut entry =
                LedgerEntry::order_credit(&item.seller_id, item.line_total, &order.id, now);
            if payment_received {
                account.credit(item.line_total, now);
                entry.complete(actor_id, now);
            } else {
                entry.fail(actor_id, now);
            }
            entries.push(entry);
        }

        self.store.insert_ledger_entries(&txn, &entries)?;
        for account in accounts.values() {
            self.store.put_account_txn(&txn, account)?;
        }

        order.settle(payment_received, now);
        self.store.put_order_txn(&txn, &order)?;

        self.store.commit(txn)?;

        tracing::info!(
            order_id,
            payment_received,
            sellers = seller_ids.len(),
            entries = entries.len(),
            amount = %order.amount,
            "Order settlement committed"
        );
        Ok(order)
    }
}
