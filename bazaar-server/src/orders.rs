//! Order builder and fulfillment state machine
//!
//! `create_order` turns a cart snapshot into a priced multi-seller order:
//! every line is re-resolved against the catalog at checkout (the cart's
//! stored price is never trusted), the total is locked in at creation, and
//! the consumed cart lines are cleared in the same transaction that persists
//! the order.
//!
//! Fulfillment runs per line item: each seller releases their own lines, the
//! order-level `Released` status is derived, and `Completed` requires it.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::models::{
    DeliveryAddress, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
};
use crate::money::validate_price;
use crate::store::MarketStore;
use crate::utils::validation::{MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text};
use crate::utils::{ServiceError, ServiceResult, now_millis};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<MarketStore>,
    catalog: Arc<dyn Catalog>,
}

impl OrderService {
    pub fn new(store: Arc<MarketStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Create an order from the buyer's cart.
    ///
    /// All-or-nothing: every line must re-resolve against the catalog before
    /// anything is written; a vanished product aborts with the cart intact.
    pub async fn create_order(
        &self,
        buyer_id: &str,
        delivery_address: DeliveryAddress,
        payment_method: PaymentMethod,
    ) -> ServiceResult<Order> {
        validate_delivery_address(&delivery_address)?;

        let lines = self.store.cart_lines(buyer_id)?;
        if lines.is_empty() {
            return Err(ServiceError::InvalidState("Cart is empty".to_string()));
        }

        // Re-resolve every product for current price and seller; the cart's
        // snapshot is display-only and may be stale
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = self
                .catalog
                .product_by_id(&line.product_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product not found: {}", line.product_id))
                })?;
            validate_price(product.price, "price")?;
            items.push(OrderItem::new(
                product.id,
                product.title,
                product.seller_id,
                line.quantity,
                product.price,
            ));
        }

        let now = now_millis();
        let order = Order::new(buyer_id, items, delivery_address, payment_method, now);

        let txn = self.store.begin_write()?;
        self.store.put_order_txn(&txn, &order)?;
        self.store.index_order_txn(&txn, &order)?;
        // Remove exactly the consumed lines; a line added mid-checkout survives
        for line in &lines {
            self.store
                .remove_cart_line_txn(&txn, buyer_id, &line.product_id)?;
        }
        self.store.commit(txn)?;

        tracing::info!(
            order_id = %order.id,
            buyer_id,
            amount = %order.amount,
            lines = order.items.len(),
            "Order created"
        );
        Ok(order)
    }

    /// Get an order by id
    pub fn get_order(&self, order_id: &str) -> ServiceResult<Order> {
        self.store
            .get_order(order_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {order_id}")))
    }

    /// Orders placed by a buyer, newest first
    pub fn orders_for_buyer(&self, buyer_id: &str) -> ServiceResult<Vec<Order>> {
        let mut orders = self.store.orders_for_buyer(buyer_id)?;
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    /// Orders containing lines sold by a seller, newest first
    pub fn orders_for_seller(&self, seller_id: &str) -> ServiceResult<Vec<Order>> {
        let mut orders = self.store.orders_for_seller(seller_id)?;
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    /// Release the caller's lines in an order.
    ///
    /// Only the lines' seller may release them; settlement must have
    /// confirmed the payment first.
    pub fn release_items(&self, order_id: &str, seller_id: &str) -> ServiceResult<Order> {
        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {order_id}")))?;

        if order.payment_status != PaymentStatus::Completed {
            return Err(ServiceError::InvalidState(
                "Payment has not been confirmed for this order".to_string(),
            ));
        }
        match order.status {
            OrderStatus::Paid | OrderStatus::Released => {}
            _ => {
                return Err(ServiceError::InvalidState(format!(
                    "Cannot release items from an order in status {:?}",
                    order.status
                )));
            }
        }
        if order.seller_line_count(seller_id) == 0 {
            return Err(ServiceError::Forbidden(
                "You are not authorized to release items in this order".to_string(),
            ));
        }

        let now = now_millis();
        let released = order.release_for_seller(seller_id, now);
        if released == 0 {
            return Err(ServiceError::InvalidState(
                "All your items in this order are already released".to_string(),
            ));
        }

        self.store.put_order_txn(&txn, &order)?;
        self.store.commit(txn)?;

        tracing::info!(order_id, seller_id, released, status = ?order.status, "Items released");
        Ok(order)
    }

    /// Complete an order; requires every line to have been released
    pub fn complete_order(&self, order_id: &str) -> ServiceResult<Order> {
        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order not found: {order_id}")))?;

        if order.status != OrderStatus::Released {
            return Err(ServiceError::InvalidState(
                "Order must be released before it can be completed".to_string(),
            ));
        }

        order.complete(now_millis());
        self.store.put_order_txn(&txn, &order)?;
        self.store.commit(txn)?;

        tracing::info!(order_id, "Order completed");
        Ok(order)
    }
}

fn validate_delivery_address(address: &DeliveryAddress) -> ServiceResult<()> {
    validate_optional_text(&address.full_name, "full_name", MAX_NAME_LEN)?;
    validate_optional_text(&address.phone_number, "phone_number", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&address.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&address.city, "city", MAX_NAME_LEN)?;
    validate_optional_text(&address.state, "state", MAX_NAME_LEN)?;
    Ok(())
}
