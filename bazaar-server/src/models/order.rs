//! Order model
//!
//! An order is created atomically from a cart snapshot with prices re-fetched
//! from the catalog at creation time. `amount` is locked in at creation and
//! never recomputed. Fulfillment status is tracked **per line item**; the
//! order-level `Released` status is derived (every line released).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::round_money;

/// How the buyer pays the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Crypto,
}

/// Settlement verdict for the order's payment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Order fulfillment status (`Completed` and `Rejected` are terminal)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Released,
    Completed,
    Rejected,
}

/// Per-line fulfillment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    Released,
    Completed,
}

/// Delivery address (all fields optional, per the storefront form)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// One order line: price and seller snapshotted at order creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub title: String,
    pub seller_id: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub status: ItemStatus,
    pub released_at: Option<i64>,
}

impl OrderItem {
    pub fn new(
        product_id: impl Into<String>,
        title: impl Into<String>,
        seller_id: impl Into<String>,
        quantity: i32,
        unit_price: Decimal,
    ) -> Self {
        let unit_price = round_money(unit_price);
        Self {
            product_id: product_id.into(),
            title: title.into(),
            seller_id: seller_id.into(),
            quantity,
            unit_price,
            line_total: crate::money::line_total(unit_price, quantity),
            status: ItemStatus::Pending,
            released_at: None,
        }
    }
}

/// Multi-seller order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub items: Vec<OrderItem>,
    /// Sum of line totals, locked in at creation
    pub amount: Decimal,
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub payment_proof: Option<String>,
    pub is_paid: bool,
    pub paid_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Build a new pending order from resolved line items.
    ///
    /// `amount` is computed here once and never recomputed afterwards.
    pub fn new(
        buyer_id: impl Into<String>,
        items: Vec<OrderItem>,
        delivery_address: DeliveryAddress,
        payment_method: PaymentMethod,
        now: i64,
    ) -> Self {
        let amount = round_money(items.iter().map(|i| i.line_total).sum());
        Self {
            id: Uuid::new_v4().to_string(),
            buyer_id: buyer_id.into(),
            items,
            amount,
            delivery_address,
            payment_method,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            payment_proof: None,
            is_paid: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Distinct seller ids, in first-appearance order
    pub fn distinct_sellers(&self) -> Vec<String> {
        let mut sellers: Vec<String> = Vec::new();
        for item in &self.items {
            if !sellers.iter().any(|s| s == &item.seller_id) {
                sellers.push(item.seller_id.clone());
            }
        }
        sellers
    }

    /// Record the buyer's proof-of-payment submission
    pub fn record_payment_proof(&mut self, proof_url: String, method: PaymentMethod, now: i64) {
        self.payment_proof = Some(proof_url);
        self.payment_method = method;
        self.is_paid = true;
        self.status = OrderStatus::Paid;
        self.paid_at = Some(now);
        self.updated_at = now;
    }

    /// Apply the settlement verdict to the order-level statuses
    pub fn settle(&mut self, payment_received: bool, now: i64) {
        if payment_received {
            self.payment_status = PaymentStatus::Completed;
            self.status = OrderStatus::Paid;
        } else {
            self.payment_status = PaymentStatus::Failed;
            self.status = OrderStatus::Rejected;
        }
        self.updated_at = now;
    }

    /// Number of lines in this order owned by the given seller
    pub fn seller_line_count(&self, seller_id: &str) -> usize {
        self.items
            .iter()
            .filter(|i| i.seller_id == seller_id)
            .count()
    }

    /// Mark the given seller's pending lines as released.
    ///
    /// Returns how many lines changed; the order-level status flips to
    /// `Released` only once every line is released.
    pub fn release_for_seller(&mut self, seller_id: &str, now: i64) -> usize {
        let mut released = 0;
        for item in &mut self.items {
            if item.seller_id == seller_id && item.status == ItemStatus::Pending {
                item.status = ItemStatus::Released;
                item.released_at = Some(now);
                released += 1;
            }
        }
        if released > 0 {
            if self.all_items_released() {
                self.status = OrderStatus::Released;
            }
            self.updated_at = now;
        }
        released
    }

    pub fn all_items_released(&self) -> bool {
        self.items.iter().all(|i| i.status != ItemStatus::Pending)
    }

    /// Terminal transition: every line and the order become `Completed`
    pub fn complete(&mut self, now: i64) {
        for item in &mut self.items {
            item.status = ItemStatus::Completed;
        }
        self.status = OrderStatus::Completed;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn two_seller_order() -> Order {
        Order::new(
            "buyer-1",
            vec![
                OrderItem::new("prod-a", "Product A", "seller-1", 2, dec("30")),
                OrderItem::new("prod-b", "Product B", "seller-2", 1, dec("10")),
            ],
            DeliveryAddress::default(),
            PaymentMethod::BankTransfer,
            0,
        )
    }

    #[test]
    fn test_amount_is_sum_of_line_totals() {
        let order = two_seller_order();
        assert_eq!(order.amount, dec("70"));
        assert_eq!(order.items[0].line_total, dec("60"));
        assert_eq!(order.items[1].line_total, dec("10"));
    }

    #[test]
    fn test_distinct_sellers_dedupes() {
        let mut order = two_seller_order();
        order
            .items
            .push(OrderItem::new("prod-c", "Product C", "seller-1", 1, dec("5")));
        assert_eq!(order.distinct_sellers(), vec!["seller-1", "seller-2"]);
    }

    #[test]
    fn test_release_is_per_seller_with_derived_order_status() {
        let mut order = two_seller_order();
        order.settle(true, 1);

        assert_eq!(order.release_for_seller("seller-1", 2), 1);
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.items[0].status, ItemStatus::Released);
        assert_eq!(order.items[1].status, ItemStatus::Pending);

        assert_eq!(order.release_for_seller("seller-2", 3), 1);
        assert_eq!(order.status, OrderStatus::Released);
    }

    #[test]
    fn test_release_for_unknown_seller_changes_nothing() {
        let mut order = two_seller_order();
        assert_eq!(order.release_for_seller("seller-9", 1), 0);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
