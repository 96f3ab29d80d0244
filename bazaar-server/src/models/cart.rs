//! Cart line model
//!
//! One line per (user, product). The snapshotted title/price/image are for
//! display only; the order builder re-fetches price and seller at checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::round_money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub user_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub title: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
    pub added_at: i64,
    pub updated_at: i64,
}

impl CartLine {
    pub fn new(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i32,
        title: impl Into<String>,
        unit_price: Decimal,
        image: Option<String>,
        now: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            quantity,
            title: title.into(),
            unit_price: round_money(unit_price),
            image,
            added_at: now,
            updated_at: now,
        }
    }
}
