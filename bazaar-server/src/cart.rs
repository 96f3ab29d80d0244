//! Cart aggregator
//!
//! Per-user mutable basket, source of truth until order placement. Cart
//! mutation races resolve through the store's find-then-increment upsert;
//! carts are not financial state, so exact-once semantics under extreme
//! concurrency are not guaranteed.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::models::CartLine;
use crate::money::{MAX_QUANTITY, validate_quantity};
use crate::store::MarketStore;
use crate::utils::{ServiceError, ServiceResult, now_millis};

/// Result of a quantity decrease
#[derive(Debug, PartialEq, Eq)]
pub enum CartMutation {
    Updated(i32),
    Removed,
}

#[derive(Clone)]
pub struct CartService {
    store: Arc<MarketStore>,
    catalog: Arc<dyn Catalog>,
}

impl CartService {
    pub fn new(store: Arc<MarketStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Add a product to the cart; an existing line accumulates quantity.
    ///
    /// The catalog is only consulted when a new line is created; the
    /// snapshotted title/price/image are display-only (checkout re-fetches).
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i32,
    ) -> ServiceResult<CartLine> {
        validate_quantity(quantity)?;
        let now = now_millis();

        // Fast path: the line already exists, accumulate in place
        {
            let txn = self.store.begin_write()?;
            if let Some(mut line) = self.store.get_cart_line_txn(&txn, user_id, product_id)? {
                line.quantity = accumulate(line.quantity, quantity)?;
                line.updated_at = now;
                self.store.put_cart_line_txn(&txn, &line)?;
                self.store.commit(txn)?;
                return Ok(line);
            }
            // no line yet; drop the transaction before the catalog call
        }

        let product = self
            .catalog
            .product_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product not found: {product_id}")))?;

        let txn = self.store.begin_write()?;
        // Re-check under the writer: a concurrent add may have won the race
        let line = match self.store.get_cart_line_txn(&txn, user_id, product_id)? {
            Some(mut existing) => {
                existing.quantity = accumulate(existing.quantity, quantity)?;
                existing.updated_at = now;
                existing
            }
            None => CartLine::new(
                user_id,
                product_id,
                quantity,
                product.title,
                product.price,
                product.images.first().cloned(),
                now,
            ),
        };
        self.store.put_cart_line_txn(&txn, &line)?;
        self.store.commit(txn)?;

        tracing::debug!(user_id, product_id, quantity = line.quantity, "Cart line upserted");
        Ok(line)
    }

    /// All cart lines for a user
    pub fn list(&self, user_id: &str) -> ServiceResult<Vec<CartLine>> {
        Ok(self.store.cart_lines(user_id)?)
    }

    /// Remove one line; idempotent, reports whether a line existed
    pub fn remove_item(&self, user_id: &str, product_id: &str) -> ServiceResult<bool> {
        let txn = self.store.begin_write()?;
        let removed = self.store.remove_cart_line_txn(&txn, user_id, product_id)?;
        self.store.commit(txn)?;
        Ok(removed)
    }

    /// Delete every line; idempotent no-op when the cart is already empty
    pub fn clear(&self, user_id: &str) -> ServiceResult<usize> {
        let txn = self.store.begin_write()?;
        let removed = self.store.clear_cart_txn(&txn, user_id)?;
        self.store.commit(txn)?;
        Ok(removed)
    }

    /// Increase an existing line's quantity
    pub fn increase(&self, user_id: &str, product_id: &str, quantity: i32) -> ServiceResult<CartLine> {
        validate_quantity(quantity)?;

        let txn = self.store.begin_write()?;
        let mut line = self
            .store
            .get_cart_line_txn(&txn, user_id, product_id)?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".to_string()))?;
        line.quantity = accumulate(line.quantity, quantity)?;
        line.updated_at = now_millis();
        self.store.put_cart_line_txn(&txn, &line)?;
        self.store.commit(txn)?;
        Ok(line)
    }

    /// Decrease an existing line's quantity; dropping to zero or below
    /// deletes the line and reports it as removed
    pub fn decrease(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i32,
    ) -> ServiceResult<CartMutation> {
        validate_quantity(quantity)?;

        let txn = self.store.begin_write()?;
        let mut line = self
            .store
            .get_cart_line_txn(&txn, user_id, product_id)?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".to_string()))?;

        if line.quantity <= quantity {
            self.store.remove_cart_line_txn(&txn, user_id, product_id)?;
            self.store.commit(txn)?;
            return Ok(CartMutation::Removed);
        }

        line.quantity -= quantity;
        line.updated_at = now_millis();
        self.store.put_cart_line_txn(&txn, &line)?;
        self.store.commit(txn)?;
        Ok(CartMutation::Updated(line.quantity))
    }
}

/// Accumulate quantities, keeping the line within bounds
fn accumulate(current: i32, delta: i32) -> ServiceResult<i32> {
    let next = current.saturating_add(delta);
    if next > MAX_QUANTITY {
        return Err(ServiceError::InvalidArgument(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY})"
        )));
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::catalog::ProductInfo;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn setup() -> (CartService, MemoryCatalog) {
        let store = Arc::new(MarketStore::open_in_memory().unwrap());
        let catalog = MemoryCatalog::new();
        catalog.insert(ProductInfo {
            id: "prod-a".to_string(),
            title: "Product A".to_string(),
            price: dec("30.00"),
            seller_id: "seller-1".to_string(),
            images: vec!["https://img/a.jpg".to_string()],
        });
        let service = CartService::new(store, Arc::new(catalog.clone()));
        (service, catalog)
    }

    #[tokio::test]
    async fn test_add_item_snapshots_product() {
        let (service, _) = setup();

        let line = service.add_item("buyer-1", "prod-a", 2).await.unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.title, "Product A");
        assert_eq!(line.unit_price, dec("30.00"));
        assert_eq!(line.image.as_deref(), Some("https://img/a.jpg"));
    }

    #[tokio::test]
    async fn test_add_item_accumulates_existing_line() {
        let (service, catalog) = setup();

        service.add_item("buyer-1", "prod-a", 2).await.unwrap();
        // An existing line accumulates without consulting the catalog
        catalog.remove("prod-a");
        let line = service.add_item("buyer-1", "prod-a", 3).await.unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(service.list("buyer-1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_item_unknown_product_fails() {
        let (service, _) = setup();

        let err = service.add_item("buyer-1", "prod-x", 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(service.list("buyer-1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_item_rejects_non_positive_quantity() {
        let (service, _) = setup();

        assert!(matches!(
            service.add_item("buyer-1", "prod-a", 0).await.unwrap_err(),
            ServiceError::InvalidArgument(_)
        ));
        assert!(matches!(
            service.add_item("buyer-1", "prod-a", -3).await.unwrap_err(),
            ServiceError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_decrease_to_zero_removes_line() {
        let (service, _) = setup();

        service.add_item("buyer-1", "prod-a", 2).await.unwrap();
        assert_eq!(
            service.decrease("buyer-1", "prod-a", 1).unwrap(),
            CartMutation::Updated(1)
        );
        assert_eq!(
            service.decrease("buyer-1", "prod-a", 5).unwrap(),
            CartMutation::Removed
        );
        assert!(service.list("buyer-1").unwrap().is_empty());

        let err = service.decrease("buyer-1", "prod-a", 1).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (service, _) = setup();

        service.add_item("buyer-1", "prod-a", 2).await.unwrap();
        assert_eq!(service.clear("buyer-1").unwrap(), 1);
        // Clearing an already-empty cart succeeds silently
        assert_eq!(service.clear("buyer-1").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increase_missing_line_fails() {
        let (service, _) = setup();

        let err = service.increase("buyer-1", "prod-a", 1).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
