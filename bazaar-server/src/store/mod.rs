//! redb-based market store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `accounts` | `user_id` | `Account` | Per-user balance + payout profiles |
//! | `ledger_entries` | `entry_id` | `LedgerEntry` | Append-only ledger |
//! | `ledger_by_user` | `(user_id, entry_id)` | `()` | Per-user ledger index |
//! | `orders` | `order_id` | `Order` | Orders with line snapshots |
//! | `orders_by_buyer` | `(buyer_id, order_id)` | `()` | Buyer order index |
//! | `orders_by_seller` | `(seller_id, order_id)` | `()` | Seller order index |
//! | `cart_lines` | `(user_id, product_id)` | `CartLine` | Cart baskets |
//!
//! # Transactions
//!
//! redb 的单写者模型就是本系统唯一的同步权威：settlement 和 withdrawal 的
//! 多表变更都在一个 `WriteTransaction` 内完成，commit 前出错即整体回滚
//! (`WriteTransaction` dropped without commit aborts)。不存在应用层互斥锁。
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), so a crash can never leave a half-applied
//! settlement on disk.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Account, CartLine, LedgerEntry, Order};

/// Per-user accounts: key = user_id, value = JSON-serialized Account
const ACCOUNTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Ledger entries: key = entry_id, value = JSON-serialized LedgerEntry
const LEDGER_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("ledger_entries");

/// Per-user ledger index: key = (user_id, entry_id), value = empty
const LEDGER_BY_USER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("ledger_by_user");

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Buyer order index: key = (buyer_id, order_id), value = empty
const ORDERS_BY_BUYER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("orders_by_buyer");

/// Seller order index: key = (seller_id, order_id), value = empty
const ORDERS_BY_SELLER_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("orders_by_seller");

/// Cart lines: key = (user_id, product_id), value = JSON-serialized CartLine
const CART_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("cart_lines");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Market store backed by redb
#[derive(Clone)]
pub struct MarketStore {
    db: Arc<Database>,
}

impl MarketStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Create all tables so later read transactions never hit a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS_TABLE)?;
            let _ = write_txn.open_table(LEDGER_TABLE)?;
            let _ = write_txn.open_table(LEDGER_BY_USER_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_BY_BUYER_TABLE)?;
            let _ = write_txn.open_table(ORDERS_BY_SELLER_TABLE)?;
            let _ = write_txn.open_table(CART_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction (blocks while another writer is active)
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Commit a write transaction
    pub fn commit(&self, txn: WriteTransaction) -> StorageResult<()> {
        txn.commit()?;
        Ok(())
    }

    // ========== Account Operations ==========

    /// Get an account (read-only)
    pub fn get_account(&self, user_id: &str) -> StorageResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS_TABLE)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an account (within transaction)
    pub fn get_account_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
    ) -> StorageResult<Option<Account>> {
        let table = txn.open_table(ACCOUNTS_TABLE)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or update an account (within transaction)
    pub fn put_account_txn(&self, txn: &WriteTransaction, account: &Account) -> StorageResult<()> {
        let mut table = txn.open_table(ACCOUNTS_TABLE)?;
        let value = serde_json::to_vec(account)?;
        table.insert(account.user_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Remove an account (within transaction); ledger entries are kept
    pub fn remove_account_txn(&self, txn: &WriteTransaction, user_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ACCOUNTS_TABLE)?;
        table.remove(user_id)?;
        Ok(())
    }

    // ========== Ledger Operations ==========

    /// Get a ledger entry by id (read-only)
    pub fn get_ledger_entry(&self, entry_id: &str) -> StorageResult<Option<LedgerEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LEDGER_TABLE)?;
        match table.get(entry_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a ledger entry by id (within transaction)
    pub fn get_ledger_entry_txn(
        &self,
        txn: &WriteTransaction,
        entry_id: &str,
    ) -> StorageResult<Option<LedgerEntry>> {
        let table = txn.open_table(LEDGER_TABLE)?;
        match table.get(entry_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Batch-insert ledger entries and their per-user index rows.
    ///
    /// One call per settlement/withdrawal; all entries land in the same
    /// transaction or none do.
    pub fn insert_ledger_entries(
        &self,
        txn: &WriteTransaction,
        entries: &[LedgerEntry],
    ) -> StorageResult<()> {
        let mut table = txn.open_table(LEDGER_TABLE)?;
        let mut index = txn.open_table(LEDGER_BY_USER_TABLE)?;
        for entry in entries {
            let value = serde_json::to_vec(entry)?;
            table.insert(entry.id.as_str(), value.as_slice())?;
            index.insert((entry.user_id.as_str(), entry.id.as_str()), ())?;
        }
        Ok(())
    }

    /// Update an existing ledger entry (within transaction)
    pub fn put_ledger_entry_txn(
        &self,
        txn: &WriteTransaction,
        entry: &LedgerEntry,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(LEDGER_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert(entry.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// All ledger entries for a user (read-only, unsorted)
    pub fn ledger_entries_for_user(&self, user_id: &str) -> StorageResult<Vec<LedgerEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(LEDGER_BY_USER_TABLE)?;
        let table = read_txn.open_table(LEDGER_TABLE)?;

        let mut entries = Vec::new();
        for result in index.range((user_id, "")..)? {
            let (key, _) = result?;
            let (owner, entry_id) = key.value();
            if owner != user_id {
                break;
            }
            if let Some(value) = table.get(entry_id)? {
                entries.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(entries)
    }

    /// Whether the user has any pending ledger entry (within transaction)
    pub fn has_pending_entries_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
    ) -> StorageResult<bool> {
        let index = txn.open_table(LEDGER_BY_USER_TABLE)?;
        let table = txn.open_table(LEDGER_TABLE)?;

        for result in index.range((user_id, "")..)? {
            let (key, _) = result?;
            let (owner, entry_id) = key.value();
            if owner != user_id {
                break;
            }
            if let Some(value) = table.get(entry_id)? {
                let entry: LedgerEntry = serde_json::from_slice(value.value())?;
                if entry.is_pending() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    // ========== Order Operations ==========

    /// Get an order (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or update an order (within transaction)
    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Write the buyer/seller index rows for a newly created order
    pub fn index_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut buyer_index = txn.open_table(ORDERS_BY_BUYER_TABLE)?;
        buyer_index.insert((order.buyer_id.as_str(), order.id.as_str()), ())?;
        drop(buyer_index);

        let mut seller_index = txn.open_table(ORDERS_BY_SELLER_TABLE)?;
        for seller_id in order.distinct_sellers() {
            seller_index.insert((seller_id.as_str(), order.id.as_str()), ())?;
        }
        Ok(())
    }

    /// All orders placed by a buyer (read-only)
    pub fn orders_for_buyer(&self, buyer_id: &str) -> StorageResult<Vec<Order>> {
        self.orders_by_index(ORDERS_BY_BUYER_TABLE, buyer_id)
    }

    /// All orders containing lines sold by a seller (read-only)
    pub fn orders_for_seller(&self, seller_id: &str) -> StorageResult<Vec<Order>> {
        self.orders_by_index(ORDERS_BY_SELLER_TABLE, seller_id)
    }

    fn orders_by_index(
        &self,
        index_def: TableDefinition<(&'static str, &'static str), ()>,
        key: &str,
    ) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(index_def)?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in index.range((key, "")..)? {
            let (k, _) = result?;
            let (owner, order_id) = k.value();
            if owner != key {
                break;
            }
            if let Some(value) = table.get(order_id)? {
                orders.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(orders)
    }

    // ========== Cart Operations ==========

    /// Get a cart line (read-only)
    pub fn get_cart_line(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> StorageResult<Option<CartLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CART_TABLE)?;
        match table.get((user_id, product_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a cart line (within transaction)
    pub fn get_cart_line_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        product_id: &str,
    ) -> StorageResult<Option<CartLine>> {
        let table = txn.open_table(CART_TABLE)?;
        match table.get((user_id, product_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or update a cart line (within transaction)
    pub fn put_cart_line_txn(&self, txn: &WriteTransaction, line: &CartLine) -> StorageResult<()> {
        let mut table = txn.open_table(CART_TABLE)?;
        let value = serde_json::to_vec(line)?;
        table.insert((line.user_id.as_str(), line.product_id.as_str()), value.as_slice())?;
        Ok(())
    }

    /// Remove a cart line (within transaction); returns whether a line existed
    pub fn remove_cart_line_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        product_id: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(CART_TABLE)?;
        Ok(table.remove((user_id, product_id))?.is_some())
    }

    /// All cart lines for a user (read-only)
    pub fn cart_lines(&self, user_id: &str) -> StorageResult<Vec<CartLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CART_TABLE)?;

        let mut lines = Vec::new();
        for result in table.range((user_id, "")..)? {
            let (key, value) = result?;
            let (owner, _) = key.value();
            if owner != user_id {
                break;
            }
            lines.push(serde_json::from_slice(value.value())?);
        }
        Ok(lines)
    }

    /// Delete every cart line for a user (within transaction); idempotent
    pub fn clear_cart_txn(&self, txn: &WriteTransaction, user_id: &str) -> StorageResult<usize> {
        let mut table = txn.open_table(CART_TABLE)?;

        let mut product_ids = Vec::new();
        for result in table.range((user_id, "")..)? {
            let (key, _) = result?;
            let (owner, product_id) = key.value();
            if owner != user_id {
                break;
            }
            product_ids.push(product_id.to_string());
        }
        for product_id in &product_ids {
            table.remove((user_id, product_id.as_str()))?;
        }
        Ok(product_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, CartLine};
    use rust_decimal::Decimal;

    #[test]
    fn test_account_roundtrip() {
        let store = MarketStore::open_in_memory().unwrap();

        let account = Account::new("user-1", 100);
        let txn = store.begin_write().unwrap();
        store.put_account_txn(&txn, &account).unwrap();
        store.commit(txn).unwrap();

        let loaded = store.get_account("user-1").unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.balance, Decimal::ZERO);
        assert!(store.get_account("user-2").unwrap().is_none());
    }

    #[test]
    fn test_uncommitted_transaction_aborts_on_drop() {
        let store = MarketStore::open_in_memory().unwrap();

        {
            let txn = store.begin_write().unwrap();
            let account = Account::new("user-1", 0);
            store.put_account_txn(&txn, &account).unwrap();
            // dropped without commit
        }

        assert!(store.get_account("user-1").unwrap().is_none());
    }

    #[test]
    fn test_cart_prefix_scan_stays_within_user() {
        let store = MarketStore::open_in_memory().unwrap();

        let txn = store.begin_write().unwrap();
        for (user, product) in [("user-a", "p1"), ("user-a", "p2"), ("user-b", "p3")] {
            let line = CartLine::new(user, product, 1, "t", Decimal::ONE, None, 0);
            store.put_cart_line_txn(&txn, &line).unwrap();
        }
        store.commit(txn).unwrap();

        assert_eq!(store.cart_lines("user-a").unwrap().len(), 2);
        assert_eq!(store.cart_lines("user-b").unwrap().len(), 1);

        let txn = store.begin_write().unwrap();
        assert_eq!(store.clear_cart_txn(&txn, "user-a").unwrap(), 2);
        store.commit(txn).unwrap();

        assert!(store.cart_lines("user-a").unwrap().is_empty());
        assert_eq!(store.cart_lines("user-b").unwrap().len(), 1);
    }

    #[test]
    fn test_ledger_index_scans_per_user() {
        let store = MarketStore::open_in_memory().unwrap();

        let entries = vec![
            crate::models::LedgerEntry::order_credit("seller-1", Decimal::TEN, "order-1", 0),
            crate::models::LedgerEntry::order_credit("seller-2", Decimal::ONE, "order-1", 0),
        ];
        let txn = store.begin_write().unwrap();
        store.insert_ledger_entries(&txn, &entries).unwrap();
        store.commit(txn).unwrap();

        assert_eq!(store.ledger_entries_for_user("seller-1").unwrap().len(), 1);
        assert_eq!(store.ledger_entries_for_user("seller-2").unwrap().len(), 1);
        assert!(store.ledger_entries_for_user("seller-3").unwrap().is_empty());
    }
}
