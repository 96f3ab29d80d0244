//! Account and ledger entry models
//!
//! The ledger invariant: for every account,
//! `balance == Σ(completed credits) − Σ(completed debits)`.
//! Balance mutation goes exclusively through [`Account::credit`] /
//! [`Account::debit`]; no other code touches the field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::round_money;
use crate::utils::{ServiceError, ServiceResult};

/// Ledger entry direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    Credit,
    Debit,
}

/// Ledger entry status (`Completed` and `Failed` are terminal)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
}

/// Snapshot of where a withdrawal is paid out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayoutDestination {
    Bank {
        account_name: String,
        account_number: String,
        bank_name: String,
    },
    Crypto {
        wallet_address: String,
        symbol: String,
        network: String,
    },
}

/// Per-user account: running balance plus withdrawal destination profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub balance: Decimal,
    #[serde(default)]
    pub withdrawal_details: Vec<PayoutDestination>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Account {
    /// New account with zero balance (created once, at user registration)
    pub fn new(user_id: impl Into<String>, now: i64) -> Self {
        Self {
            user_id: user_id.into(),
            balance: Decimal::ZERO,
            withdrawal_details: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add to the balance
    pub fn credit(&mut self, amount: Decimal, now: i64) {
        self.balance = round_money(self.balance + amount);
        self.updated_at = now;
    }

    /// Subtract from the balance; the balance never goes negative
    pub fn debit(&mut self, amount: Decimal, now: i64) -> ServiceResult<()> {
        if amount > self.balance {
            return Err(ServiceError::InvalidArgument(
                "Insufficient balance".to_string(),
            ));
        }
        self.balance = round_money(self.balance - amount);
        self.updated_at = now;
        Ok(())
    }
}

/// Append-only ledger entry (immutable once terminal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub user_id: String,
    pub direction: EntryDirection,
    pub amount: Decimal,
    pub description: String,
    pub status: EntryStatus,
    pub completed_by: Option<String>,
    pub completed_at: Option<i64>,
    /// Payout destination snapshot (withdrawal entries only)
    pub destination: Option<PayoutDestination>,
    /// Originating order (settlement credits only)
    pub order_id: Option<String>,
    pub created_at: i64,
}

impl LedgerEntry {
    /// Pending credit for one order line, awaiting the settlement verdict
    pub fn order_credit(
        user_id: impl Into<String>,
        amount: Decimal,
        order_id: impl Into<String>,
        now: i64,
    ) -> Self {
        let order_id = order_id.into();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            direction: EntryDirection::Credit,
            amount: round_money(amount),
            description: format!("Sale settlement for order {}", order_id),
            status: EntryStatus::Pending,
            completed_by: None,
            completed_at: None,
            destination: None,
            order_id: Some(order_id),
            created_at: now,
        }
    }

    /// Pending debit reserving funds for a withdrawal request
    pub fn withdrawal(
        user_id: impl Into<String>,
        amount: Decimal,
        destination: PayoutDestination,
        now: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            direction: EntryDirection::Debit,
            amount: round_money(amount),
            description: "Withdrawal request".to_string(),
            status: EntryStatus::Pending,
            completed_by: None,
            completed_at: None,
            destination: Some(destination),
            order_id: None,
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    /// Move to `Completed`, stamping the completer
    pub fn complete(&mut self, actor_id: impl Into<String>, now: i64) {
        self.status = EntryStatus::Completed;
        self.completed_by = Some(actor_id.into());
        self.completed_at = Some(now);
    }

    /// Move to `Failed`, stamping the completer
    pub fn fail(&mut self, actor_id: impl Into<String>, now: i64) {
        self.status = EntryStatus::Failed;
        self.completed_by = Some(actor_id.into());
        self.completed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_debit_rejects_overdraft() {
        let mut account = Account::new("user-1", 0);
        account.credit(dec("100"), 1);

        assert!(account.debit(dec("100.01"), 2).is_err());
        assert_eq!(account.balance, dec("100"));

        account.debit(dec("100"), 3).unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
    }

    #[test]
    fn test_entry_completion_stamps_actor() {
        let mut entry = LedgerEntry::withdrawal(
            "user-1",
            dec("50"),
            PayoutDestination::Crypto {
                wallet_address: "0xabc".to_string(),
                symbol: "USDT".to_string(),
                network: "TRC20".to_string(),
            },
            100,
        );
        assert!(entry.is_pending());

        entry.complete("admin-1", 200);
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.completed_by.as_deref(), Some("admin-1"));
        assert_eq!(entry.completed_at, Some(200));
    }
}
