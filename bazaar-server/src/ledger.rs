//! Account and ledger service
//!
//! Owns the Account and LedgerEntry stores exclusively; no other component
//! mutates a balance directly. A withdrawal debits the balance at request
//! time (optimistic reservation, so the same funds cannot be double-
//! withdrawn concurrently) and credits it back only if an admin rejects the
//! request.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::catalog::Identity;
use crate::models::{Account, EntryDirection, LedgerEntry, PayoutDestination};
use crate::money::validate_amount;
use crate::store::MarketStore;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{ServiceError, ServiceResult, now_millis};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<MarketStore>,
    identity: Arc<dyn Identity>,
}

impl AccountService {
    pub fn new(store: Arc<MarketStore>, identity: Arc<dyn Identity>) -> Self {
        Self { store, identity }
    }

    /// Create the 1:1 account for a user (registration hook)
    pub async fn open_account(&self, user_id: &str) -> ServiceResult<Account> {
        self.identity
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User not found: {user_id}")))?;

        let txn = self.store.begin_write()?;
        if self.store.get_account_txn(&txn, user_id)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Account already exists for user {user_id}"
            )));
        }

        let account = Account::new(user_id, now_millis());
        self.store.put_account_txn(&txn, &account)?;
        self.store.commit(txn)?;

        tracing::info!(user_id, "Account opened");
        Ok(account)
    }

    /// Get a user's account
    pub fn get_account(&self, user_id: &str) -> ServiceResult<Account> {
        self.store
            .get_account(user_id)?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))
    }

    /// The user's ledger entries, newest first
    pub fn ledger_history(&self, user_id: &str) -> ServiceResult<Vec<LedgerEntry>> {
        let mut entries = self.store.ledger_entries_for_user(user_id)?;
        entries.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        Ok(entries)
    }

    /// Replace the account's saved withdrawal destination profiles
    pub fn update_withdrawal_details(
        &self,
        user_id: &str,
        details: Vec<PayoutDestination>,
    ) -> ServiceResult<Account> {
        for destination in &details {
            validate_destination(destination)?;
        }

        let txn = self.store.begin_write()?;
        let mut account = self
            .store
            .get_account_txn(&txn, user_id)?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;
        account.withdrawal_details = details;
        account.updated_at = now_millis();
        self.store.put_account_txn(&txn, &account)?;
        self.store.commit(txn)?;
        Ok(account)
    }

    /// Delete an account; refused while money or pending entries remain
    pub fn close_account(&self, user_id: &str) -> ServiceResult<()> {
        let txn = self.store.begin_write()?;
        let account = self
            .store
            .get_account_txn(&txn, user_id)?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;

        if account.balance != Decimal::ZERO {
            return Err(ServiceError::InvalidState(
                "Account balance must be zero before closing".to_string(),
            ));
        }
        if self.store.has_pending_entries_txn(&txn, user_id)? {
            return Err(ServiceError::InvalidState(
                "Account has pending ledger entries".to_string(),
            ));
        }

        // Ledger entries are kept for audit; only the account row goes
        self.store.remove_account_txn(&txn, user_id)?;
        self.store.commit(txn)?;

        tracing::info!(user_id, "Account closed");
        Ok(())
    }

    /// Request a withdrawal: reserve the funds now, pay out on admin approval.
    ///
    /// The balance is debited immediately; a pending debit entry snapshots
    /// the payout destination.
    pub fn request_withdrawal(
        &self,
        user_id: &str,
        destination: PayoutDestination,
        amount: Decimal,
    ) -> ServiceResult<(LedgerEntry, Account)> {
        validate_amount(amount, "amount")?;
        validate_destination(&destination)?;
        let now = now_millis();

        let txn = self.store.begin_write()?;
        let mut account = self
            .store
            .get_account_txn(&txn, user_id)?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;

        account.debit(amount, now)?;

        let entry = LedgerEntry::withdrawal(user_id, amount, destination, now);
        self.store
            .insert_ledger_entries(&txn, std::slice::from_ref(&entry))?;
        self.store.put_account_txn(&txn, &account)?;
        self.store.commit(txn)?;

        tracing::info!(
            user_id,
            entry_id = %entry.id,
            amount = %amount,
            balance = %account.balance,
            "Withdrawal requested"
        );
        Ok((entry, account))
    }

    /// Finalize a pending withdrawal.
    ///
    /// `is_completed = true` keeps the reservation (the debit already
    /// happened at request time); `false` reverses it, crediting the amount
    /// back.
    pub fn complete_withdrawal(
        &self,
        admin_id: &str,
        entry_id: &str,
        is_completed: bool,
    ) -> ServiceResult<LedgerEntry> {
        let now = now_millis();

        let txn = self.store.begin_write()?;
        let mut entry = self
            .store
            .get_ledger_entry_txn(&txn, entry_id)?
            .ok_or_else(|| ServiceError::NotFound("Transaction not found".to_string()))?;

        if !entry.is_pending() || entry.direction != EntryDirection::Debit {
            return Err(ServiceError::InvalidState(
                "No pending withdrawal".to_string(),
            ));
        }

        if is_completed {
            entry.complete(admin_id, now);
        } else {
            entry.fail(admin_id, now);
            // Rejected: reverse the reservation
            let mut account = self
                .store
                .get_account_txn(&txn, &entry.user_id)?
                .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;
            account.credit(entry.amount, now);
            self.store.put_account_txn(&txn, &account)?;
        }

        self.store.put_ledger_entry_txn(&txn, &entry)?;
        self.store.commit(txn)?;

        tracing::info!(
            entry_id,
            admin_id,
            is_completed,
            user_id = %entry.user_id,
            "Withdrawal finalized"
        );
        Ok(entry)
    }
}

fn validate_destination(destination: &PayoutDestination) -> ServiceResult<()> {
    match destination {
        PayoutDestination::Bank {
            account_name,
            account_number,
            bank_name,
        } => {
            validate_required_text(account_name, "account_name", MAX_NAME_LEN)?;
            validate_required_text(account_number, "account_number", MAX_SHORT_TEXT_LEN)?;
            validate_required_text(bank_name, "bank_name", MAX_NAME_LEN)?;
        }
        PayoutDestination::Crypto {
            wallet_address,
            symbol,
            network,
        } => {
            validate_required_text(wallet_address, "wallet_address", MAX_SHORT_TEXT_LEN)?;
            validate_required_text(symbol, "symbol", MAX_SHORT_TEXT_LEN)?;
            validate_required_text(network, "network", MAX_SHORT_TEXT_LEN)?;
        }
    }
    Ok(())
}
