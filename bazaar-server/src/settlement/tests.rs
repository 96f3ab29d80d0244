use super::*;
use crate::models::{
    Account, DeliveryAddress, EntryDirection, EntryStatus, Order, OrderItem, OrderStatus,
    PaymentMethod,
};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn create_test_service() -> (SettlementService, Arc<MarketStore>) {
    let store = Arc::new(MarketStore::open_in_memory().unwrap());
    (SettlementService::new(store.clone()), store)
}

fn seed_account(store: &MarketStore, user_id: &str) {
    let txn = store.begin_write().unwrap();
    store
        .put_account_txn(&txn, &Account::new(user_id, 0))
        .unwrap();
    store.commit(txn).unwrap();
}

/// Buyer cart scenario from the storefront: Product A ($30 × 2, seller-1)
/// and Product B ($10 × 1, seller-2), total 70
fn seed_two_seller_order(store: &MarketStore) -> Order {
    let order = Order::new(
        "buyer-1",
        vec![
            OrderItem::new("prod-a", "Product A", "seller-1", 2, dec("30")),
            OrderItem::new("prod-b", "Product B", "seller-2", 1, dec("10")),
        ],
        DeliveryAddress::default(),
        PaymentMethod::BankTransfer,
        0,
    );
    let txn = store.begin_write().unwrap();
    store.put_order_txn(&txn, &order).unwrap();
    store.index_order_txn(&txn, &order).unwrap();
    store.commit(txn).unwrap();
    order
}

#[test]
fn test_acknowledge_received_credits_every_seller() {
    let (settlement, store) = create_test_service();
    seed_account(&store, "seller-1");
    seed_account(&store, "seller-2");
    let order = seed_two_seller_order(&store);

    let settled = settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap();

    assert_eq!(settled.payment_status, PaymentStatus::Completed);
    assert_eq!(settled.status, OrderStatus::Paid);

    let s1 = store.get_account("seller-1").unwrap().unwrap();
    let s2 = store.get_account("seller-2").unwrap().unwrap();
    assert_eq!(s1.balance, dec("60"));
    assert_eq!(s2.balance, dec("10"));

    let entries_s1 = store.ledger_entries_for_user("seller-1").unwrap();
    assert_eq!(entries_s1.len(), 1);
    assert_eq!(entries_s1[0].direction, EntryDirection::Credit);
    assert_eq!(entries_s1[0].status, EntryStatus::Completed);
    assert_eq!(entries_s1[0].amount, dec("60"));
    assert_eq!(entries_s1[0].completed_by.as_deref(), Some("admin-1"));
    assert_eq!(entries_s1[0].order_id.as_deref(), Some(order.id.as_str()));

    let entries_s2 = store.ledger_entries_for_user("seller-2").unwrap();
    assert_eq!(entries_s2.len(), 1);
    assert_eq!(entries_s2[0].amount, dec("10"));
}

#[test]
fn test_acknowledge_not_received_leaves_balances_untouched() {
    let (settlement, store) = create_test_service();
    seed_account(&store, "seller-1");
    seed_account(&store, "seller-2");
    let order = seed_two_seller_order(&store);

    let settled = settlement
        .acknowledge_payment(&order.id, false, "admin-1")
        .unwrap();

    assert_eq!(settled.payment_status, PaymentStatus::Failed);
    assert_eq!(settled.status, OrderStatus::Rejected);

    assert_eq!(
        store.get_account("seller-1").unwrap().unwrap().balance,
        Decimal::ZERO
    );
    assert_eq!(
        store.get_account("seller-2").unwrap().unwrap().balance,
        Decimal::ZERO
    );

    // The failed attempt is still recorded in the ledger
    let entries = store.ledger_entries_for_user("seller-1").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, EntryStatus::Failed);
}

#[test]
fn test_reacknowledgement_is_rejected() {
    let (settlement, store) = create_test_service();
    seed_account(&store, "seller-1");
    seed_account(&store, "seller-2");
    let order = seed_two_seller_order(&store);

    settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap();

    let err = settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // No double credit
    assert_eq!(
        store.get_account("seller-1").unwrap().unwrap().balance,
        dec("60")
    );
    assert_eq!(store.ledger_entries_for_user("seller-1").unwrap().len(), 1);
}

#[test]
fn test_missing_seller_account_aborts_whole_settlement() {
    let (settlement, store) = create_test_service();
    // Three sellers, the middle one has no account
    seed_account(&store, "seller-1");
    seed_account(&store, "seller-3");

    let order = Order::new(
        "buyer-1",
        vec![
            OrderItem::new("prod-a", "Product A", "seller-1", 2, dec("30")),
            OrderItem::new("prod-b", "Product B", "seller-2", 1, dec("10")),
            OrderItem::new("prod-c", "Product C", "seller-3", 1, dec("5")),
        ],
        DeliveryAddress::default(),
        PaymentMethod::BankTransfer,
        0,
    );
    let txn = store.begin_write().unwrap();
    store.put_order_txn(&txn, &order).unwrap();
    store.index_order_txn(&txn, &order).unwrap();
    store.commit(txn).unwrap();

    let err = settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap_err();
    match err {
        ServiceError::NotFound(msg) => assert!(msg.contains("seller-2"), "got: {msg}"),
        other => panic!("expected NotFound, got {other:?}"),
    }

    // Full rollback: no entries, no balance change, order untouched
    for seller in ["seller-1", "seller-3"] {
        assert_eq!(
            store.get_account(seller).unwrap().unwrap().balance,
            Decimal::ZERO
        );
        assert!(store.ledger_entries_for_user(seller).unwrap().is_empty());
    }
    let reloaded = store.get_order(&order.id).unwrap().unwrap();
    assert_eq!(reloaded.payment_status, PaymentStatus::Pending);
    assert_eq!(reloaded.status, OrderStatus::Pending);

    // Once the account exists the same call succeeds
    seed_account(&store, "seller-2");
    settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap();
    assert_eq!(
        store.get_account("seller-1").unwrap().unwrap().balance,
        dec("60")
    );
    assert_eq!(
        store.get_account("seller-3").unwrap().unwrap().balance,
        dec("5")
    );
}

#[test]
fn test_unknown_order_is_not_found() {
    let (settlement, _) = create_test_service();
    assert!(matches!(
        settlement
            .acknowledge_payment("missing", true, "admin-1")
            .unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[test]
fn test_multiple_lines_same_seller_credit_once_per_line() {
    let (settlement, store) = create_test_service();
    seed_account(&store, "seller-1");

    let order = Order::new(
        "buyer-1",
        vec![
            OrderItem::new("prod-a", "Product A", "seller-1", 1, dec("12.50")),
            OrderItem::new("prod-c", "Product C", "seller-1", 3, dec("4.00")),
        ],
        DeliveryAddress::default(),
        PaymentMethod::Crypto,
        0,
    );
    let txn = store.begin_write().unwrap();
    store.put_order_txn(&txn, &order).unwrap();
    store.commit(txn).unwrap();

    settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap();

    // One credit entry per line, balance is their sum
    let entries = store.ledger_entries_for_user("seller-1").unwrap();
    assert_eq!(entries.len(), 2);
    let account = store.get_account("seller-1").unwrap().unwrap();
    assert_eq!(account.balance, dec("24.50"));
}

#[test]
fn test_ledger_conservation_across_settlements() {
    let (settlement, store) = create_test_service();
    seed_account(&store, "seller-1");
    seed_account(&store, "seller-2");

    for received in [true, false, true] {
        let order = seed_two_seller_order(&store);
        settlement
            .acknowledge_payment(&order.id, received, "admin-1")
            .unwrap();
    }

    // balance == Σ completed credits − Σ completed debits, for every account
    for seller in ["seller-1", "seller-2"] {
        let account = store.get_account(seller).unwrap().unwrap();
        let entries = store.ledger_entries_for_user(seller).unwrap();
        let expected: Decimal = entries
            .iter()
            .filter(|e| e.status == EntryStatus::Completed)
            .map(|e| match e.direction {
                EntryDirection::Credit => e.amount,
                EntryDirection::Debit => -e.amount,
            })
            .sum();
        assert_eq!(account.balance, expected, "conservation broken for {seller}");
    }
}
