//! Full marketplace journey against an on-disk store:
//! cart → order → payment proof → settlement → release → complete →
//! withdrawal, with the ledger conservation invariant checked at the end.

use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;

use bazaar_server::catalog::memory::{MemoryCatalog, MemoryIdentity, MemoryMediaStore};
use bazaar_server::catalog::{Catalog, Identity, ProductInfo, UserInfo, UserRole};
use bazaar_server::models::{
    DeliveryAddress, EntryDirection, EntryStatus, ItemStatus, OrderStatus, PaymentMethod,
    PaymentStatus, PayoutDestination,
};
use bazaar_server::{
    AccountService, CartService, MarketStore, OrderService, PaymentService, ServiceError,
    SettlementService,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

struct TestEnv {
    _dir: tempfile::TempDir,
    carts: CartService,
    orders: OrderService,
    payments: PaymentService,
    settlement: SettlementService,
    accounts: AccountService,
}

fn user(id: &str, role: UserRole) -> UserInfo {
    UserInfo {
        id: id.to_string(),
        role,
        is_kyc_verified: true,
    }
}

fn setup() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MarketStore::open(dir.path().join("bazaar.db")).unwrap());

    let catalog = MemoryCatalog::new();
    catalog.insert(ProductInfo {
        id: "prod-a".to_string(),
        title: "Product A".to_string(),
        price: dec("30.00"),
        seller_id: "seller-1".to_string(),
        images: vec![],
    });
    catalog.insert(ProductInfo {
        id: "prod-b".to_string(),
        title: "Product B".to_string(),
        price: dec("10.00"),
        seller_id: "seller-2".to_string(),
        images: vec![],
    });

    let identity = MemoryIdentity::new();
    for (id, role) in [
        ("buyer-1", UserRole::User),
        ("seller-1", UserRole::User),
        ("seller-2", UserRole::User),
        ("admin-1", UserRole::Admin),
    ] {
        identity.insert(user(id, role));
    }

    let catalog: Arc<dyn Catalog> = Arc::new(catalog);
    let identity: Arc<dyn Identity> = Arc::new(identity);

    TestEnv {
        carts: CartService::new(store.clone(), catalog.clone()),
        orders: OrderService::new(store.clone(), catalog),
        payments: PaymentService::new(store.clone(), Arc::new(MemoryMediaStore::new())),
        settlement: SettlementService::new(store.clone()),
        accounts: AccountService::new(store, identity),
        _dir: dir,
    }
}

fn crypto_destination() -> PayoutDestination {
    PayoutDestination::Crypto {
        wallet_address: "0xabc123".to_string(),
        symbol: "USDT".to_string(),
        network: "TRC20".to_string(),
    }
}

/// balance == Σ completed credits − Σ completed debits
fn assert_conserved(env: &TestEnv, user_id: &str) {
    let account = env.accounts.get_account(user_id).unwrap();
    let expected: Decimal = env
        .accounts
        .ledger_history(user_id)
        .unwrap()
        .iter()
        .filter(|e| e.status == EntryStatus::Completed)
        .map(|e| match e.direction {
            EntryDirection::Credit => e.amount,
            EntryDirection::Debit => -e.amount,
        })
        .sum();
    assert_eq!(account.balance, expected, "ledger drift for {user_id}");
}

#[tokio::test]
async fn test_full_marketplace_journey() {
    let env = setup();

    env.accounts.open_account("seller-1").await.unwrap();
    env.accounts.open_account("seller-2").await.unwrap();

    // Buyer builds a two-seller cart
    env.carts.add_item("buyer-1", "prod-a", 2).await.unwrap();
    env.carts.add_item("buyer-1", "prod-b", 1).await.unwrap();

    let order = env
        .orders
        .create_order(
            "buyer-1",
            DeliveryAddress {
                full_name: Some("B. Uyer".to_string()),
                city: Some("Lagos".to_string()),
                ..DeliveryAddress::default()
            },
            PaymentMethod::BankTransfer,
        )
        .await
        .unwrap();
    assert_eq!(order.amount, dec("70.00"));
    assert!(env.carts.list("buyer-1").unwrap().is_empty());

    // Buyer claims payment with a proof upload
    let order = env
        .payments
        .submit_payment(&order.id, Path::new("proof.png"), PaymentMethod::BankTransfer)
        .await
        .unwrap();
    assert!(order.is_paid);
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    // Admin confirms receipt: both sellers are credited atomically
    let order = env
        .settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Completed);
    assert_eq!(env.accounts.get_account("seller-1").unwrap().balance, dec("60.00"));
    assert_eq!(env.accounts.get_account("seller-2").unwrap().balance, dec("10.00"));

    // Acknowledging a settled order again is rejected
    let err = env
        .settlement
        .acknowledge_payment(&order.id, true, "admin-1")
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // Each seller releases their own lines; the order status is derived
    let order = env.orders.release_items(&order.id, "seller-1").unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    let order = env.orders.release_items(&order.id, "seller-2").unwrap();
    assert_eq!(order.status, OrderStatus::Released);

    let order = env.orders.complete_order(&order.id).unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.items.iter().all(|i| i.status == ItemStatus::Completed));

    // Seller-1 withdraws 50: immediate reservation
    let (entry, account) = env
        .accounts
        .request_withdrawal("seller-1", crypto_destination(), dec("50.00"))
        .unwrap();
    assert_eq!(account.balance, dec("10.00"));

    // Admin rejects: the exact original balance is restored
    env.accounts
        .complete_withdrawal("admin-1", &entry.id, false)
        .unwrap();
    assert_eq!(env.accounts.get_account("seller-1").unwrap().balance, dec("60.00"));

    // Second attempt is approved: the reservation stands
    let (entry, account) = env
        .accounts
        .request_withdrawal("seller-1", crypto_destination(), dec("60.00"))
        .unwrap();
    assert_eq!(account.balance, Decimal::ZERO);
    env.accounts
        .complete_withdrawal("admin-1", &entry.id, true)
        .unwrap();
    assert_eq!(env.accounts.get_account("seller-1").unwrap().balance, Decimal::ZERO);

    assert_conserved(&env, "seller-1");
    assert_conserved(&env, "seller-2");
}

#[tokio::test]
async fn test_failed_settlement_leaves_ledger_untouched() {
    let env = setup();

    env.accounts.open_account("seller-1").await.unwrap();
    env.accounts.open_account("seller-2").await.unwrap();

    env.carts.add_item("buyer-1", "prod-a", 1).await.unwrap();
    env.carts.add_item("buyer-1", "prod-b", 1).await.unwrap();
    let order = env
        .orders
        .create_order("buyer-1", DeliveryAddress::default(), PaymentMethod::Crypto)
        .await
        .unwrap();

    // Admin could not match the payment: order is rejected, no credits
    let order = env
        .settlement
        .acknowledge_payment(&order.id, false, "admin-1")
        .unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(env.accounts.get_account("seller-1").unwrap().balance, Decimal::ZERO);

    // Failed credits are on the books but conservation holds
    let history = env.accounts.ledger_history("seller-1").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, EntryStatus::Failed);
    assert_conserved(&env, "seller-1");

    // A rejected order cannot be released
    let err = env.orders.release_items(&order.id, "seller-1").unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn test_settlement_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bazaar.db");

    let order_id;
    {
        let store = Arc::new(MarketStore::open(&db_path).unwrap());
        let catalog = MemoryCatalog::new();
        catalog.insert(ProductInfo {
            id: "prod-a".to_string(),
            title: "Product A".to_string(),
            price: dec("25.00"),
            seller_id: "seller-1".to_string(),
            images: vec![],
        });
        let identity = MemoryIdentity::new();
        identity.insert(user("seller-1", UserRole::User));

        let carts = CartService::new(store.clone(), Arc::new(catalog.clone()));
        let orders = OrderService::new(store.clone(), Arc::new(catalog));
        let settlement = SettlementService::new(store.clone());
        let accounts = AccountService::new(store, Arc::new(identity));

        accounts.open_account("seller-1").await.unwrap();
        carts.add_item("buyer-1", "prod-a", 2).await.unwrap();
        let order = orders
            .create_order("buyer-1", DeliveryAddress::default(), PaymentMethod::Crypto)
            .await
            .unwrap();
        settlement
            .acknowledge_payment(&order.id, true, "admin-1")
            .unwrap();
        order_id = order.id;
    }

    // Reopen the database: committed settlement state must be durable
    let store = Arc::new(MarketStore::open(&db_path).unwrap());
    let account = store.get_account("seller-1").unwrap().unwrap();
    assert_eq!(account.balance, dec("50.00"));
    let order = store.get_order(&order_id).unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Completed);
}
