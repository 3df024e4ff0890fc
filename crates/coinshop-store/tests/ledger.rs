//! Ledger scenarios on the in-memory backend.

use std::sync::Arc;

use coinshop_core::{
    Catalog, InventoryItem, LedgerConfig, LedgerError, ReceivedCoins, SentCoins,
};
use coinshop_store::{FaultPoint, Ledger, MemoryDatabase};

fn setup() -> (Arc<MemoryDatabase>, Ledger) {
    let config = LedgerConfig::default();
    let db = Arc::new(MemoryDatabase::new(&config.catalog));
    let ledger = Ledger::new(db.clone(), config);
    (db, ledger)
}

/// Create `name` and move everything above `balance` to a sink account.
async fn account_with(ledger: &Ledger, name: &str, balance: i64) {
    ledger.authenticate_or_create(name, "secret").await.unwrap();
    ledger
        .authenticate_or_create("sink-account", "secret")
        .await
        .unwrap();
    let surplus = ledger.config().welcome_bonus - balance;
    if surplus > 0 {
        ledger.send(name, "sink-account", surplus).await.unwrap();
    }
}

#[tokio::test]
async fn new_account_gets_welcome_bonus() {
    let (_, ledger) = setup();

    let (account, is_new) = ledger.authenticate_or_create("alice", "pw").await.unwrap();
    assert!(is_new);
    assert_eq!(account.balance, 1000);
    assert_eq!(account.secret, "pw");

    let (again, is_new) = ledger
        .authenticate_or_create("alice", "other")
        .await
        .unwrap();
    assert!(!is_new);
    assert_eq!(again.secret, "pw");
    assert_eq!(again.created_at, account.created_at);
}

#[tokio::test]
async fn custom_welcome_bonus() {
    let catalog = Catalog::merch();
    let db = Arc::new(MemoryDatabase::new(&catalog));
    let ledger = Ledger::new(db, LedgerConfig::new(catalog, 250));

    let (account, _) = ledger.authenticate_or_create("alice", "pw").await.unwrap();
    assert_eq!(account.balance, 250);
}

#[tokio::test]
async fn find_account_miss_is_none() {
    let (_, ledger) = setup();
    assert_eq!(ledger.find_account("nobody").await.unwrap(), None);
}

#[tokio::test]
async fn repeated_purchases_accumulate() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();

    let first = ledger.purchase("a", "pen").await.unwrap();
    assert_eq!(first.quantity, 1);
    assert_eq!(db.balance_of("a").await, Some(990));

    ledger.purchase("a", "pen").await.unwrap();
    assert_eq!(db.balance_of("a").await, Some(980));

    let third = ledger.purchase("a", "pen").await.unwrap();
    assert_eq!(third.quantity, 3);
    assert_eq!(db.balance_of("a").await, Some(970));
    assert_eq!(db.quantity_of("a", "pen").await, Some(3));
}

#[tokio::test]
async fn purchase_without_funds_changes_nothing() {
    let (db, ledger) = setup();
    account_with(&ledger, "b", 5).await;

    let err = ledger.purchase("b", "pen").await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::NotEnoughCoins {
            account: "b".into(),
            required: 10
        }
    );
    assert_eq!(db.balance_of("b").await, Some(5));
    assert_eq!(db.quantity_of("b", "pen").await, None);
}

#[tokio::test]
async fn purchase_can_spend_to_zero() {
    let (db, ledger) = setup();
    account_with(&ledger, "b", 500).await;

    ledger.purchase("b", "pink-hoody").await.unwrap();
    assert_eq!(db.balance_of("b").await, Some(0));
}

#[tokio::test]
async fn unknown_item_is_rejected_before_storage() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    db.inject_fault(FaultPoint::Debit);

    let err = ledger.purchase("a", "yacht").await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::UnknownItem {
            item: "yacht".into()
        }
    );

    // The armed fault is still pending, so no debit was attempted.
    assert!(matches!(
        ledger.purchase("a", "pen").await,
        Err(LedgerError::Internal(_))
    ));
    assert_eq!(db.balance_of("a").await, Some(1000));
}

#[tokio::test]
async fn purchase_by_missing_account_is_internal() {
    let (_, ledger) = setup();
    assert!(matches!(
        ledger.purchase("ghost", "pen").await,
        Err(LedgerError::Internal(_))
    ));
}

#[tokio::test]
async fn catalog_item_missing_from_storage_is_internal() {
    let stored = Catalog::new([("pen", 10)]).unwrap();
    let configured = Catalog::new([("pen", 10), ("cup", 20)]).unwrap();
    let db = Arc::new(MemoryDatabase::new(&stored));
    let ledger = Ledger::new(db.clone(), LedgerConfig::new(configured, 1000));
    ledger.authenticate_or_create("a", "pw").await.unwrap();

    let err = ledger.purchase("a", "cup").await.unwrap_err();
    assert!(matches!(err, LedgerError::Internal(_)));
    assert_eq!(db.balance_of("a").await, Some(1000));
}

#[tokio::test]
async fn send_moves_coins_and_records_history() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("c", "pw").await.unwrap();
    ledger.purchase("a", "pen").await.unwrap();

    let record = ledger.send("a", "c", 100).await.unwrap();
    assert_eq!(record.sender, "a");
    assert_eq!(record.recipient, "c");
    assert_eq!(record.amount, 100);

    assert_eq!(db.balance_of("a").await, Some(890));
    assert_eq!(db.balance_of("c").await, Some(1100));

    let sender = ledger.info("a").await.unwrap().unwrap();
    assert_eq!(
        sender.coin_history.sent,
        vec![SentCoins {
            to_user: "c".into(),
            amount: 100
        }]
    );
    assert!(sender.coin_history.received.is_empty());

    let recipient = ledger.info("c").await.unwrap().unwrap();
    assert_eq!(
        recipient.coin_history.received,
        vec![ReceivedCoins {
            from_user: "a".into(),
            amount: 100
        }]
    );
}

#[tokio::test]
async fn send_rejections() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("c", "pw").await.unwrap();

    assert_eq!(
        ledger.send("a", "c", 0).await.unwrap_err(),
        LedgerError::InvalidAmount { amount: 0 }
    );
    assert_eq!(
        ledger.send("a", "c", -5).await.unwrap_err(),
        LedgerError::InvalidAmount { amount: -5 }
    );
    assert_eq!(
        ledger.send("a", "ghost", 10).await.unwrap_err(),
        LedgerError::UnknownRecipient {
            recipient: "ghost".into()
        }
    );
    assert_eq!(
        ledger.send("ghost", "a", 10).await.unwrap_err(),
        LedgerError::AccountGone {
            account: "ghost".into()
        }
    );
    assert_eq!(
        ledger.send("a", "c", 1001).await.unwrap_err(),
        LedgerError::NotEnoughCoins {
            account: "a".into(),
            required: 1001
        }
    );

    assert_eq!(db.balance_of("a").await, Some(1000));
    assert_eq!(db.balance_of("c").await, Some(1000));
    assert_eq!(db.transfer_count().await, 0);
}

#[tokio::test]
async fn self_transfer_nets_to_zero() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();

    ledger.send("a", "a", 300).await.unwrap();

    assert_eq!(db.balance_of("a").await, Some(1000));
    let info = ledger.info("a").await.unwrap().unwrap();
    assert_eq!(info.coin_history.sent.len(), 1);
    assert_eq!(info.coin_history.received.len(), 1);
}

#[tokio::test]
async fn failed_credit_rolls_back_whole_transfer() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("c", "pw").await.unwrap();
    db.inject_fault(FaultPoint::Credit);

    let err = ledger.send("a", "c", 100).await.unwrap_err();
    assert!(matches!(err, LedgerError::Internal(_)));

    assert_eq!(db.balance_of("a").await, Some(1000));
    assert_eq!(db.balance_of("c").await, Some(1000));
    assert_eq!(db.transfer_count().await, 0);
}

#[tokio::test]
async fn failed_grant_rolls_back_debit() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    db.inject_fault(FaultPoint::GrantItem);

    assert!(matches!(
        ledger.purchase("a", "cup").await,
        Err(LedgerError::Internal(_))
    ));
    assert_eq!(db.balance_of("a").await, Some(1000));
    assert_eq!(db.quantity_of("a", "cup").await, None);
}

#[tokio::test]
async fn failed_commit_applies_nothing() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("c", "pw").await.unwrap();

    db.inject_fault(FaultPoint::Commit);
    assert!(matches!(
        ledger.send("a", "c", 100).await,
        Err(LedgerError::Internal(_))
    ));

    db.inject_fault(FaultPoint::Commit);
    assert!(matches!(
        ledger.purchase("a", "pen").await,
        Err(LedgerError::Internal(_))
    ));

    assert_eq!(db.balance_of("a").await, Some(1000));
    assert_eq!(db.balance_of("c").await, Some(1000));
    assert_eq!(db.transfer_count().await, 0);
    assert_eq!(db.quantity_of("a", "pen").await, None);
}

#[tokio::test]
async fn failed_account_creation_commit_is_internal() {
    let (db, ledger) = setup();
    db.inject_fault(FaultPoint::Commit);

    assert!(matches!(
        ledger.authenticate_or_create("a", "pw").await,
        Err(LedgerError::Internal(_))
    ));
    assert_eq!(db.balance_of("a").await, None);
}

#[tokio::test]
async fn info_of_fresh_account_has_empty_lists() {
    let (_, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();

    let info = ledger.info("a").await.unwrap().unwrap();
    assert_eq!(info.coins, 1000);
    assert!(info.inventory.is_empty());
    assert!(info.coin_history.received.is_empty());
    assert!(info.coin_history.sent.is_empty());

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "coins": 1000,
            "inventory": [],
            "coinHistory": { "received": [], "sent": [] }
        })
    );
}

#[tokio::test]
async fn info_of_missing_account_is_none() {
    let (_, ledger) = setup();
    assert!(ledger.info("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn info_orders_inventory_and_history() {
    let (_, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("b", "pw").await.unwrap();

    ledger.purchase("a", "umbrella").await.unwrap();
    ledger.purchase("a", "cup").await.unwrap();
    ledger.purchase("a", "cup").await.unwrap();
    ledger.send("a", "b", 30).await.unwrap();
    ledger.send("a", "b", 20).await.unwrap();
    ledger.send("b", "a", 5).await.unwrap();

    let info = ledger.info("a").await.unwrap().unwrap();
    assert_eq!(info.coins, 1000 - 200 - 40 - 50 + 5);
    assert_eq!(
        info.inventory,
        vec![
            InventoryItem {
                item: "cup".into(),
                quantity: 2
            },
            InventoryItem {
                item: "umbrella".into(),
                quantity: 1
            },
        ]
    );
    let sent: Vec<_> = info.coin_history.sent.iter().map(|s| s.amount).collect();
    assert_eq!(sent, vec![30, 20]);
    assert_eq!(info.quantity_of("cup"), 2);
}

#[tokio::test]
async fn balances_are_conserved_across_transfers() {
    let (db, ledger) = setup();
    let names = ["p1", "p2", "p3", "p4"];
    for name in names {
        ledger.authenticate_or_create(name, "pw").await.unwrap();
    }

    let moves = [
        ("p1", "p2", 300),
        ("p2", "p3", 1200),
        ("p3", "p4", 50),
        ("p4", "p1", 1051),
        ("p1", "p3", 999),
        ("p3", "p2", 7),
    ];
    for (from, to, amount) in moves {
        // Some of these fail for lack of funds; the total must hold either way.
        let _ = ledger.send(from, to, amount).await;
    }

    let mut total = 0;
    for name in names {
        let balance = db.balance_of(name).await.unwrap();
        assert!(balance >= 0);
        total += balance;
    }
    assert_eq!(total, 4000);
}
