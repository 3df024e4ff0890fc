//! Concurrent callers and cancellation.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use coinshop_core::{LedgerConfig, LedgerError};
use coinshop_store::{cancellable, Database, Ledger, MemoryDatabase};

fn setup() -> (Arc<MemoryDatabase>, Arc<Ledger>) {
    let config = LedgerConfig::default();
    let db = Arc::new(MemoryDatabase::new(&config.catalog));
    let ledger = Arc::new(Ledger::new(db.clone(), config));
    (db, ledger)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn first_committer_wins() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("b", "pw").await.unwrap();

    // Two transfers of 600 against a balance of 1000: exactly one fits.
    let tasks = (0..2).map(|_| {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.send("a", "b", 600).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let won = results.iter().filter(|r| r.is_ok()).count();
    let lost: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(won, 1);
    assert_eq!(
        lost,
        vec![&LedgerError::NotEnoughCoins {
            account: "a".into(),
            required: 600
        }]
    );
    assert_eq!(db.balance_of("a").await, Some(400));
    assert_eq!(db.balance_of("b").await, Some(1600));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_purchases_never_overdraw() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();

    // 1000 coins buy exactly five 200-coin powerbanks.
    let tasks = (0..12).map(|_| {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.purchase("a", "powerbank").await })
    });
    let results = join_all(tasks).await;

    let bought = results
        .into_iter()
        .filter(|joined| matches!(joined, Ok(Ok(_))))
        .count();
    assert_eq!(bought, 5);
    assert_eq!(db.balance_of("a").await, Some(0));
    assert_eq!(db.quantity_of("a", "powerbank").await, Some(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_conserve_coins() {
    let (db, ledger) = setup();
    let names = ["n1", "n2", "n3"];
    for name in names {
        ledger.authenticate_or_create(name, "pw").await.unwrap();
    }

    let tasks = (0..60i64).map(|i| {
        let ledger = Arc::clone(&ledger);
        let from = names[usize::try_from(i % 3).unwrap()];
        let to = names[usize::try_from((i + 1) % 3).unwrap()];
        tokio::spawn(async move {
            let _ = ledger.send(from, to, 37 + i).await;
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap();
    }

    let mut total = 0;
    for name in names {
        let balance = db.balance_of(name).await.unwrap();
        assert!(balance >= 0);
        total += balance;
    }
    assert_eq!(total, 3000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_logins_create_once() {
    let (db, ledger) = setup();

    let tasks = (0..8).map(|_| {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.authenticate_or_create("newbie", "pw").await })
    });
    let created = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .filter(|(_, is_new)| *is_new)
        .count();

    assert_eq!(created, 1);
    assert_eq!(db.balance_of("newbie").await, Some(1000));
}

#[tokio::test]
async fn cancelled_operation_applies_nothing() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("b", "pw").await.unwrap();

    // Hold the tables so the transfer cannot start its session.
    let blocker = db.begin().await.unwrap();

    let token = CancellationToken::new();
    let cancel = token.clone();
    let pending = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { cancellable(&token, ledger.send("a", "b", 100)).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();
    assert_eq!(pending.await.unwrap(), Err(LedgerError::Cancelled));

    drop(blocker);
    assert_eq!(db.balance_of("a").await, Some(1000));
    assert_eq!(db.balance_of("b").await, Some(1000));
    assert_eq!(db.transfer_count().await, 0);
}

#[tokio::test]
async fn cancelling_before_commit_discards_applied_steps() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();
    ledger.authenticate_or_create("b", "pw").await.unwrap();

    let gate = db.hold_next_commit();
    let token = CancellationToken::new();
    let cancel = token.clone();
    let pending = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { cancellable(&token, ledger.send("a", "b", 100)).await })
    };

    // Record, debit and credit have run; only the commit is outstanding.
    gate.reached().await;
    cancel.cancel();
    assert_eq!(pending.await.unwrap(), Err(LedgerError::Cancelled));

    assert_eq!(db.balance_of("a").await, Some(1000));
    assert_eq!(db.balance_of("b").await, Some(1000));
    assert_eq!(db.transfer_count().await, 0);
}

#[tokio::test]
async fn cancelling_a_parked_purchase_keeps_inventory_empty() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();

    let gate = db.hold_next_commit();
    let token = CancellationToken::new();
    let cancel = token.clone();
    let pending = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { cancellable(&token, ledger.purchase("a", "hoody")).await })
    };

    gate.reached().await;
    cancel.cancel();
    assert_eq!(pending.await.unwrap(), Err(LedgerError::Cancelled));

    assert_eq!(db.balance_of("a").await, Some(1000));
    assert_eq!(db.quantity_of("a", "hoody").await, None);
}

#[tokio::test]
async fn operation_finishes_without_cancellation() {
    let (db, ledger) = setup();
    ledger.authenticate_or_create("a", "pw").await.unwrap();

    let token = CancellationToken::new();
    let ownership = cancellable(&token, ledger.purchase("a", "book"))
        .await
        .unwrap();

    assert_eq!(ownership.quantity, 1);
    assert_eq!(db.balance_of("a").await, Some(950));
}
