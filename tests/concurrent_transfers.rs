//! End-to-end transfer behaviour through the public API, in-memory store.
//!
//! Run with: cargo test --test concurrent_transfers

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;

use transfer_service::{Account, ErrorKind, MemoryAccountStore, TransferEngine};

fn dec(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn engine_with(
    accounts: &[(i64, i64)],
) -> (MemoryAccountStore, Arc<TransferEngine<MemoryAccountStore>>) {
    let store = MemoryAccountStore::with_accounts(
        accounts.iter().map(|&(id, balance)| Account::new(id, dec(balance))),
    );
    let engine = TransferEngine::new(Arc::new(store.clone()))
        .with_timeout(Some(Duration::from_secs(5)));
    (store, Arc::new(engine))
}

/// Many transfers draining one account: the sum debited never exceeds the
/// starting balance, and every rejection is an insufficient-funds rejection.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn no_overdraft_under_burst() {
    let (store, engine) = engine_with(&[(1, 1_000), (2, 0), (3, 0), (4, 0)]);

    let tasks = (0..300).map(|i: i64| {
        let engine = engine.clone();
        tokio::spawn(async move { engine.transfer(1, i % 3 + 2, dec(7)).await })
    });

    let mut committed = 0;
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => committed += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::InsufficientFunds, "unexpected: {e}"),
        }
    }

    // At most 1000 / 7 = 142 debits fit. The advisory check may reject a few
    // early while a committed transfer still holds its reservation.
    assert!(committed > 0 && committed <= 142, "committed: {committed}");
    assert_eq!(store.balance(1), Some(dec(1_000 - committed * 7)));
    assert_eq!(store.total(), dec(1_000));
    assert_eq!(engine.pending().stats().outstanding(), 0);
}

/// Transfers in both directions across a ring of accounts conserve the total
/// and never leave a balance negative.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn ring_transfers_conserve_total() {
    let ids: Vec<(i64, i64)> = (1..=6).map(|id| (id, 50)).collect();
    let (store, engine) = engine_with(&ids);

    let tasks = (0..600).map(|i: i64| {
        let engine = engine.clone();
        let from = i % 6 + 1;
        let to = if i % 2 == 0 { from % 6 + 1 } else { (from + 4) % 6 + 1 };
        let amount = dec(i % 9 + 1);
        tokio::spawn(async move { engine.transfer(from, to, amount).await })
    });

    let results = tokio::time::timeout(Duration::from_secs(30), join_all(tasks))
        .await
        .expect("ring transfers stalled");

    for result in results {
        if let Err(e) = result.unwrap() {
            assert_eq!(e.kind(), ErrorKind::InsufficientFunds, "unexpected: {e}");
        }
    }

    assert_eq!(store.total(), dec(300));
    for id in 1..=6 {
        assert!(store.balance(id).unwrap() >= Decimal::ZERO);
    }
    let stats = engine.pending().stats();
    assert_eq!(stats.reserved, stats.released);
    assert_eq!(engine.pending().accounts_in_flight(), 0);
    assert_eq!(store.stats().commits + store.stats().rollbacks, store.stats().begins);
}

#[tokio::test]
async fn receipt_serializes_amounts_as_strings() {
    let (_store, engine) = engine_with(&[(1, 100), (2, 50)]);

    let receipt = engine.transfer(1, 2, Decimal::new(3050, 2)).await.unwrap();
    let json = serde_json::to_value(&receipt).unwrap();

    assert_eq!(json["from"], 1);
    assert_eq!(json["to"], 2);
    assert_eq!(json["amount"], "30.50");
    assert_eq!(json["from_balance"], "69.50");
    assert_eq!(json["to_balance"], "80.50");
    assert_eq!(json["transfer_id"].as_str().unwrap().len(), 26);
}
