use escrow_lot::application::distributor::Distributor;
use escrow_lot::domain::delivery::{LotEvent, Location};
use escrow_lot::domain::item::ItemType;
use escrow_lot::domain::lot::Lot;
use escrow_lot::domain::ports::HoldingsStoreBox;
use escrow_lot::infrastructure::in_memory::{
    InMemoryHoldings, InMemoryOrphanQueue, InMemoryRecipients, InMemoryWorld, RecordingNotifier,
};
use std::sync::Arc;

#[tokio::test]
async fn test_separate_lots_deliver_concurrently() {
    let recipients = InMemoryRecipients::new();
    let notifier = RecordingNotifier::new();
    let distributor = Arc::new(Distributor::new(
        Box::new(recipients.clone()),
        Box::new(InMemoryWorld::new()),
        Box::new(InMemoryOrphanQueue::new()),
        Box::new(notifier.clone()),
    ));

    let names = ["alice", "bob", "carol", "dave"];
    for name in names {
        recipients.join(name, 36, Location::new("world", 0.0, 64.0, 0.0));
    }

    // Verify Send + Sync by spawning tasks
    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let distributor = distributor.clone();
            tokio::spawn(async move {
                let mut lot = Lot::new(&ItemType::new("iron_ingot"), "seller").unwrap();
                lot.add_items(100, None).unwrap();
                distributor.win_lot(&mut lot, name).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.await.unwrap();
        assert_eq!(report.placed, 100);
    }

    for name in names {
        assert_eq!(recipients.count(name, &ItemType::new("iron_ingot")), 100);
    }
    assert_eq!(notifier.count(LotEvent::Give), 4);
}

#[tokio::test]
async fn test_holdings_debit_is_atomic_across_tasks() {
    let holdings = InMemoryHoldings::new();
    let coal = ItemType::new("coal");
    holdings.grant("bob", &coal, 50);
    let store: Arc<HoldingsStoreBox> = Arc::new(Box::new(holdings.clone()));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            let coal = coal.clone();
            tokio::spawn(async move {
                let mut lot = Lot::new(&coal, "bob").unwrap();
                lot.add_items(8, Some(&**store)).is_ok()
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    // 50 coal covers six lots of 8, never a seventh
    assert_eq!(succeeded, 6);
    assert_eq!(holdings.balance("bob", &coal), 2);
}
