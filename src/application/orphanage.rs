use super::distributor::Distributor;
use crate::domain::delivery::DeliveryReport;
use crate::domain::lot::Lot;
use crate::domain::ports::OrphanQueue;
use crate::error::{LotError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum OrphanCommand {
    Park(Lot),
    RecipientAvailable {
        name: String,
        reply: oneshot::Sender<Vec<DeliveryReport>>,
    },
    Shutdown,
}

/// [`OrphanQueue`] that forwards lots to a running [`Orphanage`].
#[derive(Clone)]
pub struct ChannelOrphanQueue {
    tx: mpsc::UnboundedSender<OrphanCommand>,
}

impl OrphanQueue for ChannelOrphanQueue {
    fn enqueue(&self, lot: Lot) {
        if let Err(mpsc::error::SendError(OrphanCommand::Park(lot))) =
            self.tx.send(OrphanCommand::Park(lot))
        {
            tracing::error!(
                owner = lot.owner(),
                quantity = lot.quantity(),
                "Orphanage stopped, orphan lot lost"
            );
        }
    }
}

/// Receiving side of [`channel`], consumed by [`Orphanage::new`].
pub struct OrphanInbox {
    tx: mpsc::UnboundedSender<OrphanCommand>,
    rx: mpsc::UnboundedReceiver<OrphanCommand>,
}

/// Creates the queue handed to the [`Distributor`] and the inbox its orphanage reads.
pub fn channel() -> (ChannelOrphanQueue, OrphanInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelOrphanQueue { tx: tx.clone() }, OrphanInbox { tx, rx })
}

/// Holds orphaned lots until their recipient can take them.
///
/// A pending lot is retried once its recipient is reachable and has room for
/// at least one of its items. Retries run through [`Distributor::cancel_lot`],
/// so anything that still does not fit is dropped at the recipient's feet.
pub struct Orphanage {
    distributor: Arc<Distributor>,
    inbox: OrphanInbox,
    pending: Vec<Lot>,
}

impl Orphanage {
    /// Creates an orphanage with no pending lots, fed from `inbox`.
    pub fn new(distributor: Arc<Distributor>, inbox: OrphanInbox) -> Self {
        Self {
            distributor,
            inbox,
            pending: Vec::new(),
        }
    }

    /// Seeds the orphanage with lots saved by an earlier run.
    pub fn with_pending(mut self, lots: Vec<Lot>) -> Self {
        self.pending.extend(lots.into_iter().filter(|lot| !lot.is_empty()));
        self
    }

    /// Runs the orphanage on the tokio runtime.
    ///
    /// With `sweep`, every pending lot is retried on that interval in addition
    /// to explicit [`OrphanageHandle::recipient_available`] calls.
    pub fn spawn(self, sweep: Option<Duration>) -> OrphanageHandle {
        let tx = self.inbox.tx.clone();
        let task = tokio::spawn(self.run(sweep));
        OrphanageHandle { tx, task }
    }

    async fn run(mut self, sweep: Option<Duration>) -> Vec<Lot> {
        let mut ticker = sweep.map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker
        });

        loop {
            let command = match ticker.as_mut() {
                Some(ticker) => tokio::select! {
                    command = self.inbox.rx.recv() => command,
                    _ = ticker.tick() => {
                        self.redeliver(None);
                        continue;
                    }
                },
                None => self.inbox.rx.recv().await,
            };

            match command {
                Some(OrphanCommand::Park(lot)) => {
                    tracing::debug!(owner = lot.owner(), quantity = lot.quantity(), "Lot parked");
                    self.pending.push(lot);
                }
                Some(OrphanCommand::RecipientAvailable { name, reply }) => {
                    let reports = self.redeliver(Some(&name));
                    let _ = reply.send(reports);
                }
                Some(OrphanCommand::Shutdown) | None => break,
            }
        }

        tracing::info!(pending = self.pending.len(), "Orphanage stopped");
        self.pending
    }

    fn is_deliverable(&self, lot: &Lot) -> bool {
        let recipients = self.distributor.recipients();
        recipients.is_reachable(lot.owner())
            && lot
                .type_stack()
                .is_some_and(|stack| recipients.space_for(lot.owner(), &stack.item) > 0)
    }

    fn redeliver(&mut self, only: Option<&str>) -> Vec<DeliveryReport> {
        let (ready, waiting): (Vec<Lot>, Vec<Lot>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|lot| {
                only.is_none_or(|name| lot.owner() == name) && self.is_deliverable(lot)
            });
        self.pending = waiting;

        let mut reports = Vec::with_capacity(ready.len());
        for mut lot in ready {
            match self.distributor.cancel_lot(&mut lot) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(owner = lot.owner(), error = %e, "Orphan redelivery failed");
                    self.pending.push(lot);
                }
            }
        }
        reports
    }
}

/// Control handle for a spawned [`Orphanage`].
pub struct OrphanageHandle {
    tx: mpsc::UnboundedSender<OrphanCommand>,
    task: JoinHandle<Vec<Lot>>,
}

impl OrphanageHandle {
    /// Retries the lots waiting for `name`, returning what was delivered.
    pub async fn recipient_available(&self, name: &str) -> Result<Vec<DeliveryReport>> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(OrphanCommand::RecipientAvailable {
                name: name.to_string(),
                reply,
            })
            .map_err(|_| LotError::OrphanageError("orphanage is not running".to_string()))?;
        response
            .await
            .map_err(|e| LotError::OrphanageError(e.to_string()))
    }

    /// Stops the orphanage and returns the lots still waiting for delivery.
    pub async fn shutdown(self) -> Result<Vec<Lot>> {
        let _ = self.tx.send(OrphanCommand::Shutdown);
        self.task
            .await
            .map_err(|e| LotError::OrphanageError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delivery::Location;
    use crate::domain::item::{ItemStack, ItemType};
    use crate::infrastructure::in_memory::{InMemoryRecipients, InMemoryWorld, RecordingNotifier};

    fn home() -> Location {
        Location::new("world", 0.0, 70.0, 0.0)
    }

    fn setup() -> (InMemoryRecipients, Arc<Distributor>, OrphanInbox) {
        let recipients = InMemoryRecipients::new();
        let (queue, inbox) = channel();
        let distributor = Arc::new(Distributor::new(
            Box::new(recipients.clone()),
            Box::new(InMemoryWorld::new()),
            Box::new(queue),
            Box::new(RecordingNotifier::new()),
        ));
        (recipients, distributor, inbox)
    }

    fn lot_of(amount: u32) -> Lot {
        let mut lot = Lot::new(&ItemType::new("emerald"), "bob").unwrap();
        lot.add_items(amount, None).unwrap();
        lot
    }

    #[tokio::test]
    async fn test_orphan_delivered_when_recipient_joins() {
        let (recipients, distributor, inbox) = setup();
        let handle = Orphanage::new(distributor.clone(), inbox).spawn(None);

        let mut lot = lot_of(20);
        distributor.win_lot(&mut lot, "alice").unwrap();
        assert_eq!(lot.quantity(), 0);

        recipients.join("alice", 36, home());
        let reports = handle.recipient_available("alice").await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].placed, 20);
        assert_eq!(recipients.count("alice", &ItemType::new("emerald")), 20);
        assert!(handle.shutdown().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orphan_waits_while_recipient_offline() {
        let (_recipients, distributor, inbox) = setup();
        let handle = Orphanage::new(distributor.clone(), inbox).spawn(None);

        let mut lot = lot_of(5);
        distributor.win_lot(&mut lot, "alice").unwrap();

        let reports = handle.recipient_available("alice").await.unwrap();
        assert!(reports.is_empty());

        let pending = handle.shutdown().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].owner(), "alice");
        assert_eq!(pending[0].quantity(), 5);
    }

    #[tokio::test]
    async fn test_orphan_waits_for_space() {
        let (recipients, distributor, inbox) = setup();
        recipients.join("alice", 1, home());
        recipients.fill_slot("alice", ItemStack::new(ItemType::new("dirt"), 64));
        let handle = Orphanage::new(distributor, inbox)
            .with_pending(vec![{
                let mut lot = Lot::orphan(&ItemType::new("emerald"), "alice").unwrap();
                lot.add_items(3, None).unwrap();
                lot
            }])
            .spawn(None);

        let reports = handle.recipient_available("alice").await.unwrap();
        assert!(reports.is_empty());
        assert_eq!(handle.shutdown().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_named_recipient_is_retried() {
        let (recipients, distributor, inbox) = setup();
        let handle = Orphanage::new(distributor.clone(), inbox).spawn(None);

        distributor.win_lot(&mut lot_of(4), "alice").unwrap();
        distributor.win_lot(&mut lot_of(6), "carol").unwrap();
        recipients.join("alice", 36, home());
        recipients.join("carol", 36, home());

        let reports = handle.recipient_available("carol").await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].recipient, "carol");

        let pending = handle.shutdown().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].owner(), "alice");
    }

    #[tokio::test]
    async fn test_sweep_retries_everyone() {
        let (recipients, distributor, inbox) = setup();
        let handle =
            Orphanage::new(distributor.clone(), inbox).spawn(Some(Duration::from_millis(10)));

        distributor.win_lot(&mut lot_of(9), "alice").unwrap();
        recipients.join("alice", 36, home());

        let emerald = ItemType::new("emerald");
        for _ in 0..100 {
            if recipients.count("alice", &emerald) == 9 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(recipients.count("alice", &emerald), 9);
        assert!(handle.shutdown().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_does_not_panic() {
        let (queue, inbox) = channel();
        let (_recipients, distributor, _) = setup();
        let handle = Orphanage::new(distributor, inbox).spawn(None);
        handle.shutdown().await.unwrap();

        queue.enqueue(lot_of(1));
    }
}
