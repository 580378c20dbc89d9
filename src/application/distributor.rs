use crate::domain::delivery::{DeliveryReport, LotEvent};
use crate::domain::item::ItemStack;
use crate::domain::lot::Lot;
use crate::domain::ports::{NotifierBox, OrphanQueueBox, RecipientsBox, WorldBox};
use crate::error::{LotError, Result};

/// Hands lots out to recipients.
///
/// What fits into the recipient's container is placed there in stack-sized
/// chunks, the rest is dropped at the recipient's location. Lots for
/// recipients that cannot be reached are moved into a new lot and queued.
///
/// Callers must not run two transfers on the same lot at once; separate lots
/// are independent.
pub struct Distributor {
    recipients: RecipientsBox,
    world: WorldBox,
    orphans: OrphanQueueBox,
    notifier: NotifierBox,
}

impl Distributor {
    /// Creates an engine over the given ports.
    pub fn new(
        recipients: RecipientsBox,
        world: WorldBox,
        orphans: OrphanQueueBox,
        notifier: NotifierBox,
    ) -> Self {
        Self {
            recipients,
            world,
            orphans,
            notifier,
        }
    }

    /// The recipients registry this engine delivers to.
    pub fn recipients(&self) -> &RecipientsBox {
        &self.recipients
    }

    /// Delivers the lot to the winner of its auction.
    pub fn win_lot(&self, lot: &mut Lot, winner: &str) -> Result<DeliveryReport> {
        self.transfer(lot, winner)
    }

    /// Returns the lot to its current owner.
    pub fn cancel_lot(&self, lot: &mut Lot) -> Result<DeliveryReport> {
        let owner = lot.owner().to_string();
        self.transfer(lot, &owner)
    }

    /// Moves the whole lot to `recipient`.
    ///
    /// The lot's owner becomes `recipient` before anything else happens, even if
    /// the lot is empty. An unreadable item descriptor leaves the quantity in
    /// place and returns [`LotError::CorruptDescriptor`].
    #[tracing::instrument(skip(self, lot), fields(quantity = lot.quantity()))]
    pub fn transfer(&self, lot: &mut Lot, recipient: &str) -> Result<DeliveryReport> {
        lot.set_owner(recipient);
        let mut report = DeliveryReport::new(recipient);
        if lot.is_empty() {
            return Ok(report);
        }

        let stack = lot.type_stack().ok_or_else(|| {
            LotError::CorruptDescriptor(format!("lot for {recipient} has no readable item type"))
        })?;

        if !self.recipients.is_reachable(recipient) {
            self.orphan_remainder(lot, &stack, recipient, &mut report)?;
            tracing::info!(orphaned = report.orphaned, "Recipient unreachable, lot orphaned");
            return Ok(report);
        }

        let max_stack = self.recipients.max_stack_size(&stack.item).max(1);
        let quantity = lot.quantity();
        let to_give = if self.recipients.has_space(recipient, quantity, &stack.item) {
            quantity
        } else {
            self.recipients.space_for(recipient, &stack.item).min(quantity)
        };

        if to_give > 0 {
            self.notifier.notify(LotEvent::Give, recipient);
        }
        let mut remaining = to_give;
        while remaining > 0 {
            let placed = lot.take(remaining.min(max_stack));
            self.recipients.insert(recipient, stack.with_amount(placed));
            remaining -= placed;
            report.placed += placed;
            report.give_chunks += 1;
        }

        if !lot.is_empty() {
            match self.recipients.location_of(recipient) {
                Some(location) => {
                    while !lot.is_empty() {
                        let dropped = lot.take(max_stack);
                        let handle = self.world.drop_at(&location, stack.with_amount(dropped));
                        tracing::debug!(?handle, dropped, "Dropped overflow");
                        report.dropped += dropped;
                        report.drop_chunks += 1;
                    }
                    self.notifier.notify(LotEvent::Drop, recipient);
                }
                None => {
                    tracing::warn!("Recipient has no location, orphaning overflow");
                    self.orphan_remainder(lot, &stack, recipient, &mut report)?;
                }
            }
        }

        tracing::info!(
            placed = report.placed,
            dropped = report.dropped,
            orphaned = report.orphaned,
            "Lot delivered"
        );
        Ok(report)
    }

    fn orphan_remainder(
        &self,
        lot: &mut Lot,
        stack: &ItemStack,
        recipient: &str,
        report: &mut DeliveryReport,
    ) -> Result<()> {
        let mut orphan = Lot::orphan(&stack.item, recipient)?;
        let quantity = lot.quantity();
        orphan.add_items(quantity, None)?;
        lot.take(quantity);
        report.orphaned += quantity;
        self.orphans.enqueue(orphan);
        Ok(())
    }
}
