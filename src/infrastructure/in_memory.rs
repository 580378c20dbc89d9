use crate::domain::delivery::{DropHandle, LotEvent, Location};
use crate::domain::item::{ItemStack, ItemType};
use crate::domain::lot::Lot;
use crate::domain::ports::{HoldingsStore, Notifier, OrphanQueue, Recipients, World};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Stack size for materials without an explicit entry.
pub const DEFAULT_STACK_SIZE: u32 = 64;

/// Slot count of a freshly joined recipient's container.
pub const DEFAULT_SLOTS: usize = 36;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A thread-safe in-memory holdings store.
///
/// Balances are keyed by owner and the full item type, so items differing only
/// in metadata are tracked separately.
#[derive(Default, Clone)]
pub struct InMemoryHoldings {
    balances: Arc<Mutex<HashMap<(String, ItemType), u32>>>,
}

impl InMemoryHoldings {
    /// Creates a new, empty in-memory holdings store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` of `item` to the owner's balance.
    pub fn grant(&self, owner: &str, item: &ItemType, amount: u32) {
        let mut balances = lock(&self.balances);
        let balance = balances
            .entry((owner.to_string(), item.clone()))
            .or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Current balance of `item` for `owner`, zero when unknown.
    pub fn balance(&self, owner: &str, item: &ItemType) -> u32 {
        lock(&self.balances)
            .get(&(owner.to_string(), item.clone()))
            .copied()
            .unwrap_or(0)
    }
}

impl HoldingsStore for InMemoryHoldings {
    fn has_amount(&self, owner: &str, amount: u32, item: &ItemType) -> bool {
        self.balance(owner, item) >= amount
    }

    fn remove(&self, owner: &str, amount: u32, item: &ItemType) {
        let mut balances = lock(&self.balances);
        if let Some(balance) = balances.get_mut(&(owner.to_string(), item.clone())) {
            *balance = balance.saturating_sub(amount);
        }
    }

    fn withdraw(&self, owner: &str, amount: u32, item: &ItemType) -> bool {
        let mut balances = lock(&self.balances);
        let key = (owner.to_string(), item.clone());
        match balances.get_mut(&key) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            None if amount == 0 => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Recipient {
    online: bool,
    location: Location,
    slots: Vec<Option<ItemStack>>,
    overflow: Vec<ItemStack>,
}

#[derive(Default)]
struct RecipientsState {
    recipients: HashMap<String, Recipient>,
    stack_sizes: HashMap<String, u32>,
    insertions: Vec<(String, ItemStack)>,
}

impl RecipientsState {
    fn max_stack_size(&self, item: &ItemType) -> u32 {
        self.stack_sizes
            .get(&item.material)
            .copied()
            .unwrap_or(DEFAULT_STACK_SIZE)
    }

    fn space_for(&self, name: &str, item: &ItemType) -> u32 {
        let max = self.max_stack_size(item);
        let Some(recipient) = self.recipients.get(name) else {
            return 0;
        };
        recipient
            .slots
            .iter()
            .map(|slot| match slot {
                None => max,
                Some(stack) if stack.item == *item => max.saturating_sub(stack.amount),
                Some(_) => 0,
            })
            .fold(0u32, u32::saturating_add)
    }
}

/// Slot-based containers for named recipients.
///
/// Each slot holds at most one stack of a single item type. Items that do not
/// fit on insertion are kept in a per-recipient overflow list.
#[derive(Default, Clone)]
pub struct InMemoryRecipients {
    state: Arc<Mutex<RecipientsState>>,
}

impl InMemoryRecipients {
    /// Creates a registry with no recipients and default stack sizes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the stack size for every item of `material`.
    pub fn set_stack_size(&self, material: &str, size: u32) {
        lock(&self.state)
            .stack_sizes
            .insert(material.to_string(), size);
    }

    /// Brings a recipient online. A known recipient keeps its container.
    pub fn join(&self, name: &str, slots: usize, location: Location) {
        let mut state = lock(&self.state);
        let recipient = state
            .recipients
            .entry(name.to_string())
            .or_insert_with(|| Recipient {
                online: true,
                location: location.clone(),
                slots: vec![None; slots],
                overflow: Vec::new(),
            });
        recipient.online = true;
        recipient.location = location;
    }

    /// Takes a recipient offline; its container is kept for the next join.
    pub fn leave(&self, name: &str) {
        if let Some(recipient) = lock(&self.state).recipients.get_mut(name) {
            recipient.online = false;
        }
    }

    /// Puts a stack straight into the first free slot, for setting up full containers.
    pub fn fill_slot(&self, name: &str, stack: ItemStack) -> bool {
        let mut state = lock(&self.state);
        let Some(recipient) = state.recipients.get_mut(name) else {
            return false;
        };
        match recipient.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(stack);
                true
            }
            None => false,
        }
    }

    /// Total items of `item` in the recipient's container.
    pub fn count(&self, name: &str, item: &ItemType) -> u32 {
        lock(&self.state)
            .recipients
            .get(name)
            .map(|r| {
                r.slots
                    .iter()
                    .flatten()
                    .filter(|stack| stack.item == *item)
                    .map(|stack| stack.amount)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Chunks that did not fit into the recipient's container on insert.
    pub fn overflow(&self, name: &str) -> Vec<ItemStack> {
        lock(&self.state)
            .recipients
            .get(name)
            .map(|r| r.overflow.clone())
            .unwrap_or_default()
    }

    /// Every chunk handed to `insert`, in order.
    pub fn insertions(&self) -> Vec<(String, ItemStack)> {
        lock(&self.state).insertions.clone()
    }
}

impl Recipients for InMemoryRecipients {
    fn is_reachable(&self, name: &str) -> bool {
        lock(&self.state)
            .recipients
            .get(name)
            .is_some_and(|r| r.online)
    }

    fn has_space(&self, name: &str, amount: u32, item: &ItemType) -> bool {
        lock(&self.state).space_for(name, item) >= amount
    }

    fn space_for(&self, name: &str, item: &ItemType) -> u32 {
        lock(&self.state).space_for(name, item)
    }

    fn max_stack_size(&self, item: &ItemType) -> u32 {
        lock(&self.state).max_stack_size(item)
    }

    fn insert(&self, name: &str, chunk: ItemStack) {
        let mut state = lock(&self.state);
        let max = state.max_stack_size(&chunk.item);
        state.insertions.push((name.to_string(), chunk.clone()));

        let Some(recipient) = state.recipients.get_mut(name) else {
            return;
        };

        let mut remaining = chunk.amount;
        for slot in recipient.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if let Some(stack) = slot
                && stack.item == chunk.item
            {
                let moved = remaining.min(max.saturating_sub(stack.amount));
                stack.amount += moved;
                remaining -= moved;
            }
        }
        for slot in recipient.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let moved = remaining.min(max);
                *slot = Some(chunk.with_amount(moved));
                remaining -= moved;
            }
        }
        if remaining > 0 {
            tracing::warn!(recipient = %name, remaining, "Container overflowed on insert");
            recipient.overflow.push(chunk.with_amount(remaining));
        }
    }

    fn location_of(&self, name: &str) -> Option<Location> {
        lock(&self.state)
            .recipients
            .get(name)
            .filter(|r| r.online)
            .map(|r| r.location.clone())
    }
}

/// Records every item released into the world.
#[derive(Default, Clone)]
pub struct InMemoryWorld {
    drops: Arc<Mutex<Vec<(DropHandle, Location, ItemStack)>>>,
    next_handle: Arc<AtomicU64>,
}

impl InMemoryWorld {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every drop made so far, in order.
    pub fn drops(&self) -> Vec<(DropHandle, Location, ItemStack)> {
        lock(&self.drops).clone()
    }

    /// Total number of items dropped.
    pub fn dropped_amount(&self) -> u32 {
        lock(&self.drops).iter().map(|(_, _, stack)| stack.amount).sum()
    }
}

impl World for InMemoryWorld {
    fn drop_at(&self, location: &Location, chunk: ItemStack) -> DropHandle {
        let handle = DropHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        lock(&self.drops).push((handle, location.clone(), chunk));
        handle
    }
}

/// Collects orphaned lots without any redelivery policy.
#[derive(Default, Clone)]
pub struct InMemoryOrphanQueue {
    lots: Arc<Mutex<Vec<Lot>>>,
}

impl InMemoryOrphanQueue {
    /// Creates an empty orphan queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the queued lots.
    pub fn lots(&self) -> Vec<Lot> {
        lock(&self.lots).clone()
    }

    /// Removes and returns every queued lot.
    pub fn drain(&self) -> Vec<Lot> {
        std::mem::take(&mut *lock(&self.lots))
    }
}

impl OrphanQueue for InMemoryOrphanQueue {
    fn enqueue(&self, lot: Lot) {
        lock(&self.lots).push(lot);
    }
}

/// Records notifications instead of showing them to anyone.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(LotEvent, String)>>>,
}

impl RecordingNotifier {
    /// Creates a notifier with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification sent so far, in order.
    pub fn sent(&self) -> Vec<(LotEvent, String)> {
        lock(&self.sent).clone()
    }

    /// Number of notifications sent for `event`.
    pub fn count(&self, event: LotEvent) -> usize {
        lock(&self.sent).iter().filter(|(e, _)| *e == event).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: LotEvent, recipient: &str) {
        lock(&self.sent).push((event, recipient.to_string()));
    }
}

/// Sends notifications to the log.
#[derive(Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: LotEvent, recipient: &str) {
        tracing::info!(event = event.key(), recipient, "Lot notification");
    }
}
