use super::delivery::{DropHandle, LotEvent, Location};
use super::item::{ItemStack, ItemType};
use super::lot::Lot;

/// Items a named owner holds outside of any lot.
pub trait HoldingsStore: Send + Sync {
    fn has_amount(&self, owner: &str, amount: u32, item: &ItemType) -> bool;
    fn remove(&self, owner: &str, amount: u32, item: &ItemType);

    /// Removes `amount` only if the owner holds at least that much.
    ///
    /// The check and the debit must be atomic with respect to other withdrawals
    /// for the same owner and item.
    fn withdraw(&self, owner: &str, amount: u32, item: &ItemType) -> bool;
}

/// Reachability and container access for named recipients.
pub trait Recipients: Send + Sync {
    fn is_reachable(&self, name: &str) -> bool;

    /// Whether `amount` items of `item` fit into the recipient's container.
    fn has_space(&self, name: &str, amount: u32, item: &ItemType) -> bool;

    /// How many items of `item` the container accepts right now.
    /// Unknown recipients have no space.
    fn space_for(&self, name: &str, item: &ItemType) -> u32;

    fn max_stack_size(&self, item: &ItemType) -> u32;

    /// Best-effort insertion. The container deals with anything that does not fit.
    fn insert(&self, name: &str, chunk: ItemStack);

    fn location_of(&self, name: &str) -> Option<Location>;
}

/// The shared environment items can be dropped into.
pub trait World: Send + Sync {
    fn drop_at(&self, location: &Location, chunk: ItemStack) -> DropHandle;
}

/// Accepts lots whose recipient could not be served yet.
pub trait OrphanQueue: Send + Sync {
    fn enqueue(&self, lot: Lot);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: LotEvent, recipient: &str);
}

pub type HoldingsStoreBox = Box<dyn HoldingsStore>;
pub type RecipientsBox = Box<dyn Recipients>;
pub type WorldBox = Box<dyn World>;
pub type OrphanQueueBox = Box<dyn OrphanQueue>;
pub type NotifierBox = Box<dyn Notifier>;
