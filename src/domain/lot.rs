use super::item::{self, ItemStack, ItemType};
use super::ports::HoldingsStore;
use crate::error::{LotError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum LotPhase {
    /// Set aside from the owner's holdings, waiting for the auction to end.
    #[default]
    Escrowed,
    /// Split off a delivery whose recipient could not be reached.
    Orphaned,
}

/// A quantity of one item type held on behalf of a named owner.
///
/// Once a lot has been handed out, `owner` names the intended recipient rather
/// than the original depositor. The item type is kept as its encoded descriptor
/// and never changes after construction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Lot {
    owner: String,
    #[serde(rename = "item")]
    descriptor: String,
    quantity: u32,
    #[serde(default)]
    phase: LotPhase,
}

impl Lot {
    /// Creates an empty escrowed lot for `item`.
    pub fn new(item: &ItemType, owner: impl Into<String>) -> Result<Self> {
        Self::with_phase(item, owner, LotPhase::Escrowed)
    }

    /// Creates an empty lot waiting to be delivered to `recipient`.
    pub fn orphan(item: &ItemType, recipient: impl Into<String>) -> Result<Self> {
        Self::with_phase(item, recipient, LotPhase::Orphaned)
    }

    fn with_phase(item: &ItemType, owner: impl Into<String>, phase: LotPhase) -> Result<Self> {
        Ok(Self {
            owner: owner.into(),
            descriptor: item::encode(item)?,
            quantity: 0,
            phase,
        })
    }

    /// Adds `amount` items to the lot.
    ///
    /// With `debit_from`, the items are first withdrawn from the owner's
    /// holdings; if the owner does not hold enough nothing changes.
    pub fn add_items(&mut self, amount: u32, debit_from: Option<&dyn HoldingsStore>) -> Result<()> {
        let quantity = self
            .quantity
            .checked_add(amount)
            .ok_or(LotError::QuantityOverflow {
                current: self.quantity,
                added: amount,
            })?;

        if let Some(holdings) = debit_from {
            let item = item::decode(&self.descriptor)?;
            if !holdings.withdraw(&self.owner, amount, &item) {
                return Err(LotError::InsufficientHoldings {
                    owner: self.owner.clone(),
                    requested: amount,
                });
            }
        }

        self.quantity = quantity;
        Ok(())
    }

    /// One item with the properties of every item in this lot, or `None` when
    /// the stored descriptor cannot be read.
    pub fn type_stack(&self) -> Option<ItemStack> {
        match item::decode(&self.descriptor) {
            Ok(item) => Some(ItemStack::new(item, 1)),
            Err(e) => {
                tracing::error!(
                    owner = %self.owner,
                    error = %e,
                    "Lot has an unreadable item descriptor"
                );
                None
            }
        }
    }

    /// The original holder while escrowed, the intended recipient once handed out.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Number of items still held by this lot.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Whether this lot was escrowed for an auction or split off as an orphan.
    pub fn phase(&self) -> LotPhase {
        self.phase
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        owner.clone_into(&mut self.owner);
    }

    /// Removes up to `amount` items, returning how many were taken.
    pub(crate) fn take(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.quantity);
        self.quantity -= taken;
        taken
    }
}
