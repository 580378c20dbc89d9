use serde::{Deserialize, Serialize};
use std::fmt;

/// User-facing events emitted while a lot is handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LotEvent {
    /// Items are being placed into the recipient's container.
    Give,
    /// Items did not fit and were dropped at the recipient's feet.
    Drop,
}

impl LotEvent {
    pub fn key(&self) -> &'static str {
        match self {
            LotEvent::Give => "lot-give",
            LotEvent::Drop => "lot-drop",
        }
    }
}

impl fmt::Display for LotEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A position in the world where dropped items appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    /// Creates a location in `world` at the given coordinates.
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

/// Identifies an item entity released into the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropHandle(pub u64);

/// Outcome of handing one lot to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeliveryReport {
    pub recipient: String,
    /// Items handed to the recipient's container.
    pub placed: u32,
    /// Items released into the world at the recipient's location.
    pub dropped: u32,
    /// Items moved into a new lot queued for later delivery.
    pub orphaned: u32,
    pub give_chunks: usize,
    pub drop_chunks: usize,
}

impl DeliveryReport {
    /// An empty report for `recipient`.
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            ..Self::default()
        }
    }

    pub fn total(&self) -> u32 {
        self.placed + self.dropped + self.orphaned
    }
}
