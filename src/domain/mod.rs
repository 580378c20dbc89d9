//! Domain layer: item types, lots, and the ports the distribution logic talks to.

pub mod delivery;
pub mod item;
pub mod lot;
pub mod ports;
