//! Application layer: distributing lots and redelivering orphans.
//!
//! `Distributor` runs a single transfer to completion on the calling thread.
//! `Orphanage` is a tokio task that owns lots waiting for an unreachable
//! recipient and retries them when asked or on a sweep interval.

pub mod distributor;
pub mod orphanage;
