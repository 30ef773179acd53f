//! Seams to the outside world.
//!
//! The core needs two capabilities: listing the relays the directory knows
//! about, and handing a payload to an address. Network implementations live
//! in [`crate::node`]; tests plug in in-memory ones.

use crate::address::Address;
use crate::error::DeliveryError;
use async_trait::async_trait;
use shallot_discovery::{DirectoryError, RelayRecord};
use std::time::Duration;

/// Deliver a payload to an address and wait for the outcome.
///
/// The payload is either an onion for a relay or a plaintext message for a
/// user inbox; the sender does not distinguish the two.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Hand `payload` to whatever listens at `to`.
    ///
    /// `budget` bounds the whole exchange, including anything the receiver
    /// forwards before it answers.
    async fn deliver(&self, to: Address, payload: &str, budget: Duration) -> Result<(), DeliveryError>;
}

/// Source of the current relay list.
#[async_trait]
pub trait RelayDirectory: Send + Sync {
    /// Every registered relay.
    async fn relays(&self) -> Result<Vec<RelayRecord>, DirectoryError>;
}
