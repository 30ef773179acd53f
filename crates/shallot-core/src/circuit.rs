//! Circuit selection.

use crate::config::NetworkPlan;
use crate::error::{Error, Result};
use crate::onion::Hop;
use rand::Rng;
use rand::seq::SliceRandom;
use shallot_discovery::{NodeId, RelayRecord};
use std::collections::HashSet;

/// Relays a message traverses, entry first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    relays: Vec<RelayRecord>,
}

impl Circuit {
    /// Wrap an entry-first relay sequence.
    #[must_use]
    pub fn new(relays: Vec<RelayRecord>) -> Self {
        Self { relays }
    }

    /// Relays, entry first.
    #[must_use]
    pub fn relays(&self) -> &[RelayRecord] {
        &self.relays
    }

    /// Relay ids, entry first.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.relays.iter().map(|r| r.node_id).collect()
    }

    /// First relay, the one the onion is handed to.
    #[must_use]
    pub fn entry(&self) -> Option<&RelayRecord> {
        self.relays.first()
    }

    /// Number of relays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Whether the circuit has no relays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Resolve each relay to its address and decoded key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Crypto` if a registered key does not decode and
    /// `Error::AddressOutOfRange` if a relay id has no port.
    pub fn hops(&self, plan: &NetworkPlan) -> Result<Vec<Hop>> {
        self.relays
            .iter()
            .map(|relay| {
                Ok(Hop {
                    address: plan.relay_address(relay.node_id)?,
                    public_key: relay.decode_public_key()?,
                })
            })
            .collect()
    }
}

/// Pick `length` distinct relays uniformly at random, without replacement.
///
/// Records sharing a node id count once; the first occurrence wins.
///
/// # Errors
///
/// Returns `Error::InsufficientRelays` if fewer than `length` distinct relays
/// are available.
pub fn select_circuit<R: Rng + ?Sized>(
    rng: &mut R,
    relays: &[RelayRecord],
    length: usize,
) -> Result<Circuit> {
    let mut seen = HashSet::with_capacity(relays.len());
    let mut distinct: Vec<&RelayRecord> =
        relays.iter().filter(|r| seen.insert(r.node_id)).collect();

    if distinct.len() < length {
        return Err(Error::InsufficientRelays {
            required: length,
            available: distinct.len(),
        });
    }

    let (chosen, _) = distinct.partial_shuffle(rng, length);
    Ok(Circuit::new(chosen.iter().map(|r| (*r).clone()).collect()))
}
