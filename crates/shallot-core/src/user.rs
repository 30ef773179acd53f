//! User agent: sends onions and keeps an inbox.

use crate::address::Address;
use crate::circuit::{Circuit, select_circuit};
use crate::config::{NetworkPlan, UserId};
use crate::error::{Error, Result};
use crate::network::{Delivery, RelayDirectory};
use crate::onion::{Onion, build_onion};
use rand::Rng;
use rand_core::{CryptoRng, OsRng};
use shallot_discovery::{NodeId, RelayRecord};
use tokio::sync::RwLock;

/// What a user last saw
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIntrospection {
    /// Last message delivered to this user's inbox
    pub last_received: Option<String>,
    /// Last message this user sent
    pub last_sent: Option<String>,
    /// Relays of the last circuit, entry first
    pub last_circuit: Vec<NodeId>,
}

/// A message ready to hand to its entry relay
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Path the onion was built for
    pub circuit: Circuit,
    /// Where the onion goes first
    pub entry: Address,
    /// The onion
    pub onion: Onion,
}

/// Circuit selection plus onion construction for one message.
///
/// # Errors
///
/// Returns `Error::InsufficientRelays` if `relays` is too small for the
/// plan's circuit length, `Error::EmptyCircuit` if that length is zero, and
/// `Error::Crypto` if a relay's key does not decode.
pub fn prepare_message<R: Rng + CryptoRng>(
    rng: &mut R,
    plan: &NetworkPlan,
    relays: &[RelayRecord],
    message: &str,
    destination: Address,
) -> Result<OutgoingMessage> {
    let circuit = select_circuit(rng, relays, plan.circuit_length)?;
    let hops = circuit.hops(plan)?;
    let entry = hops.first().ok_or(Error::EmptyCircuit)?.address;
    let onion = build_onion(rng, message, destination, &hops)?;

    Ok(OutgoingMessage {
        circuit,
        entry,
        onion,
    })
}

/// One user of the network.
pub struct UserAgent {
    user_id: UserId,
    plan: NetworkPlan,
    introspection: RwLock<UserIntrospection>,
}

impl UserAgent {
    /// Create a user.
    #[must_use]
    pub fn new(user_id: UserId, plan: NetworkPlan) -> Self {
        Self {
            user_id,
            plan,
            introspection: RwLock::new(UserIntrospection::default()),
        }
    }

    /// User id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Network layout this user routes by.
    #[must_use]
    pub fn plan(&self) -> &NetworkPlan {
        &self.plan
    }

    /// Store a message delivered to this user's inbox.
    pub async fn receive(&self, message: String) {
        tracing::debug!("user {} received {} bytes", self.user_id, message.len());
        self.introspection.write().await.last_received = Some(message);
    }

    /// Send `message` to user `destination` through a fresh circuit.
    ///
    /// Returns once the entry relay reports the outcome of the whole chain.
    ///
    /// # Errors
    ///
    /// Directory, circuit and crypto errors abort before anything is sent;
    /// `Error::Delivery` reports a failure anywhere along the circuit.
    pub async fn send_message<Dir, D>(
        &self,
        message: &str,
        destination: UserId,
        directory: &Dir,
        delivery: &D,
    ) -> Result<Circuit>
    where
        Dir: RelayDirectory + ?Sized,
        D: Delivery + ?Sized,
    {
        let destination = self.plan.user_address(destination)?;
        let relays = directory.relays().await?;
        let outgoing = prepare_message(&mut OsRng, &self.plan, &relays, message, destination)?;

        {
            let mut introspection = self.introspection.write().await;
            introspection.last_sent = Some(message.to_string());
            introspection.last_circuit = outgoing.circuit.node_ids();
        }

        tracing::debug!(
            "user {} sending via circuit {:?} to {destination}",
            self.user_id,
            outgoing.circuit.node_ids()
        );

        delivery
            .deliver(
                outgoing.entry,
                outgoing.onion.as_str(),
                self.plan.circuit_budget(),
            )
            .await?;
        Ok(outgoing.circuit)
    }

    /// Snapshot of the introspection fields.
    pub async fn introspect(&self) -> UserIntrospection {
        self.introspection.read().await.clone()
    }
}

impl std::fmt::Debug for UserAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAgent")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use crate::relay::RelayEngine;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shallot_discovery::DirectoryError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Relays and inboxes wired together in memory.
    struct Loopback {
        plan: NetworkPlan,
        relays: HashMap<Address, Arc<RelayEngine>>,
        inboxes: HashMap<Address, Arc<UserAgent>>,
        hops: Mutex<Vec<Address>>,
        budgets: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delivery for Loopback {
        async fn deliver(
            &self,
            to: Address,
            payload: &str,
            budget: Duration,
        ) -> std::result::Result<(), DeliveryError> {
            self.hops.lock().unwrap().push(to);
            self.budgets.lock().unwrap().push(budget);
            if let Some(relay) = self.relays.get(&to) {
                return relay
                    .handle(payload.to_string(), self, self.plan.forward_budget(Some(budget)))
                    .await
                    .map(|_| ())
                    .map_err(|e| DeliveryError::Rejected {
                        address: to,
                        error: e.to_wire(),
                    });
            }
            if let Some(user) = self.inboxes.get(&to) {
                user.receive(payload.to_string()).await;
                return Ok(());
            }
            Err(DeliveryError::Rejected {
                address: to,
                error: shallot_transport::WireError::new(
                    shallot_transport::ErrorCode::Internal,
                    "nobody home",
                ),
            })
        }
    }

    #[async_trait]
    impl RelayDirectory for Loopback {
        async fn relays(&self) -> std::result::Result<Vec<RelayRecord>, DirectoryError> {
            let mut records: Vec<_> = self.relays.values().map(|r| r.record()).collect();
            records.sort_by_key(|r| r.node_id);
            Ok(records)
        }
    }

    fn loopback(relay_count: u32, user_count: u32) -> Loopback {
        let plan = NetworkPlan::default();
        let mut rng = StdRng::seed_from_u64(9);
        let relays = (0..relay_count)
            .map(|id| {
                let engine = Arc::new(RelayEngine::generate(id, &mut rng));
                (plan.relay_address(id).unwrap(), engine)
            })
            .collect();
        let inboxes = (0..user_count)
            .map(|id| {
                let user = Arc::new(UserAgent::new(id, plan.clone()));
                (plan.user_address(id).unwrap(), user)
            })
            .collect();

        Loopback {
            plan,
            relays,
            inboxes,
            hops: Mutex::new(Vec::new()),
            budgets: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_send_through_loopback() {
        let net = loopback(5, 2);
        let sender = &net.inboxes[&net.plan.user_address(0).unwrap()];
        let receiver = &net.inboxes[&net.plan.user_address(1).unwrap()];

        let circuit = sender.send_message("hello", 1, &net, &net).await.unwrap();
        assert_eq!(circuit.len(), 3);

        assert_eq!(
            receiver.introspect().await.last_received.as_deref(),
            Some("hello")
        );

        let sent = sender.introspect().await;
        assert_eq!(sent.last_sent.as_deref(), Some("hello"));
        assert_eq!(sent.last_circuit, circuit.node_ids());

        let mut expected: Vec<Address> = circuit
            .node_ids()
            .into_iter()
            .map(|id| net.plan.relay_address(id).unwrap())
            .collect();
        expected.push(net.plan.user_address(1).unwrap());
        assert_eq!(*net.hops.lock().unwrap(), expected);

        // Every hop answers within what its caller waits.
        let budgets = net.budgets.lock().unwrap().clone();
        assert_eq!(budgets.first(), Some(&net.plan.circuit_budget()));
        assert!(budgets.windows(2).all(|pair| pair[1] < pair[0]));

        // Each relay learned only its successor.
        for (i, id) in circuit.node_ids().iter().enumerate() {
            let relay = &net.relays[&net.plan.relay_address(*id).unwrap()];
            assert_eq!(relay.introspect().await.last_destination, Some(expected[i + 1]));
        }
    }

    #[tokio::test]
    async fn test_insufficient_relays_sends_nothing() {
        let net = loopback(2, 2);
        let sender = &net.inboxes[&net.plan.user_address(0).unwrap()];

        let err = sender.send_message("hello", 1, &net, &net).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientRelays {
                required: 3,
                available: 2
            }
        ));
        assert!(net.hops.lock().unwrap().is_empty());
        assert_eq!(sender.introspect().await, UserIntrospection::default());
    }

    #[tokio::test]
    async fn test_unknown_destination_reported() {
        let net = loopback(3, 1);
        let sender = &net.inboxes[&net.plan.user_address(0).unwrap()];

        let err = sender.send_message("hello", 5, &net, &net).await.unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
    }

    #[test]
    fn test_prepare_message_entry_matches_circuit() {
        let mut rng = StdRng::seed_from_u64(11);
        let plan = NetworkPlan::default();
        let relays: Vec<_> = (0..4)
            .map(|id| RelayEngine::generate(id, &mut rng).record())
            .collect();

        let outgoing =
            prepare_message(&mut rng, &plan, &relays, "x", Address::new(3000)).unwrap();
        let entry_id = outgoing.circuit.entry().unwrap().node_id;
        assert_eq!(outgoing.entry, plan.relay_address(entry_id).unwrap());
    }
}
