//! Relay peeling engine.

use crate::address::Address;
use crate::error::Result;
use crate::network::Delivery;
use crate::onion::{self, PeeledLayer};
use rand_core::{CryptoRng, RngCore};
use shallot_crypto::{KeyPair, PublicKey};
use shallot_discovery::{NodeId, RelayRecord};
use std::time::Duration;
use tokio::sync::RwLock;

/// What a relay last saw
///
/// Concurrent messages overwrite each other; the values are for inspection
/// only and never feed back into routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayIntrospection {
    /// Last onion received, before peeling
    pub last_received_encrypted: Option<String>,
    /// Payload recovered from the last successful peel
    pub last_received_decrypted: Option<String>,
    /// Next hop of the last successful peel
    pub last_destination: Option<Address>,
}

/// Peels one layer per message and forwards the rest.
///
/// The engine keeps no per-message state beyond [`RelayIntrospection`], so
/// one instance can serve any number of messages concurrently.
pub struct RelayEngine {
    node_id: NodeId,
    keys: KeyPair,
    introspection: RwLock<RelayIntrospection>,
}

impl RelayEngine {
    /// Create an engine around an existing key pair.
    #[must_use]
    pub fn new(node_id: NodeId, keys: KeyPair) -> Self {
        Self {
            node_id,
            keys,
            introspection: RwLock::new(RelayIntrospection::default()),
        }
    }

    /// Create an engine with a fresh key pair.
    pub fn generate<R: RngCore + CryptoRng>(node_id: NodeId, rng: &mut R) -> Self {
        Self::new(node_id, KeyPair::generate(rng))
    }

    /// Relay id.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Relay public key.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        self.keys.public_key()
    }

    /// Directory announcement for this relay. Carries only the public key.
    #[must_use]
    pub fn record(&self) -> RelayRecord {
        RelayRecord::new(self.node_id, self.keys.public_key())
    }

    /// Remove this relay's layer without recording or forwarding.
    ///
    /// # Errors
    ///
    /// See [`onion::peel`].
    pub fn peel(&self, onion: &str) -> Result<PeeledLayer> {
        onion::peel(onion, self.keys.private_key())
    }

    /// Receive an onion, peel it, and forward the remainder.
    ///
    /// Returns the address the payload was forwarded to. A layer that fails
    /// to peel is dropped; nothing is forwarded and nothing is retried. The
    /// next hop gets `budget` to answer.
    ///
    /// # Errors
    ///
    /// Returns the peel error for undecryptable or malformed layers, and
    /// `Error::Delivery` if the next hop is unreachable or rejects the payload.
    pub async fn handle<D: Delivery + ?Sized>(
        &self,
        onion: String,
        delivery: &D,
        budget: Duration,
    ) -> Result<Address> {
        let peeled = self.peel(&onion);
        self.introspection.write().await.last_received_encrypted = Some(onion);

        let layer = match peeled {
            Ok(layer) => layer,
            Err(e) => {
                tracing::warn!("relay {} dropped message: {e}", self.node_id);
                return Err(e);
            }
        };

        {
            let mut introspection = self.introspection.write().await;
            introspection.last_received_decrypted = Some(layer.payload.clone());
            introspection.last_destination = Some(layer.next_hop);
        }

        tracing::debug!(
            "relay {} forwarding {} bytes to {}",
            self.node_id,
            layer.payload.len(),
            layer.next_hop
        );

        delivery.deliver(layer.next_hop, &layer.payload, budget).await?;
        Ok(layer.next_hop)
    }

    /// Snapshot of the introspection fields.
    pub async fn introspect(&self) -> RelayIntrospection {
        self.introspection.read().await.clone()
    }
}

impl std::fmt::Debug for RelayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEngine")
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeliveryError, Error};
    use crate::onion::{Hop, build_onion};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shallot_transport::{ErrorCode, WireError};
    use std::sync::Mutex;

    const BUDGET: Duration = Duration::from_secs(1);

    #[derive(Default)]
    struct Recorder {
        delivered: Mutex<Vec<(Address, String)>>,
        reject: bool,
    }

    #[async_trait]
    impl Delivery for Recorder {
        async fn deliver(
            &self,
            to: Address,
            payload: &str,
            _budget: Duration,
        ) -> std::result::Result<(), DeliveryError> {
            self.delivered.lock().unwrap().push((to, payload.to_string()));
            if self.reject {
                Err(DeliveryError::Rejected {
                    address: to,
                    error: WireError::new(ErrorCode::DecryptionFailed, "bad layer"),
                })
            } else {
                Ok(())
            }
        }
    }

    fn single_hop(rng: &mut StdRng, engine: &RelayEngine, message: &str) -> String {
        let hop = Hop {
            address: Address::new(4001),
            public_key: *engine.public_key(),
        };
        build_onion(rng, message, Address::new(3002), &[hop])
            .unwrap()
            .into_string()
    }

    #[tokio::test]
    async fn test_handle_forwards_and_records() {
        let mut rng = StdRng::seed_from_u64(1);
        let engine = RelayEngine::generate(1, &mut rng);
        let onion = single_hop(&mut rng, &engine, "hi");
        let delivery = Recorder::default();

        let next = engine.handle(onion.clone(), &delivery, BUDGET).await.unwrap();
        assert_eq!(next, Address::new(3002));
        assert_eq!(
            *delivery.delivered.lock().unwrap(),
            vec![(Address::new(3002), "hi".to_string())]
        );

        let seen = engine.introspect().await;
        assert_eq!(seen.last_received_encrypted, Some(onion));
        assert_eq!(seen.last_received_decrypted.as_deref(), Some("hi"));
        assert_eq!(seen.last_destination, Some(Address::new(3002)));
    }

    #[tokio::test]
    async fn test_bad_layer_not_forwarded() {
        let mut rng = StdRng::seed_from_u64(2);
        let engine = RelayEngine::generate(1, &mut rng);
        let other = RelayEngine::generate(2, &mut rng);
        let onion = single_hop(&mut rng, &other, "hi");
        let delivery = Recorder::default();

        let err = engine.handle(onion.clone(), &delivery, BUDGET).await.unwrap_err();
        assert!(err.is_decryption_failure());
        assert!(delivery.delivered.lock().unwrap().is_empty());

        let seen = engine.introspect().await;
        assert_eq!(seen.last_received_encrypted, Some(onion));
        assert_eq!(seen.last_received_decrypted, None);
        assert_eq!(seen.last_destination, None);
    }

    #[tokio::test]
    async fn test_downstream_failure_reported() {
        let mut rng = StdRng::seed_from_u64(3);
        let engine = RelayEngine::generate(1, &mut rng);
        let onion = single_hop(&mut rng, &engine, "hi");
        let delivery = Recorder {
            reject: true,
            ..Recorder::default()
        };

        let err = engine.handle(onion, &delivery, BUDGET).await.unwrap_err();
        assert!(matches!(err, Error::Delivery(DeliveryError::Rejected { .. })));
        assert_eq!(delivery.delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_record_has_only_public_key() {
        let mut rng = StdRng::seed_from_u64(4);
        let engine = RelayEngine::generate(7, &mut rng);
        let record = engine.record();
        assert_eq!(record.node_id, 7);
        assert_eq!(record.decode_public_key().unwrap(), *engine.public_key());
        assert!(!format!("{engine:?}").contains(&record.public_key));
    }
}
