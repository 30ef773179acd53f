//! In-memory relay registry.

use crate::error::DirectoryError;
use crate::protocol::{NodeId, RelayRecord};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registered relays, in registration order.
///
/// Records are immutable once accepted. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: Arc<RwLock<Vec<RelayRecord>>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a relay announcement.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::InvalidKey` if the public key does not decode,
    /// and `DirectoryError::RegistrationConflict` if the id is taken. The
    /// existing record is left untouched in both cases.
    pub async fn register(&self, record: RelayRecord) -> Result<(), DirectoryError> {
        record.decode_public_key()?;

        let mut records = self.records.write().await;
        if records.iter().any(|r| r.node_id == record.node_id) {
            return Err(DirectoryError::RegistrationConflict {
                node_id: record.node_id,
            });
        }

        records.push(record);
        Ok(())
    }

    /// Look up a relay by id.
    pub async fn get(&self, node_id: NodeId) -> Option<RelayRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.node_id == node_id)
            .cloned()
    }

    /// Copy of every record, in registration order.
    pub async fn snapshot(&self) -> Vec<RelayRecord> {
        self.records.read().await.clone()
    }

    /// Number of registered relays.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no relay has registered yet.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shallot_crypto::KeyPair;

    fn record(node_id: NodeId) -> RelayRecord {
        let pair = KeyPair::generate(&mut rand_core::OsRng);
        RelayRecord::new(node_id, pair.public_key())
    }

    #[tokio::test]
    async fn test_register_and_snapshot_order() {
        let registry = Registry::new();
        assert!(registry.is_empty().await);

        for id in [5, 1, 3] {
            registry.register(record(id)).await.unwrap();
        }

        let ids: Vec<_> = registry.snapshot().await.iter().map(|r| r.node_id).collect();
        assert_eq!(ids, vec![5, 1, 3]);
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_original_kept() {
        let registry = Registry::new();
        let first = record(1);
        registry.register(first.clone()).await.unwrap();

        let err = registry.register(record(1)).await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::RegistrationConflict { node_id: 1 }
        ));

        assert_eq!(registry.get(1).await, Some(first));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_bad_key_rejected() {
        let registry = Registry::new();
        let err = registry
            .register(RelayRecord {
                node_id: 1,
                public_key: "not a key".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::InvalidKey(_)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let registry = Registry::new();
        let other = registry.clone();
        registry.register(record(9)).await.unwrap();
        assert!(other.get(9).await.is_some());
        assert!(other.get(8).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let registry = Registry::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.register(record(4)).await }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(registry.len().await, 1);
    }
}
