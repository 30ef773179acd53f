//! UDP implementations of the core's network seams.

use crate::address::Address;
use crate::config::NetworkPlan;
use crate::error::DeliveryError;
use crate::network::{Delivery, RelayDirectory};
use crate::node::protocol::{MessageBody, NodeRequest, NodeResponse};
use async_trait::async_trait;
use shallot_discovery::{DirectoryClient, DirectoryError, RelayRecord};
use shallot_transport::{DatagramClient, ErrorCode, WireError};
use std::net::IpAddr;
use std::time::Duration;

/// Delivers payloads as `message` requests to services on one host.
///
/// Each request carries its budget so a relay can give its own next hop
/// less time than it has.
#[derive(Debug, Clone)]
pub struct UdpDelivery {
    host: IpAddr,
}

impl UdpDelivery {
    /// Create a delivery for the plan's host.
    #[must_use]
    pub fn new(plan: &NetworkPlan) -> Self {
        Self { host: plan.host }
    }
}

#[async_trait]
impl Delivery for UdpDelivery {
    async fn deliver(&self, to: Address, payload: &str, budget: Duration) -> Result<(), DeliveryError> {
        let request = NodeRequest::Message(MessageBody::new(payload).with_budget(budget));

        let response: NodeResponse = DatagramClient::new(budget)
            .call((self.host, to.port()).into(), &request)
            .await
            .map_err(|source| DeliveryError::Unreachable {
                address: to,
                source,
            })?;

        match response {
            NodeResponse::Success => Ok(()),
            NodeResponse::Error(error) => Err(DeliveryError::Rejected { address: to, error }),
            other => Err(DeliveryError::Rejected {
                address: to,
                error: WireError::new(
                    ErrorCode::Internal,
                    format!("unexpected {} response", other.kind()),
                ),
            }),
        }
    }
}

#[async_trait]
impl RelayDirectory for DirectoryClient {
    async fn relays(&self) -> Result<Vec<RelayRecord>, DirectoryError> {
        self.fetch_relays().await
    }
}
