//! Handover bus boundary: delivers `connect`/`handover`/`disconnect`
//! notifications from the topology driver.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::node::NodeId;

/// One notification from the topology driver, carrying the nominal
/// simulation time at which the event occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum HandoverNotification {
    Connect {
        gs_id: String,
        sat_id: u32,
        sim_time_s: f64,
    },
    Handover {
        gs_id: String,
        from_sat_id: u32,
        to_sat_id: u32,
        sim_time_s: f64,
    },
    /// Accepted and logged; produces no records (see open question (b)).
    Disconnect { gs_id: String, sim_time_s: f64 },
}

impl HandoverNotification {
    pub fn gs_id(&self) -> &str {
        match self {
            HandoverNotification::Connect { gs_id, .. }
            | HandoverNotification::Handover { gs_id, .. }
            | HandoverNotification::Disconnect { gs_id, .. } => gs_id,
        }
    }

    pub fn gs_node_id(&self) -> NodeId {
        NodeId::ground_station(self.gs_id().to_string())
    }
}

/// The handover bus: the host application implements this to hand the
/// collector a stream of notifications. Subscription is expected to be
/// cheap and called exactly once, at `start`.
#[async_trait]
pub trait HandoverBus: Send + Sync {
    fn subscribe(&self) -> UnboundedReceiver<HandoverNotification>;
}
