//! Routing Metrics Collector for LEO satellite constellation emulation.
//!
//! Reacts to topology events (ground-station connect/handover/disconnect)
//! by spawning per-event measurement tasks, and concurrently polls a node
//! subset to derive SPF timings and LSA flooding delays. Orbit/topology
//! computation, emulator link plumbing, and routing daemon configuration
//! are external collaborators reached only through the four traits in
//! [`gateway`], [`bus`], [`peer`], and [`clock`].

pub mod bus;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod gateway;
pub mod handover;
pub mod lifecycle;
pub mod logging;
pub mod node;
pub mod parsers;
pub mod peer;
pub mod poller;
pub mod records;
pub mod store;
pub mod testkit;

pub mod prelude {
    pub use super::{
        bus::{HandoverBus, HandoverNotification},
        clock::SimClock,
        config::CollectorConfig,
        error::CollectorError,
        gateway::{Gateway, NodeExec},
        handover::ReachabilityProbe,
        lifecycle::{Collector, StatusReport},
        node::{NodeId, NodeInventory},
        peer::PeerLookup,
        records::*,
    };
}
