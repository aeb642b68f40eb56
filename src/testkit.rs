//! Fake implementations of the four external-collaborator traits, used by
//! the CLI demo and shared by the integration test suite — mirroring the
//! `new_offline`/`new_offline_from` test-double pattern the teacher's log
//! parser tests use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::bus::{HandoverBus, HandoverNotification};
use crate::clock::SimClock;
use crate::gateway::NodeExec;
use crate::handover::ReachabilityProbe;
use crate::node::NodeId;
use crate::peer::PeerLookup;

/// Replays a scripted text response per `(node, command)` pair, falling
/// back to an empty string. Intended for tests and the CLI demo, not
/// production use.
#[derive(Default)]
pub struct ScriptedNodeExec {
    responses: Mutex<HashMap<(String, String), String>>,
}

impl ScriptedNodeExec {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, node: &NodeId, command: &str, response: impl Into<String>) {
        self.responses.lock().await.insert((node.to_string(), command.to_string()), response.into());
    }
}

#[async_trait]
impl NodeExec for ScriptedNodeExec {
    async fn exec(&self, node: &NodeId, command: &str) -> String {
        self.responses.lock().await.get(&(node.to_string(), command.to_string())).cloned().unwrap_or_default()
    }
}

/// A `HandoverBus` backed by a channel the test/demo driver feeds directly.
/// `subscribe` is meant to be called exactly once, at collector `start`;
/// construct with [`ChannelHandoverBus::new`] and keep the returned sender
/// to drive notifications.
pub struct ChannelHandoverBus {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<HandoverNotification>>>,
}

impl ChannelHandoverBus {
    pub fn new() -> (Self, mpsc::UnboundedSender<HandoverNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelHandoverBus { receiver: Mutex::new(Some(rx)) }, tx)
    }
}

#[async_trait]
impl HandoverBus for ChannelHandoverBus {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<HandoverNotification> {
        self.receiver
            .try_lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .unwrap_or_else(|| {
                let (_tx, rx) = mpsc::unbounded_channel();
                rx
            })
    }
}

/// Always resolves to a fixed IP, or to `None` if configured empty.
pub struct FixedPeerLookup(pub Option<String>);

#[async_trait]
impl PeerLookup for FixedPeerLookup {
    async fn resolve_probe_target(&self, _from_gs_id: &str) -> Option<String> {
        self.0.clone()
    }
}

/// A clock driven by a shared, externally-advanced counter, standing in
/// for the emulator's simulation-time accessor.
pub struct ManualSimClock {
    time_s: std::sync::atomic::AtomicU64,
}

impl ManualSimClock {
    pub fn new(initial_s: f64) -> Self {
        ManualSimClock { time_s: std::sync::atomic::AtomicU64::new(initial_s.to_bits()) }
    }

    pub fn set(&self, value_s: f64) {
        self.time_s.store(value_s.to_bits(), std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl SimClock for ManualSimClock {
    async fn now_s(&self) -> f64 {
        f64::from_bits(self.time_s.load(std::sync::atomic::Ordering::SeqCst))
    }
}

/// A reachability probe whose outcomes are scripted call-by-call; once the
/// script is exhausted it repeats the last outcome.
pub struct ScriptedProbe {
    outcomes: Mutex<(Vec<bool>, usize)>,
}

impl ScriptedProbe {
    pub fn new(outcomes: Vec<bool>) -> Self {
        ScriptedProbe { outcomes: Mutex::new((outcomes, 0)) }
    }
}

#[async_trait]
impl ReachabilityProbe for ScriptedProbe {
    async fn probe(&self, _target_ip: &str) -> bool {
        let mut guard = self.outcomes.lock().await;
        let (outcomes, idx) = &mut *guard;
        if outcomes.is_empty() {
            return true;
        }
        let value = outcomes[(*idx).min(outcomes.len() - 1)];
        *idx += 1;
        value
    }
}
