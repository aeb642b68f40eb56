//! Peer-lookup boundary: resolves a reachable probe target for a handover
//! task, mirroring `_find_ping_target`'s "another GS, else a satellite"
//! preference.

use async_trait::async_trait;

#[async_trait]
pub trait PeerLookup: Send + Sync {
    /// Returns a reachable peer IP for a probe originating at `from_gs_id`,
    /// or `None` if no target is available (the handover task still runs
    /// and records convergence in that case).
    async fn resolve_probe_target(&self, from_gs_id: &str) -> Option<String>;
}
