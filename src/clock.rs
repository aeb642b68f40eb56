//! Simulation clock boundary (C1 half of Clock & Identity).
//!
//! The wall clock is always `std::time::Instant`; only the simulation clock
//! is pluggable, since it is owned by the emulator driving the topology.

use async_trait::async_trait;

/// Gives the current simulation time in seconds. Implemented by the host
/// application; the collector only ever reads it.
#[async_trait]
pub trait SimClock: Send + Sync {
    async fn now_s(&self) -> f64;
}

/// A `SimClock` that always reports zero, used where the host application
/// has no simulation-time source (e.g. `connect`/`handover` driven directly
/// by wall time).
pub struct ZeroClock;

#[async_trait]
impl SimClock for ZeroClock {
    async fn now_s(&self) -> f64 {
        0.0
    }
}
