//! Handover Measurement Task (C7), ported from `_measure_handover` and
//! `_measure_connect`, unified into the single state machine spec.md §4.5
//! describes for both triggers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{Duration, Instant};

use crate::config::CollectorConfig;
use crate::gateway::{Gateway, NodeExec};
use crate::node::{NodeId, NodeInventory};
use crate::parsers::{adjacency_up, route_present};
use crate::peer::PeerLookup;
use crate::records::{ConvergenceRecord, InterruptionRecord, PacketLossRecord, Trigger};
use crate::store::EventStore;

/// A single reachability probe against `target_ip`. Implemented by the host
/// application (e.g. an ICMP echo); kept separate from `PeerLookup` since
/// resolving a target and probing it are different concerns.
#[async_trait::async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Issues one single-packet probe with a 1 s deadline. Returns whether
    /// it succeeded.
    async fn probe(&self, target_ip: &str) -> bool;
}

pub struct HandoverTaskParams {
    pub gs_id: String,
    pub from_sat: Option<u32>,
    pub to_sat: Option<u32>,
    pub sim_time_s: f64,
    pub trigger: Trigger,
}

/// Runs the C7 state machine to completion and records the three outcome
/// records atomically. Observes `running` at each ~100ms iteration so
/// `stop` can cancel it promptly with clamped values.
///
/// Mirrors the original's `if not gs_host: return` guard: a `gs_id` absent
/// from the initial inventory produces no records at all, so Invariant 5
/// ("no record references a node outside the initial inventory") holds even
/// for a bus notification naming an unknown ground station.
pub async fn run_handover_task<E: NodeExec, P: PeerLookup, R: ReachabilityProbe>(
    params: HandoverTaskParams,
    gateway: Arc<Gateway<E>>,
    peer_lookup: Arc<P>,
    probe: Option<Arc<R>>,
    store: Arc<EventStore>,
    config: CollectorConfig,
    running: Arc<AtomicBool>,
    inventory: Arc<NodeInventory>,
) {
    if !inventory.ground_stations().iter().any(|gs| gs == &params.gs_id) {
        log::warn!("handover task for unknown ground station {}, dropping", params.gs_id);
        return;
    }

    let gs_node = NodeId::ground_station(params.gs_id.clone());
    let timeout = Duration::from_secs_f64(config.handover_timeout_s);
    let timeout_s = config.handover_timeout_s;

    let target_ip = peer_lookup.resolve_probe_target(&params.gs_id).await;
    if target_ip.is_none() {
        log::warn!("no ping target found for {}, measuring adjacency/route only", params.gs_id);
    }

    let start = Instant::now();
    let mut sent: u64 = 0;
    let mut received: u64 = 0;
    let mut last_ok_wall = start;
    let mut first_ok_after_gap: Option<Instant> = None;
    let mut adjacency_up_at: Option<f64> = None;
    let mut route_present_at: Option<f64> = None;
    let mut last_adj_poll = start - Duration::from_secs_f64(config.adj_poll_interval_s);

    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let now = Instant::now();
        let elapsed = now.duration_since(start);
        if elapsed >= timeout {
            break;
        }

        if let (Some(ip), Some(probe)) = (target_ip.as_deref(), probe.as_ref()) {
            sent += 1;
            let ok = probe.probe(ip).await;
            let now = Instant::now();
            if ok {
                received += 1;
                if first_ok_after_gap.is_none() && now.duration_since(start) > Duration::from_secs(1) {
                    first_ok_after_gap = Some(now);
                }
                last_ok_wall = now;
            } else if let Some(candidate) = first_ok_after_gap {
                if now.duration_since(candidate) < Duration::from_secs_f64(config.first_ok_reset_window_s) {
                    first_ok_after_gap = None;
                }
            }
        }

        let now = Instant::now();
        if now.duration_since(last_adj_poll) >= Duration::from_secs_f64(config.adj_poll_interval_s) {
            last_adj_poll = now;
            let elapsed_s = now.duration_since(start).as_secs_f64();

            if adjacency_up_at.is_none() {
                let (output, ok) = gateway.exec(&gs_node, "show isis neighbor").await;
                if ok && adjacency_up(&output) {
                    adjacency_up_at = Some(elapsed_s);
                }
            }
            if route_present_at.is_none() {
                let (output, ok) = gateway.exec(&gs_node, "show ip route isis").await;
                if ok && route_present(&output) {
                    route_present_at = Some(elapsed_s);
                }
            }
        }

        if let (Some(adj), Some(route)) = (adjacency_up_at, route_present_at) {
            if first_ok_after_gap.is_some() {
                break;
            }
            let now_s = Instant::now().duration_since(start).as_secs_f64();
            if now_s > route.max(adj) + 2.0 {
                break;
            }
        }

        tokio::time::sleep(Duration::from_secs_f64(config.probe_interval_s)).await;
    }

    let adjacency_up_s = adjacency_up_at.unwrap_or(timeout_s);
    let route_present_s = route_present_at.unwrap_or(timeout_s);
    let convergence_s = adjacency_up_s.max(route_present_s);

    let convergence = ConvergenceRecord {
        sim_time_s: params.sim_time_s,
        trigger: params.trigger,
        gs_id: params.gs_id.clone(),
        from_sat: params.from_sat,
        to_sat: params.to_sat,
        adjacency_up_s,
        route_present_s,
        convergence_s,
    };

    let lost = sent.saturating_sub(received);
    let loss_pct = if sent > 0 { 100.0 * lost as f64 / sent as f64 } else { 0.0 };
    let loss = PacketLossRecord {
        sim_time_s: params.sim_time_s,
        gs_id: params.gs_id.clone(),
        from_sat: params.from_sat,
        to_sat: params.to_sat,
        sent,
        received,
        lost,
        loss_pct,
    };

    // No target means no probing ever occurred: carry the documented
    // sentinel rather than reading elapsed wall time at exit.
    let (last_ok_s, first_ok_s, interruption_s) = if target_ip.is_none() {
        (0.0, timeout_s, timeout_s)
    } else {
        match first_ok_after_gap {
            Some(t) => {
                let v = t.duration_since(start).as_secs_f64();
                (last_ok_wall.duration_since(start).as_secs_f64(), v, v)
            }
            None => (
                last_ok_wall.duration_since(start).as_secs_f64(),
                timeout_s,
                Instant::now().duration_since(start).as_secs_f64(),
            ),
        }
    };
    let interruption = InterruptionRecord {
        sim_time_s: params.sim_time_s,
        gs_id: params.gs_id.clone(),
        last_ok_s,
        first_ok_s,
        interruption_s,
    };

    store.record_handover_outcome(convergence, loss, interruption).await;
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

    fn running_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    fn inventory_with(gs_id: &str) -> Arc<NodeInventory> {
        Arc::new(NodeInventory::new(vec![], vec![gs_id.to_string()]))
    }

    struct FixedExec {
        neighbor_up_after_ms: u64,
        route_up_after_ms: u64,
        start: Instant,
    }

    #[async_trait]
    impl NodeExec for FixedExec {
        async fn exec(&self, _node: &NodeId, command: &str) -> String {
            let elapsed_ms = self.start.elapsed().as_millis() as u64;
            if command == "show isis neighbor" {
                if elapsed_ms >= self.neighbor_up_after_ms {
                    "sat1 eth0 2 Up 26 aaaa".to_string()
                } else {
                    "sat1 eth0 2 Init 26 aaaa".to_string()
                }
            } else if command == "show ip route isis" {
                if elapsed_ms >= self.route_up_after_ms {
                    "I 10.0.2.0/30 [115/20] via 10.0.1.2".to_string()
                } else {
                    String::new()
                }
            } else {
                String::new()
            }
        }
    }

    struct NoPeer;
    #[async_trait]
    impl PeerLookup for NoPeer {
        async fn resolve_probe_target(&self, _from_gs_id: &str) -> Option<String> {
            None
        }
    }

    struct FlakyProbe {
        calls: AtomicU32,
        fail_until: u32,
    }
    #[async_trait]
    impl ReachabilityProbe for FlakyProbe {
        async fn probe(&self, _target_ip: &str) -> bool {
            let n = self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            n >= self.fail_until
        }
    }

    struct FixedPeer(String);
    #[async_trait]
    impl PeerLookup for FixedPeer {
        async fn resolve_probe_target(&self, _from_gs_id: &str) -> Option<String> {
            Some(self.0.clone())
        }
    }

    #[tokio::test]
    async fn connect_without_peer_uses_sentinel_interruption() {
        let exec = FixedExec { neighbor_up_after_ms: 50, route_up_after_ms: 80, start: Instant::now() };
        let gateway = Arc::new(Gateway::new(exec, Duration::from_secs(1)));
        let store = Arc::new(EventStore::new(None));
        let config = CollectorConfig::default().with_handover_timeout_s(2.0);
        run_handover_task::<FixedExec, NoPeer, crate::testkit::ScriptedProbe>(
            HandoverTaskParams { gs_id: "gs0".into(), from_sat: None, to_sat: Some(3), sim_time_s: 10.0, trigger: Trigger::Connect },
            gateway,
            Arc::new(NoPeer),
            None,
            store.clone(),
            config.clone(),
            running_flag(),
            inventory_with("gs0"),
        )
        .await;

        let convergence = store.convergence_events().await;
        assert_eq!(convergence.len(), 1);
        assert!(convergence[0].adjacency_up_s < 2.0);
        assert!(convergence[0].route_present_s < 2.0);
        assert_eq!(convergence[0].convergence_s, convergence[0].route_present_s.max(convergence[0].adjacency_up_s));

        let loss = store.packet_loss_events().await;
        assert_eq!(loss[0].sent, 0);

        let interruption = store.service_interruptions().await;
        assert_eq!(interruption[0].first_ok_s, config.handover_timeout_s);
        assert_eq!(interruption[0].interruption_s, config.handover_timeout_s);
    }

    #[tokio::test]
    async fn handover_with_reachable_peer_records_loss_and_interruption() {
        let exec = FixedExec { neighbor_up_after_ms: 100, route_up_after_ms: 150, start: Instant::now() };
        let gateway = Arc::new(Gateway::new(exec, Duration::from_secs(1)));
        let store = Arc::new(EventStore::new(None));
        let config = CollectorConfig::default().with_handover_timeout_s(3.0);
        let probe = Arc::new(FlakyProbe { calls: AtomicU32::new(0), fail_until: 3 });
        run_handover_task(
            HandoverTaskParams { gs_id: "gs1".into(), from_sat: Some(5), to_sat: Some(6), sim_time_s: 50.0, trigger: Trigger::Handover },
            gateway,
            Arc::new(FixedPeer("10.0.0.2".into())),
            Some(probe),
            store.clone(),
            config,
            running_flag(),
            inventory_with("gs1"),
        )
        .await;

        let loss = store.packet_loss_events().await;
        assert!(loss[0].sent > 0);
        let interruption = store.service_interruptions().await;
        assert_eq!(interruption.len(), 1);
    }

    #[tokio::test]
    async fn timeout_clamps_durations() {
        struct NeverUpExec;
        #[async_trait]
        impl NodeExec for NeverUpExec {
            async fn exec(&self, _node: &NodeId, _command: &str) -> String {
                String::new()
            }
        }
        let gateway = Arc::new(Gateway::new(NeverUpExec, Duration::from_millis(50)));
        let store = Arc::new(EventStore::new(None));
        let config = CollectorConfig::default().with_handover_timeout_s(0.3);
        run_handover_task::<NeverUpExec, NoPeer, crate::testkit::ScriptedProbe>(
            HandoverTaskParams { gs_id: "gs2".into(), from_sat: Some(1), to_sat: Some(2), sim_time_s: 0.0, trigger: Trigger::Handover },
            gateway,
            Arc::new(NoPeer),
            None,
            store.clone(),
            config.clone(),
            running_flag(),
            inventory_with("gs2"),
        )
        .await;

        let convergence = store.convergence_events().await;
        assert_eq!(convergence[0].adjacency_up_s, config.handover_timeout_s);
        assert_eq!(convergence[0].route_present_s, config.handover_timeout_s);
        assert_eq!(convergence[0].convergence_s, config.handover_timeout_s);
    }

    #[tokio::test]
    async fn clearing_running_flag_stops_task_promptly() {
        struct NeverUpExec;
        #[async_trait]
        impl NodeExec for NeverUpExec {
            async fn exec(&self, _node: &NodeId, _command: &str) -> String {
                String::new()
            }
        }
        let gateway = Arc::new(Gateway::new(NeverUpExec, Duration::from_millis(50)));
        let store = Arc::new(EventStore::new(None));
        let config = CollectorConfig::default().with_handover_timeout_s(30.0);
        let running = running_flag();
        let running_for_task = running.clone();
        let store_for_task = store.clone();
        let task = tokio::spawn(async move {
            run_handover_task::<NeverUpExec, NoPeer, crate::testkit::ScriptedProbe>(
                HandoverTaskParams { gs_id: "gs3".into(), from_sat: Some(1), to_sat: Some(2), sim_time_s: 0.0, trigger: Trigger::Handover },
                gateway,
                Arc::new(NoPeer),
                None,
                store_for_task,
                config,
                running_for_task,
                inventory_with("gs3"),
            )
            .await;
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        running.store(false, AtomicOrdering::SeqCst);
        let result = tokio::time::timeout(Duration::from_secs(1), task).await;
        assert!(result.is_ok());
        assert_eq!(store.convergence_events().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_ground_station_is_dropped_without_recording() {
        let exec = FixedExec { neighbor_up_after_ms: 0, route_up_after_ms: 0, start: Instant::now() };
        let gateway = Arc::new(Gateway::new(exec, Duration::from_secs(1)));
        let store = Arc::new(EventStore::new(None));
        let config = CollectorConfig::default().with_handover_timeout_s(1.0);
        run_handover_task::<FixedExec, NoPeer, crate::testkit::ScriptedProbe>(
            HandoverTaskParams { gs_id: "ghost-gs".into(), from_sat: None, to_sat: Some(0), sim_time_s: 0.0, trigger: Trigger::Connect },
            gateway,
            Arc::new(NoPeer),
            None,
            store.clone(),
            config,
            running_flag(),
            inventory_with("gs0"),
        )
        .await;

        assert!(store.convergence_events().await.is_empty());
        assert!(store.packet_loss_events().await.is_empty());
        assert!(store.service_interruptions().await.is_empty());
    }
}
