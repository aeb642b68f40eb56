//! Periodic Poller (C6): fixed-tick SPF-then-LSP loop, ported from
//! `_poll_loop`/`_collect_spf_logs`/`_collect_lsp_flooding`. Per-node SPF
//! fan-out uses `async_scoped::TokioScope`, the same primitive the teacher
//! uses to fan concurrent per-router calls out before collecting results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::Duration;

use crate::clock::SimClock;
use crate::config::CollectorConfig;
use crate::gateway::{Gateway, NodeExec};
use crate::node::NodeInventory;
use crate::parsers::{parse_lsdb, parse_spf_log};
use crate::records::SpfEvent;
use crate::store::EventStore;

/// Runs the poller's tick loop until `running` is cleared. Intended to be
/// driven from a dedicated `tokio::spawn`ed task by the Lifecycle
/// Controller.
pub struct PeriodicPoller<E: NodeExec, C: SimClock> {
    gateway: Arc<Gateway<E>>,
    clock: Arc<C>,
    store: Arc<EventStore>,
    inventory: NodeInventory,
    config: CollectorConfig,
    spf_cmd: String,
    error_counts: tokio::sync::Mutex<HashMap<String, u32>>,
}

const RATE_LIMITED_LOG_THRESHOLD: u32 = 3;

impl<E: NodeExec + 'static, C: SimClock + 'static> PeriodicPoller<E, C> {
    pub fn new(
        gateway: Arc<Gateway<E>>,
        clock: Arc<C>,
        store: Arc<EventStore>,
        inventory: NodeInventory,
        config: CollectorConfig,
        spf_cmd: String,
    ) -> Self {
        PeriodicPoller {
            gateway,
            clock,
            store,
            inventory,
            config,
            spf_cmd,
            error_counts: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    async fn note_error(&self, node: &str, context: &str, detail: impl std::fmt::Display) {
        let mut counts = self.error_counts.lock().await;
        let entry = counts.entry(node.to_string()).or_insert(0);
        *entry += 1;
        if *entry <= RATE_LIMITED_LOG_THRESHOLD {
            log::warn!("{context} error on {node}: {detail}");
        }
    }

    /// Runs ticks until `running` is cleared. Ticks never overlap: if a
    /// tick exceeds `poll_interval_s`, the next tick starts immediately.
    pub async fn run(&self, running: Arc<AtomicBool>) {
        while running.load(Ordering::SeqCst) {
            self.spf_pass().await;
            self.lsp_pass().await;

            let deadline = tokio::time::Instant::now() + Duration::from_secs_f64(self.config.poll_interval_s);
            while tokio::time::Instant::now() < deadline {
                if !running.load(Ordering::SeqCst) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }

    /// SPF pass: all GS nodes plus a 1-in-`spf_sat_stride` satellite subset.
    async fn spf_pass(&self) {
        let sim_time = self.clock.now_s().await;
        let mut nodes: Vec<String> = self.inventory.ground_stations().to_vec();
        nodes.extend(self.inventory.satellite_subset(self.config.spf_sat_stride).into_iter().map(|s| format!("sat{s}")));

        let mut scope = unsafe { async_scoped::TokioScope::create() };
        for node_name in nodes {
            let gateway = self.gateway.clone();
            let spf_cmd = self.spf_cmd.clone();
            scope.spawn(async move {
                let node_id = parse_node_id(&node_name);
                let (output, ok) = gateway.exec(&node_id, &spf_cmd).await;
                (node_name, ok, output)
            });
        }
        let results = scope.collect().await;

        for result in results {
            let Ok((node_name, ok, output)) = result else { continue };
            if !ok || output.trim().is_empty() {
                if !ok {
                    self.note_error(&node_name, "SPF poll", "command timed out").await;
                }
                continue;
            }
            let entries = parse_spf_log(&output);
            let prev_count = self.store.spf_cursor_last_count(&node_name).await;
            if entries.len() > prev_count {
                for entry in &entries[prev_count..] {
                    self.store
                        .append_spf_event(SpfEvent {
                            sim_time_s: sim_time,
                            node: node_name.clone(),
                            duration_ms: entry.duration_ms,
                            trigger_text: entry.trigger.clone(),
                            when_text: entry.when.clone(),
                        })
                        .await;
                }
                self.store.set_spf_cursor_last_count(&node_name, entries.len()).await;
            }
        }
    }

    /// LSP pass: reference node baseline/delta detection, then a bounded
    /// one-round flood probe across the LSP node subset for any changes.
    async fn lsp_pass(&self) {
        let Some(ref_sat) = self.inventory.lsp_reference_node() else { return };
        let ref_node = format!("sat{ref_sat}");
        let ref_node_id = parse_node_id(&ref_node);
        let sim_time = self.clock.now_s().await;

        let (output, ok) = self.gateway.exec(&ref_node_id, "show isis database").await;
        if !ok || output.trim().is_empty() {
            if !ok {
                self.note_error(&ref_node, "LSP reference poll", "command timed out").await;
            }
            return;
        }
        let current: HashMap<String, String> = parse_lsdb(&output).into_iter().collect();
        if current.is_empty() {
            return;
        }

        if self.store.lsp_baseline_is_empty().await {
            let count = current.len();
            self.store.lsp_baseline_seed(current).await;
            log::info!("LSP baseline recorded: {count} LSPs");
            return;
        }

        let mut changed: Vec<(String, String)> = Vec::new();
        for (lsp_id, seq) in &current {
            let baseline_seq = self.store.lsp_baseline_get(lsp_id).await;
            if baseline_seq.as_deref() != Some(seq.as_str()) {
                changed.push((lsp_id.clone(), seq.clone()));
            }
        }
        if changed.is_empty() {
            return;
        }

        tokio::time::sleep(Duration::from_secs_f64(self.config.flood_probe_delay_s)).await;

        let mut check_nodes: Vec<String> = self
            .inventory
            .satellite_subset(self.config.lsp_sat_stride)
            .into_iter()
            .filter(|&s| s != ref_sat)
            .map(|s| format!("sat{s}"))
            .collect();
        check_nodes.extend(self.inventory.ground_stations().to_vec());

        let probe_start = tokio::time::Instant::now();
        for (lsp_id, seq) in changed {
            let mut propagation = std::collections::BTreeMap::new();
            for node_name in &check_nodes {
                let node_id = parse_node_id(node_name);
                let (out, ok) = self.gateway.exec(&node_id, "show isis database").await;
                let elapsed = probe_start.elapsed().as_secs_f64();
                if ok {
                    let node_lsps = parse_lsdb(&out);
                    if node_lsps.get(&lsp_id).map(String::as_str) == Some(seq.as_str()) {
                        propagation.insert(node_name.clone(), Some(elapsed));
                        continue;
                    }
                }
                propagation.insert(node_name.clone(), None);
            }

            self.store
                .append_lsp_measurement(crate::records::LspFloodingMeasurement {
                    sim_time_s: sim_time,
                    lsp_id: lsp_id.clone(),
                    sequence: seq.clone(),
                    origin_node: ref_node.clone(),
                    propagation,
                })
                .await;
            self.store.lsp_baseline_set(&lsp_id, &seq).await;
        }
    }
}

fn parse_node_id(name: &str) -> crate::node::NodeId {
    if let Some(num) = name.strip_prefix("sat").and_then(|s| s.parse::<u32>().ok()) {
        crate::node::NodeId::satellite(num)
    } else {
        crate::node::NodeId::ground_station(name.to_string())
    }
}
