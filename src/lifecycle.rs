//! Lifecycle Controller (C9), ported from the `ISISMetricsCollector` class:
//! start/stop, diagnostic gate, graceful drain of handover tasks, status
//! reporting.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tokio::time::Duration;

use crate::bus::{HandoverBus, HandoverNotification};
use crate::clock::SimClock;
use crate::config::CollectorConfig;
use crate::diagnostics::run_diagnostic;
use crate::error::CollectorError;
use crate::export::{self, MetricsSummary};
use crate::gateway::{Gateway, NodeExec};
use crate::handover::{run_handover_task, HandoverTaskParams, ReachabilityProbe};
use crate::node::NodeInventory;
use crate::peer::PeerLookup;
use crate::poller::PeriodicPoller;
use crate::records::{CapabilityReport, Trigger};
use crate::store::EventStore;

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub running: bool,
    pub capability: CapabilityReport,
    pub elapsed_s: f64,
    pub convergence_events: usize,
    pub packet_loss_events: usize,
    pub service_interruptions: usize,
    pub spf_events: usize,
    pub lsp_measurements: usize,
}

type HandoverTaskSet = Arc<Mutex<JoinSet<()>>>;

/// Orchestrates C2-C8 behind the four operator verbs. Generic over the four
/// external-collaborator traits so the host application supplies its own
/// transport, topology driver, and probe implementations.
pub struct Collector<E: NodeExec, B: HandoverBus, P: PeerLookup, R: ReachabilityProbe, C: SimClock> {
    gateway: Arc<Gateway<E>>,
    bus: Arc<B>,
    peer_lookup: Arc<P>,
    probe: Option<Arc<R>>,
    clock: Arc<C>,
    inventory: NodeInventory,
    config: CollectorConfig,
    store: Arc<EventStore>,

    running: Arc<AtomicBool>,
    start_wall: Mutex<Option<tokio::time::Instant>>,
    capability: RwLock<CapabilityReport>,
    poll_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    bus_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    handover_tasks: HandoverTaskSet,
}

impl<E, B, P, R, C> Collector<E, B, P, R, C>
where
    E: NodeExec + 'static,
    B: HandoverBus + 'static,
    P: PeerLookup + 'static,
    R: ReachabilityProbe + 'static,
    C: SimClock + 'static,
{
    pub fn new(
        gateway: Gateway<E>,
        bus: B,
        peer_lookup: P,
        probe: Option<R>,
        clock: C,
        inventory: NodeInventory,
        config: CollectorConfig,
    ) -> Self {
        Collector {
            gateway: Arc::new(gateway),
            bus: Arc::new(bus),
            peer_lookup: Arc::new(peer_lookup),
            probe: probe.map(Arc::new),
            clock: Arc::new(clock),
            inventory,
            config,
            store: Arc::new(EventStore::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            start_wall: Mutex::new(None),
            capability: RwLock::new(CapabilityReport::default()),
            poll_task: Mutex::new(None),
            bus_task: Mutex::new(None),
            handover_tasks: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    async fn spawn_handover(&self, params: HandoverTaskParams) {
        let gateway = self.gateway.clone();
        let peer_lookup = self.peer_lookup.clone();
        let probe = self.probe.clone();
        let store = self.store.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        let inventory = Arc::new(self.inventory.clone());
        self.handover_tasks.lock().await.spawn(async move {
            run_handover_task(params, gateway, peer_lookup, probe, store, config, running, inventory).await;
        });
    }

    /// Idempotent. Runs the diagnostic gate, then conditionally starts the
    /// Periodic Poller, and subscribes to the handover bus to spawn C7
    /// tasks per event.
    pub async fn start(&self) -> Result<(), CollectorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            log::info!("collector already running");
            return Ok(());
        }
        *self.start_wall.lock().await = Some(tokio::time::Instant::now());
        self.store.reset_lsp_baseline().await;

        let report = match run_diagnostic(&self.gateway, &self.inventory).await {
            Ok(report) => report,
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };
        *self.capability.write().await = report.clone();

        if !report.control_plane_ok {
            log::warn!("degraded start: control plane unavailable, poller disabled");
        } else if let Some(spf_cmd) = report.spf_cmd.clone() {
            let poller = PeriodicPoller::new(
                self.gateway.clone(),
                self.clock.clone(),
                self.store.clone(),
                self.inventory.clone(),
                self.config.clone(),
                spf_cmd,
            );
            let running = self.running.clone();
            let handle = tokio::spawn(async move {
                poller.run(running).await;
            });
            *self.poll_task.lock().await = Some(handle);
        } else {
            log::warn!("no SPF command available; SPF collection disabled, LSP collection also skipped");
        }

        let mut rx = self.bus.subscribe();
        let running = self.running.clone();
        let gateway = self.gateway.clone();
        let peer_lookup = self.peer_lookup.clone();
        let probe = self.probe.clone();
        let store = self.store.clone();
        let config = self.config.clone();
        let handover_tasks = self.handover_tasks.clone();
        let inventory = Arc::new(self.inventory.clone());

        let bus_handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let params = match notification {
                    HandoverNotification::Disconnect { gs_id, .. } => {
                        log::debug!("disconnect accepted for {gs_id}, no records produced");
                        continue;
                    }
                    HandoverNotification::Connect { gs_id, sat_id, sim_time_s } => {
                        log::info!("connect callback: {gs_id} -> sat{sat_id} at t={sim_time_s:.0}s");
                        HandoverTaskParams { gs_id, from_sat: None, to_sat: Some(sat_id), sim_time_s, trigger: Trigger::Connect }
                    }
                    HandoverNotification::Handover { gs_id, from_sat_id, to_sat_id, sim_time_s } => {
                        log::info!("handover callback: {gs_id} sat{from_sat_id}->sat{to_sat_id} at t={sim_time_s:.0}s");
                        HandoverTaskParams { gs_id, from_sat: Some(from_sat_id), to_sat: Some(to_sat_id), sim_time_s, trigger: Trigger::Handover }
                    }
                };
                let gateway = gateway.clone();
                let peer_lookup = peer_lookup.clone();
                let probe = probe.clone();
                let store = store.clone();
                let config = config.clone();
                let task_running = running.clone();
                let task_inventory = inventory.clone();
                handover_tasks.lock().await.spawn(async move {
                    run_handover_task(params, gateway, peer_lookup, probe, store, config, task_running, task_inventory).await;
                });
            }
        });
        *self.bus_task.lock().await = Some(bus_handle);

        log::info!("ISIS metrics collector started (poll every {}s)", self.config.poll_interval_s);
        Ok(())
    }

    /// Direct entry point for hosts that call back into the collector
    /// instead of going through the handover bus (kept for parity with the
    /// original `handover_callback`). If stopped, no-op.
    pub async fn handover_callback(&self, gs_id: String, from_sat: u32, to_sat: u32) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        let sim_time_s = self.clock.now_s().await;
        log::info!("handover callback: {gs_id} sat{from_sat}->sat{to_sat} at t={sim_time_s:.0}s");
        let params = HandoverTaskParams { gs_id, from_sat: Some(from_sat), to_sat: Some(to_sat), sim_time_s, trigger: Trigger::Handover };
        self.spawn_handover(params).await;
    }

    /// Direct entry point mirroring `connect_callback`. If stopped, no-op.
    pub async fn connect_callback(&self, gs_id: String, sat_id: u32) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        let sim_time_s = self.clock.now_s().await;
        log::info!("connect callback: {gs_id} -> sat{sat_id} at t={sim_time_s:.0}s");
        let params = HandoverTaskParams { gs_id, from_sat: None, to_sat: Some(sat_id), sim_time_s, trigger: Trigger::Connect };
        self.spawn_handover(params).await;
    }

    /// Sets the running flag false, joins the poll task (<=5s grace) and
    /// outstanding C7 tasks (<=2s grace, drained in parallel), then returns
    /// with the collections effectively frozen (no writers remain).
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.poll_task.lock().await.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        if let Some(handle) = self.bus_task.lock().await.take() {
            handle.abort();
        }

        let mut tasks = self.handover_tasks.lock().await;
        let _ = tokio::time::timeout(Duration::from_secs(2), async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        tasks.shutdown().await;

        log::info!("ISIS metrics collector stopped");
    }

    pub async fn status(&self) -> StatusReport {
        let elapsed_s = match *self.start_wall.lock().await {
            Some(start) => start.elapsed().as_secs_f64(),
            None => 0.0,
        };
        StatusReport {
            running: self.running.load(Ordering::SeqCst),
            capability: self.capability.read().await.clone(),
            elapsed_s,
            convergence_events: self.store.convergence_events().await.len(),
            packet_loss_events: self.store.packet_loss_events().await.len(),
            service_interruptions: self.store.service_interruptions().await.len(),
            spf_events: self.store.spf_events().await.len(),
            lsp_measurements: self.store.lsp_measurements().await.len(),
        }
    }

    pub async fn summary(&self) -> MetricsSummary {
        let elapsed_s = match *self.start_wall.lock().await {
            Some(start) => start.elapsed().as_secs_f64(),
            None => 0.0,
        };
        export::build_summary(&self.store, elapsed_s).await
    }

    pub async fn export(&self, path: PathBuf, export_time: String) -> Result<(), CollectorError> {
        let elapsed_s = match *self.start_wall.lock().await {
            Some(start) => start.elapsed().as_secs_f64(),
            None => 0.0,
        };
        export::export_json(&self.store, elapsed_s, export_time, &path).await
    }
}
