//! Event Store (C4): thread-safe append-only collections plus the SPF
//! cursor and LSP baseline, per the single-mutex-per-kind design note in
//! §9 (data model invariants 1-3 hold by construction).

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::records::{ConvergenceRecord, InterruptionRecord, LspFloodingMeasurement, PacketLossRecord, SpfEvent};

/// Per-node count of SPF log entries already converted into `SpfEvent`s.
#[derive(Debug, Default, Clone)]
pub struct SpfCursor {
    last_count: HashMap<String, usize>,
}

impl SpfCursor {
    pub fn last_count(&self, node: &str) -> usize {
        self.last_count.get(node).copied().unwrap_or(0)
    }

    pub fn set_last_count(&mut self, node: &str, count: usize) {
        self.last_count.insert(node.to_string(), count);
    }
}

/// `lsp_id -> sequence` on the reference node. Empty until the first
/// successful poll seeds it.
#[derive(Debug, Default, Clone)]
pub struct LspBaseline {
    sequences: HashMap<String, String>,
}

impl LspBaseline {
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn get(&self, lsp_id: &str) -> Option<&String> {
        self.sequences.get(lsp_id)
    }

    pub fn seed(&mut self, current: HashMap<String, String>) {
        self.sequences = current;
    }

    pub fn set(&mut self, lsp_id: &str, sequence: &str) {
        self.sequences.insert(lsp_id.to_string(), sequence.to_string());
    }

    pub fn clear(&mut self) {
        self.sequences.clear();
    }
}

fn push_capped<T>(list: &mut Vec<T>, item: T, capacity: Option<usize>) {
    list.push(item);
    if let Some(cap) = capacity {
        if list.len() > cap {
            list.remove(0);
        }
    }
}

/// Append-only record collections behind one mutex each, and the
/// poller-only cursor/baseline state.
pub struct EventStore {
    capacity: Option<usize>,
    convergence: Mutex<Vec<ConvergenceRecord>>,
    packet_loss: Mutex<Vec<PacketLossRecord>>,
    interruptions: Mutex<Vec<InterruptionRecord>>,
    spf_events: Mutex<Vec<SpfEvent>>,
    lsp_measurements: Mutex<Vec<LspFloodingMeasurement>>,
    spf_cursor: Mutex<SpfCursor>,
    lsp_baseline: Mutex<LspBaseline>,
}

impl EventStore {
    pub fn new(capacity: Option<usize>) -> Self {
        EventStore {
            capacity,
            convergence: Mutex::new(Vec::new()),
            packet_loss: Mutex::new(Vec::new()),
            interruptions: Mutex::new(Vec::new()),
            spf_events: Mutex::new(Vec::new()),
            lsp_measurements: Mutex::new(Vec::new()),
            spf_cursor: Mutex::new(SpfCursor::default()),
            lsp_baseline: Mutex::new(LspBaseline::default()),
        }
    }

    /// Appends the three handover-task records atomically, per the "single
    /// critical section" ordering guarantee in §5.
    pub async fn record_handover_outcome(
        &self,
        convergence: ConvergenceRecord,
        loss: PacketLossRecord,
        interruption: InterruptionRecord,
    ) {
        let mut c = self.convergence.lock().await;
        let mut l = self.packet_loss.lock().await;
        let mut i = self.interruptions.lock().await;
        push_capped(&mut c, convergence, self.capacity);
        push_capped(&mut l, loss, self.capacity);
        push_capped(&mut i, interruption, self.capacity);
    }

    pub async fn record_connect_outcome(&self, convergence: ConvergenceRecord) {
        let mut c = self.convergence.lock().await;
        push_capped(&mut c, convergence, self.capacity);
    }

    pub async fn append_spf_event(&self, event: SpfEvent) {
        let mut events = self.spf_events.lock().await;
        push_capped(&mut events, event, self.capacity);
    }

    pub async fn append_lsp_measurement(&self, measurement: LspFloodingMeasurement) {
        let mut measurements = self.lsp_measurements.lock().await;
        push_capped(&mut measurements, measurement, self.capacity);
    }

    pub async fn spf_cursor_last_count(&self, node: &str) -> usize {
        self.spf_cursor.lock().await.last_count(node)
    }

    pub async fn set_spf_cursor_last_count(&self, node: &str, count: usize) {
        self.spf_cursor.lock().await.set_last_count(node, count);
    }

    pub async fn lsp_baseline_is_empty(&self) -> bool {
        self.lsp_baseline.lock().await.is_empty()
    }

    pub async fn lsp_baseline_get(&self, lsp_id: &str) -> Option<String> {
        self.lsp_baseline.lock().await.get(lsp_id).cloned()
    }

    pub async fn lsp_baseline_seed(&self, current: HashMap<String, String>) {
        self.lsp_baseline.lock().await.seed(current);
    }

    pub async fn lsp_baseline_set(&self, lsp_id: &str, sequence: &str) {
        self.lsp_baseline.lock().await.set(lsp_id, sequence);
    }

    pub async fn reset_lsp_baseline(&self) {
        self.lsp_baseline.lock().await.clear();
    }

    pub async fn convergence_events(&self) -> Vec<ConvergenceRecord> {
        self.convergence.lock().await.clone()
    }

    pub async fn packet_loss_events(&self) -> Vec<PacketLossRecord> {
        self.packet_loss.lock().await.clone()
    }

    pub async fn service_interruptions(&self) -> Vec<InterruptionRecord> {
        self.interruptions.lock().await.clone()
    }

    pub async fn spf_events(&self) -> Vec<SpfEvent> {
        self.spf_events.lock().await.clone()
    }

    pub async fn lsp_measurements(&self) -> Vec<LspFloodingMeasurement> {
        self.lsp_measurements.lock().await.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::records::Trigger;

    fn dummy_convergence() -> ConvergenceRecord {
        ConvergenceRecord {
            sim_time_s: 0.0,
            trigger: Trigger::Connect,
            gs_id: "gs0".into(),
            from_sat: None,
            to_sat: Some(1),
            adjacency_up_s: 1.0,
            route_present_s: 1.5,
            convergence_s: 1.5,
        }
    }

    #[tokio::test]
    async fn append_only_never_shrinks() {
        let store = EventStore::new(None);
        store.record_connect_outcome(dummy_convergence()).await;
        store.record_connect_outcome(dummy_convergence()).await;
        assert_eq!(store.convergence_events().await.len(), 2);
    }

    #[tokio::test]
    async fn capacity_drops_oldest() {
        let store = EventStore::new(Some(2));
        for _ in 0..5 {
            store.record_connect_outcome(dummy_convergence()).await;
        }
        assert_eq!(store.convergence_events().await.len(), 2);
    }

    #[tokio::test]
    async fn spf_cursor_tracks_per_node_counts() {
        let store = EventStore::new(None);
        assert_eq!(store.spf_cursor_last_count("sat0").await, 0);
        store.set_spf_cursor_last_count("sat0", 3).await;
        assert_eq!(store.spf_cursor_last_count("sat0").await, 3);
        assert_eq!(store.spf_cursor_last_count("sat1").await, 0);
    }

    #[tokio::test]
    async fn lsp_baseline_seeds_then_updates() {
        let store = EventStore::new(None);
        assert!(store.lsp_baseline_is_empty().await);
        let mut initial = HashMap::new();
        initial.insert("sat0.00-00".to_string(), "0x5".to_string());
        store.lsp_baseline_seed(initial).await;
        assert!(!store.lsp_baseline_is_empty().await);
        assert_eq!(store.lsp_baseline_get("sat0.00-00").await.as_deref(), Some("0x5"));
        store.lsp_baseline_set("sat0.00-00", "0x6").await;
        assert_eq!(store.lsp_baseline_get("sat0.00-00").await.as_deref(), Some("0x6"));
    }
}
