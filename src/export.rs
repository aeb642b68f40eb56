//! Summariser & Exporter (C8), ported from `_build_summary`/`export_json`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CollectorError;
use crate::records::{ConvergenceRecord, InterruptionRecord, LspFloodingMeasurement, PacketLossRecord, SpfEvent};
use crate::store::EventStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_handovers: usize,
    pub avg_convergence_s: f64,
    pub max_convergence_s: f64,
    pub min_convergence_s: f64,
    pub avg_packet_loss_pct: f64,
    pub avg_interruption_s: f64,
    pub max_interruption_s: f64,
    pub total_spf_events: usize,
    pub avg_spf_duration_ms: f64,
    pub total_lsp_measurements: usize,
    pub avg_lsp_propagation_s: f64,
    pub collection_duration_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub export_time: String,
    pub collection_duration_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub metadata: ExportMetadata,
    pub summary: MetricsSummary,
    pub convergence_events: Vec<ConvergenceRecord>,
    pub packet_loss_events: Vec<PacketLossRecord>,
    pub service_interruptions: Vec<InterruptionRecord>,
    pub spf_events: Vec<SpfEvent>,
    pub lsp_measurements: Vec<LspFloodingMeasurement>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Builds an aggregated summary over the current (frozen or live) contents
/// of `store`.
pub async fn build_summary(store: &EventStore, collection_duration_s: f64) -> MetricsSummary {
    let convergence = store.convergence_events().await;
    let loss = store.packet_loss_events().await;
    let interruptions = store.service_interruptions().await;
    let spf_events = store.spf_events().await;
    let lsp_measurements = store.lsp_measurements().await;

    summarize(&convergence, &loss, &interruptions, &spf_events, &lsp_measurements, collection_duration_s)
}

/// Pure aggregation over already-fetched record lists, also used by
/// `load_json` to recompute a summary for the round-trip test (P6).
pub fn summarize(
    convergence: &[ConvergenceRecord],
    loss: &[PacketLossRecord],
    interruptions: &[InterruptionRecord],
    spf_events: &[SpfEvent],
    lsp_measurements: &[LspFloodingMeasurement],
    collection_duration_s: f64,
) -> MetricsSummary {
    let mut summary = MetricsSummary { collection_duration_s, ..Default::default() };

    summary.total_handovers = convergence.len();
    if !convergence.is_empty() {
        let times: Vec<f64> = convergence.iter().map(|e| e.convergence_s).collect();
        summary.avg_convergence_s = mean(&times);
        summary.min_convergence_s = times.iter().cloned().fold(f64::INFINITY, f64::min);
        summary.max_convergence_s = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    }

    if !loss.is_empty() {
        let losses: Vec<f64> = loss.iter().map(|e| e.loss_pct).collect();
        summary.avg_packet_loss_pct = mean(&losses);
    }

    if !interruptions.is_empty() {
        let ints: Vec<f64> = interruptions.iter().map(|e| e.interruption_s).collect();
        summary.avg_interruption_s = mean(&ints);
        summary.max_interruption_s = ints.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    }

    summary.total_spf_events = spf_events.len();
    if !spf_events.is_empty() {
        let durations: Vec<f64> = spf_events.iter().map(|e| e.duration_ms).collect();
        summary.avg_spf_duration_ms = mean(&durations);
    }

    summary.total_lsp_measurements = lsp_measurements.len();
    if !lsp_measurements.is_empty() {
        let per_measurement_means: Vec<f64> = lsp_measurements
            .iter()
            .filter_map(|m| {
                let valid: Vec<f64> = m.propagation.values().filter_map(|v| *v).collect();
                if valid.is_empty() {
                    None
                } else {
                    Some(mean(&valid))
                }
            })
            .collect();
        if !per_measurement_means.is_empty() {
            summary.avg_lsp_propagation_s = mean(&per_measurement_means);
        }
    }

    summary
}

/// Writes the full export artifact to `path`, round-trippable via
/// `load_json`.
pub async fn export_json(
    store: &EventStore,
    collection_duration_s: f64,
    export_time: String,
    path: &Path,
) -> Result<(), CollectorError> {
    let summary = build_summary(store, collection_duration_s).await;
    let artifact = ExportArtifact {
        metadata: ExportMetadata { export_time, collection_duration_s },
        summary,
        convergence_events: store.convergence_events().await,
        packet_loss_events: store.packet_loss_events().await,
        service_interruptions: store.service_interruptions().await,
        spf_events: store.spf_events().await,
        lsp_measurements: store.lsp_measurements().await,
    };
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &artifact)?;
    Ok(())
}

pub fn load_json(path: &Path) -> Result<ExportArtifact, CollectorError> {
    let file = std::fs::File::open(path)?;
    let artifact: ExportArtifact = serde_json::from_reader(file)?;
    Ok(artifact)
}

/// Default export filename, matching `isis_metrics_<timestamp>.json`.
pub fn default_export_filename(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    format!("isis_metrics_{}.json", timestamp.format("%Y-%m-%dT%H-%M-%S"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::records::Trigger;
    use std::collections::BTreeMap;

    fn convergence(c: f64) -> ConvergenceRecord {
        ConvergenceRecord {
            sim_time_s: 0.0,
            trigger: Trigger::Handover,
            gs_id: "gs0".into(),
            from_sat: Some(1),
            to_sat: Some(2),
            adjacency_up_s: c,
            route_present_s: c,
            convergence_s: c,
        }
    }

    #[test]
    fn summary_aggregates_convergence_min_max_avg() {
        let events = vec![convergence(1.0), convergence(2.0), convergence(3.0)];
        let summary = summarize(&events, &[], &[], &[], &[], 10.0);
        assert_eq!(summary.total_handovers, 3);
        assert_eq!(summary.min_convergence_s, 1.0);
        assert_eq!(summary.max_convergence_s, 3.0);
        assert!((summary.avg_convergence_s - 2.0).abs() < 1e-9);
    }

    #[test]
    fn lsp_propagation_ignores_not_yet_propagated_markers() {
        let mut propagation = BTreeMap::new();
        propagation.insert("gs0".to_string(), Some(0.1));
        propagation.insert("gs1".to_string(), Some(0.3));
        propagation.insert("sat2".to_string(), None);
        let measurement = LspFloodingMeasurement {
            sim_time_s: 0.0,
            lsp_id: "sat0.00-00".into(),
            sequence: "0x6".into(),
            origin_node: "sat0".into(),
            propagation,
        };
        let summary = summarize(&[], &[], &[], &[], &[measurement], 0.0);
        assert!((summary.avg_lsp_propagation_s - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn export_then_load_round_trips_summary() {
        let store = EventStore::new(None);
        store.record_connect_outcome(convergence(1.5)).await;
        let dir = std::env::temp_dir();
        let path = dir.join(format!("isis-metrics-test-{}.json", std::process::id()));

        export_json(&store, 5.0, "2026-08-01T00:00:00Z".to_string(), &path).await.unwrap();
        let loaded = load_json(&path).unwrap();
        let live = build_summary(&store, 5.0).await;
        assert_eq!(loaded.summary, live);

        std::fs::remove_file(&path).ok();
    }
}
