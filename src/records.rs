//! Data model (§3): one explicit struct per record kind, each
//! `Serialize`/`Deserialize` for the export artifact.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Handover,
    Connect,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConvergenceRecord {
    pub sim_time_s: f64,
    pub trigger: Trigger,
    pub gs_id: String,
    pub from_sat: Option<u32>,
    pub to_sat: Option<u32>,
    pub adjacency_up_s: f64,
    pub route_present_s: f64,
    pub convergence_s: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PacketLossRecord {
    pub sim_time_s: f64,
    pub gs_id: String,
    pub from_sat: Option<u32>,
    pub to_sat: Option<u32>,
    pub sent: u64,
    pub received: u64,
    pub lost: u64,
    pub loss_pct: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InterruptionRecord {
    pub sim_time_s: f64,
    pub gs_id: String,
    pub last_ok_s: f64,
    pub first_ok_s: f64,
    pub interruption_s: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpfEvent {
    pub sim_time_s: f64,
    pub node: String,
    pub duration_ms: f64,
    pub trigger_text: String,
    pub when_text: String,
}

/// `seconds_or_missing`: `Some(seconds)` if the node carried the new
/// sequence at probe time, `None` ("not-yet-propagated") otherwise.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LspFloodingMeasurement {
    pub sim_time_s: f64,
    pub lsp_id: String,
    pub sequence: String,
    pub origin_node: String,
    pub propagation: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CapabilityReport {
    pub spf_cmd: Option<String>,
    pub lsdb_cmd: Option<String>,
    pub neighbor_cmd: Option<String>,
    pub route_cmd: Option<String>,
    pub control_plane_ok: bool,
}
