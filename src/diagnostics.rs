//! Diagnostic Prober (C5): run once on `start`, select the commands the
//! deployment actually supports, ported from `_run_diagnostic`'s
//! candidate-iteration structure (socket/PID-file checks are collapsed
//! into a single `NodeExec` boundary call since the real transport is out
//! of scope here; see SPEC_FULL.md §4.3).

use crate::error::CollectorError;
use crate::gateway::{Gateway, NodeExec};
use crate::node::{NodeId, NodeInventory};
use crate::parsers::{parse_lsdb, parse_spf_log};
use crate::records::CapabilityReport;

const NEIGHBOR_CMD: &str = "show isis neighbor";
const ROUTE_CMD: &str = "show ip route isis";
const LSDB_CMD: &str = "show isis database";
const SPF_CANDIDATES: &[&str] = &["show isis spf-log", "show isis spf-log level-2", "show isis summary"];

/// Picks one live node (preferring a satellite) and probes neighbor, SPF,
/// and LSDB commands against it, short-circuiting the SPF search on the
/// first candidate that yields at least one parsed entry.
///
/// An empty `inventory` (no satellites, no ground stations) is a distinct
/// failure from a populated inventory whose probe node is simply
/// unreachable: the former means there is nothing to collect from, ever,
/// and is reported as `Err`; the latter is a degraded-but-running start and
/// comes back as `Ok` with `control_plane_ok: false`.
pub async fn run_diagnostic<E: NodeExec>(gateway: &Gateway<E>, inventory: &NodeInventory) -> Result<CapabilityReport, CollectorError> {
    let mut report = CapabilityReport::default();

    let probe_node = inventory
        .satellites()
        .first()
        .map(|&s| NodeId::satellite(s))
        .or_else(|| inventory.ground_stations().first().map(|g| NodeId::ground_station(g.clone())));

    let Some(probe_node) = probe_node else {
        return Err(CollectorError::Start("no live nodes: inventory has no satellites or ground stations".to_string()));
    };

    let (neighbor_output, ok) = gateway.exec(&probe_node, NEIGHBOR_CMD).await;
    if !ok || neighbor_output.trim().is_empty() {
        log::warn!("diagnostic: control plane unavailable on {probe_node}");
        return Ok(report);
    }
    report.control_plane_ok = true;
    report.neighbor_cmd = Some(NEIGHBOR_CMD.to_string());
    report.route_cmd = Some(ROUTE_CMD.to_string());

    for candidate in SPF_CANDIDATES {
        let (output, ok) = gateway.exec(&probe_node, candidate).await;
        if !ok {
            continue;
        }
        if !parse_spf_log(&output).is_empty() {
            report.spf_cmd = Some(candidate.to_string());
            log::info!("diagnostic: using '{candidate}' for SPF collection");
            break;
        }
    }
    if report.spf_cmd.is_none() {
        log::warn!("diagnostic: no SPF log command available, SPF collection disabled");
    }

    let (lsdb_output, ok) = gateway.exec(&probe_node, LSDB_CMD).await;
    if ok && !parse_lsdb(&lsdb_output).is_empty() {
        report.lsdb_cmd = Some(LSDB_CMD.to_string());
    } else {
        log::warn!("diagnostic: LSDB command yielded no parsed entries on {probe_node}");
    }

    Ok(report)
}
