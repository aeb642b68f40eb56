//! Node identity (C1 half of Clock & Identity).

use std::fmt;

/// A node participating in the constellation: either a satellite (identified
/// by its numeric id) or a ground station (identified by its string id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeId {
    Satellite(u32),
    GroundStation(String),
}

impl NodeId {
    pub fn satellite(id: u32) -> Self {
        NodeId::Satellite(id)
    }

    pub fn ground_station(id: impl Into<String>) -> Self {
        NodeId::GroundStation(id.into())
    }

    pub fn is_satellite(&self) -> bool {
        matches!(self, NodeId::Satellite(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Satellite(id) => write!(f, "sat{id}"),
            NodeId::GroundStation(id) => write!(f, "{id}"),
        }
    }
}

/// A fixed inventory of nodes known at start time, used to derive the
/// SPF/LSP polling subsets (C6) and to validate that records only reference
/// known nodes (data-model invariant 5).
#[derive(Debug, Clone, Default)]
pub struct NodeInventory {
    satellites: Vec<u32>,
    ground_stations: Vec<String>,
}

impl NodeInventory {
    pub fn new(mut satellites: Vec<u32>, mut ground_stations: Vec<String>) -> Self {
        satellites.sort_unstable();
        satellites.dedup();
        ground_stations.sort();
        ground_stations.dedup();
        NodeInventory {
            satellites,
            ground_stations,
        }
    }

    pub fn satellites(&self) -> &[u32] {
        &self.satellites
    }

    pub fn ground_stations(&self) -> &[String] {
        &self.ground_stations
    }

    pub fn all_node_ids(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.satellites.iter().map(|&s| NodeId::Satellite(s)).collect();
        out.extend(self.ground_stations.iter().cloned().map(NodeId::GroundStation));
        out
    }

    /// First satellite in sorted order, used as the LSP reference node.
    pub fn lsp_reference_node(&self) -> Option<u32> {
        self.satellites.first().copied()
    }

    /// Deterministic 1-in-`stride` satellite subset, by position in sorted order.
    pub fn satellite_subset(&self, stride: usize) -> Vec<u32> {
        if stride == 0 {
            return Vec::new();
        }
        self.satellites
            .iter()
            .enumerate()
            .filter(|(i, _)| i % stride == 0)
            .map(|(_, &s)| s)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn satellite_subset_strides_by_sorted_position() {
        let inv = NodeInventory::new(vec![7, 0, 3, 1, 2, 4, 5, 6], vec![]);
        assert_eq!(inv.satellite_subset(8), vec![0]);
        assert_eq!(inv.satellite_subset(4), vec![0, 4]);
    }

    #[test]
    fn lsp_reference_node_is_first_sorted_satellite() {
        let inv = NodeInventory::new(vec![5, 2, 9], vec![]);
        assert_eq!(inv.lsp_reference_node(), Some(2));
    }

    #[test]
    fn display_matches_original_naming() {
        assert_eq!(NodeId::satellite(3).to_string(), "sat3");
        assert_eq!(NodeId::ground_station("gs0").to_string(), "gs0");
    }
}
