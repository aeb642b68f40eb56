//! Tunable parameters for the collector, with the defaults from the original
//! emulation harness.

/// Constructor-overridable knobs for the collector. All fields carry the
/// defaults the original emulation used; callers typically start from
/// [`CollectorConfig::default`] and override only what they need.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Tick interval of the Periodic Poller.
    pub poll_interval_s: f64,
    /// Delay between detecting an LSDB change and probing other nodes for it.
    pub flood_probe_delay_s: f64,
    /// Hard budget for a single handover/connect measurement task.
    pub handover_timeout_s: f64,
    /// Per-`exec` call timeout on the Node Command Gateway.
    pub command_timeout_s: f64,
    /// Interval between adjacency/route polls inside a handover task.
    pub adj_poll_interval_s: f64,
    /// Interval between reachability probes inside a handover task.
    pub probe_interval_s: f64,
    /// Poll every Nth satellite (by sorted id) for SPF logs.
    pub spf_sat_stride: usize,
    /// Poll every Nth satellite (by sorted id) for LSP flooding checks.
    pub lsp_sat_stride: usize,
    /// Window after a `first_ok_after_gap` candidate within which a failure
    /// resets the candidate (open question (a)).
    pub first_ok_reset_window_s: f64,
    /// High watermark per record kind before oldest entries are dropped.
    /// `None` means unbounded, matching the documented default.
    pub event_store_capacity: Option<usize>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            poll_interval_s: 2.0,
            flood_probe_delay_s: 0.5,
            handover_timeout_s: 30.0,
            command_timeout_s: 5.0,
            adj_poll_interval_s: 0.5,
            probe_interval_s: 0.1,
            spf_sat_stride: 8,
            lsp_sat_stride: 4,
            first_ok_reset_window_s: 0.5,
            event_store_capacity: None,
        }
    }
}

impl CollectorConfig {
    pub fn with_poll_interval_s(mut self, v: f64) -> Self {
        self.poll_interval_s = v;
        self
    }

    pub fn with_handover_timeout_s(mut self, v: f64) -> Self {
        self.handover_timeout_s = v;
        self
    }

    pub fn with_command_timeout_s(mut self, v: f64) -> Self {
        self.command_timeout_s = v;
        self
    }

    pub fn with_event_store_capacity(mut self, v: Option<usize>) -> Self {
        self.event_store_capacity = v;
        self
    }

    /// Load overrides from a TOML document, keeping any field not present
    /// at its `Default` value.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = CollectorConfig::default();
        assert_eq!(cfg.poll_interval_s, 2.0);
        assert_eq!(cfg.flood_probe_delay_s, 0.5);
        assert_eq!(cfg.handover_timeout_s, 30.0);
        assert_eq!(cfg.command_timeout_s, 5.0);
        assert_eq!(cfg.adj_poll_interval_s, 0.5);
        assert_eq!(cfg.probe_interval_s, 0.1);
        assert_eq!(cfg.spf_sat_stride, 8);
        assert_eq!(cfg.lsp_sat_stride, 4);
        assert_eq!(cfg.first_ok_reset_window_s, 0.5);
        assert_eq!(cfg.event_store_capacity, None);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = CollectorConfig::from_toml_str("poll_interval_s = 5.0\n").unwrap();
        assert_eq!(cfg.poll_interval_s, 5.0);
        assert_eq!(cfg.handover_timeout_s, 30.0);
    }
}
