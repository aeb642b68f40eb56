//! SPF log parser, ported line-for-line from the three formats the original
//! collector tolerated across FRR versions.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "   1    00:00:10 ago  topology change"
    static ref FORMAT_1: Regex = Regex::new(r"^\s*(\d+)\s+(\d+:\d+:\d+\s+ago)\s+(.*)$").unwrap();
    // "2025-01-01T... 1 5 topology change" (timestamp, duration, nodes, trigger)
    static ref FORMAT_2: Regex = Regex::new(r"^\s*\d{4}-\d{2}-\d{2}T\S+\s+(\d+)\s+\d+\s+(.*)$").unwrap();
    // "   1    5  topology change" (duration, nodes, trigger; no timestamp/ago)
    static ref FORMAT_3: Regex = Regex::new(r"^\s*(\d+)\s+\d+\s+(.*\S)$").unwrap();
}

/// One parsed line from `show isis spf-log` (or an equivalent candidate
/// command). `when` is empty for formats that carry no human-readable
/// relative timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SpfLogEntry {
    pub duration_ms: f64,
    pub when: String,
    pub trigger: String,
}

/// Parses `output` into SPF log entries, trying each known line shape in
/// order and ignoring lines that match none of them. Never panics on
/// malformed input.
pub fn parse_spf_log(output: &str) -> Vec<SpfLogEntry> {
    let mut entries = Vec::new();
    for line in output.trim().lines() {
        if let Some(caps) = FORMAT_1.captures(line) {
            let duration_ms = match caps[1].parse::<f64>() {
                Ok(d) => d,
                Err(_) => continue,
            };
            entries.push(SpfLogEntry {
                duration_ms,
                when: caps[2].trim().to_string(),
                trigger: caps[3].trim().to_string(),
            });
            continue;
        }

        if let Some(caps) = FORMAT_2.captures(line) {
            let duration_ms = match caps[1].parse::<f64>() {
                Ok(d) => d,
                Err(_) => continue,
            };
            entries.push(SpfLogEntry {
                duration_ms,
                when: String::new(),
                trigger: caps[2].trim().to_string(),
            });
            continue;
        }

        let trimmed = line.trim();
        if trimmed.starts_with("Duration") || trimmed.starts_with("Level") {
            continue;
        }
        if let Some(caps) = FORMAT_3.captures(line) {
            let duration_ms = match caps[1].parse::<f64>() {
                Ok(d) => d,
                Err(_) => continue,
            };
            entries.push(SpfLogEntry {
                duration_ms,
                when: String::new(),
                trigger: caps[2].trim().to_string(),
            });
        }
    }
    entries
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_line(line: &str) -> Vec<SpfLogEntry> {
        parse_spf_log(line)
    }

    #[test]
    fn parses_relative_ago_format() {
        let entries = test_line("      1    00:00:10 ago  topology change");
        assert_eq!(
            entries,
            vec![SpfLogEntry { duration_ms: 1.0, when: "00:00:10 ago".into(), trigger: "topology change".into() }]
        );
    }

    #[test]
    fn parses_timestamp_format() {
        let entries = test_line("2025-01-01T12:00:00.123456  1 5 topology change");
        assert_eq!(
            entries,
            vec![SpfLogEntry { duration_ms: 1.0, when: String::new(), trigger: "topology change".into() }]
        );
    }

    #[test]
    fn parses_bare_duration_nodes_trigger() {
        let entries = test_line("   0    5  periodic");
        assert_eq!(
            entries,
            vec![SpfLogEntry { duration_ms: 0.0, when: String::new(), trigger: "periodic".into() }]
        );
    }

    #[test]
    fn skips_header_and_unrecognised_lines() {
        let output = "Area 49.0001:\nLevel 2 SPF:\nDuration (msec)    When         Trigger\ngarbage line with no digits\n";
        assert!(test_line(output).is_empty());
    }

    #[test]
    fn ignores_malformed_lines_without_panicking() {
        let output = "\u{0}\u{0}\u{0}not even close\n   garbled   ";
        assert!(test_line(output).is_empty());
    }

    #[test]
    fn parses_multiple_lines_preserving_order() {
        let output = "      1    00:00:10 ago  topology change\n      0    00:00:05 ago  periodic\n";
        let entries = test_line(output);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].trigger, "topology change");
        assert_eq!(entries[1].trigger, "periodic");
    }
}
