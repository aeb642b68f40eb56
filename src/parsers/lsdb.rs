//! LSDB parser, ported from `_parse_lsp_database`.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    // "sat0.00-00           *    452  0x00000005  0xabcd     720    0/0/0"
    // "sat1.00-00                320  0x00000003  0x1234     718    0/0/0"
    static ref LSP_LINE: Regex = Regex::new(r"^\s*(\S+\.00-\d+)\s+\*?\s+\d+\s+(0x[0-9a-fA-F]+)").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct LsdbEntry {
    pub lsp_id: String,
    pub sequence: String,
}

/// Parses `show isis database` output into `lsp_id -> sequence`. Header,
/// area, and title lines are skipped; unrecognised lines are ignored.
pub fn parse_lsdb(output: &str) -> BTreeMap<String, String> {
    let mut lsps = BTreeMap::new();
    for line in output.trim().lines() {
        let stripped = line.trim();
        if stripped.is_empty()
            || stripped.starts_with("Area")
            || stripped.starts_with("IS-IS")
            || stripped.starts_with("LSP")
        {
            continue;
        }
        if let Some(caps) = LSP_LINE.captures(line) {
            lsps.insert(caps[1].to_string(), caps[2].to_string());
        }
    }
    lsps
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_lsp_lines_with_and_without_asterisk() {
        let output = "Area 49.0001:\nIS-IS Level-2 link-state database:\nLSP ID                  PduLen  SeqNumber   Chksum  Holdtime  ATT/P/OL\nsat0.00-00           *    452  0x00000005  0xabcd     720    0/0/0\nsat1.00-00                320  0x00000003  0x1234     718    0/0/0\n";
        let lsps = parse_lsdb(output);
        assert_eq!(lsps.get("sat0.00-00").map(String::as_str), Some("0x00000005"));
        assert_eq!(lsps.get("sat1.00-00").map(String::as_str), Some("0x00000003"));
        assert_eq!(lsps.len(), 2);
    }

    #[test]
    fn empty_output_yields_empty_map() {
        assert!(parse_lsdb("").is_empty());
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert!(parse_lsdb("not an lsp line at all\n").is_empty());
    }
}
