//! Route-table parser: "route present" is inferred from a protocol-tagged
//! route line carrying a dotted-quad, matching the original's
//! `re.search(r'I\s+\d+\.\d+\.\d+\.\d+', route_output)` check.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PROTOCOL_ROUTE: Regex = Regex::new(r"I\s+\d+\.\d+\.\d+\.\d+").unwrap();
}

/// True if `output` contains at least one ISIS-tagged route line.
pub fn route_present(output: &str) -> bool {
    PROTOCOL_ROUTE.is_match(output)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn detects_protocol_tagged_route() {
        let output = "Codes: K - kernel route, C - connected, I - ISIS\nI   10.0.2.0/30 [115/20] via 10.0.1.2, eth0, 00:00:05\n";
        assert!(route_present(output));
    }

    #[test]
    fn absent_without_protocol_marker() {
        let output = "Codes: K - kernel route, C - connected\nC   10.0.2.0/30 is directly connected, eth0\n";
        assert!(!route_present(output));
    }

    #[test]
    fn empty_output_has_no_route() {
        assert!(!route_present(""));
    }
}
