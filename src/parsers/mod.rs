//! Output Parsers (C3): pure `text -> records` functions with no side
//! effects, hardened against format drift per the original FRR/vtysh
//! output quirks.

pub mod lsdb;
pub mod neighbor;
pub mod route;
pub mod spf;

pub use lsdb::{parse_lsdb, LsdbEntry};
pub use neighbor::adjacency_up;
pub use route::route_present;
pub use spf::{parse_spf_log, SpfLogEntry};
