//! Library-boundary errors. Per the propagation policy, only `start` and
//! `export` failures ever surface as a `Result::Err`; every other failure
//! kind (transient node errors, parse failures, measurement timeouts) is
//! recovered locally and logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("collector failed to start: {0}")]
    Start(String),

    #[error("failed to write export artifact")]
    Export(#[from] std::io::Error),

    #[error("failed to serialize export artifact")]
    Serialize(#[from] serde_json::Error),
}
