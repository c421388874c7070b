use std::time::Duration;

use thiserror::Error;

/// Failure taxonomy for the scan pipeline.
///
/// Most call sites never propagate these past a component boundary: the
/// component contract already defines a degraded value for every failure
/// mode ("0, 0" liquidity, empty holder list, wall-clock timestamp). Only
/// `FatalRange` reaches the caller, because no block range means no scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Transport error, revert, or malformed RPC response.
    #[error("rpc failure during {operation}: {message}")]
    Rpc { operation: &'static str, message: String },

    /// A bounded operation exceeded its per-stage deadline.
    #[error("{operation} timed out after {bound:?}")]
    Timeout { operation: &'static str, bound: Duration },

    /// A decoded log was missing required indexed/data fields.
    #[error("malformed {event} log entry, dropped")]
    MalformedEvent { event: &'static str },

    /// Current block height (or endpoint resolution) failed, so no range
    /// can be computed. Aborts the whole request.
    #[error("failed to resolve block range: {0}")]
    FatalRange(String),
}

impl ScanError {
    pub fn rpc(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Rpc {
            operation,
            message: err.to_string(),
        }
    }

    pub fn timeout(operation: &'static str, bound: Duration) -> Self {
        Self::Timeout { operation, bound }
    }
}
