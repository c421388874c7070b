use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Inclusive block range bounding a log query. Invariant: `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    pub fn new(from: u64, to: u64) -> Self {
        debug_assert!(from <= to);
        Self { from, to }
    }

    /// Number of blocks covered beyond the starting block.
    pub fn span(&self) -> u64 {
        self.to - self.from
    }
}

/// One decoded `PairCreated` factory event.
#[derive(Debug, Clone)]
pub struct PairCreationEvent {
    pub token0: Address,
    pub token1: Address,
    pub pair: Address,
    pub block_number: u64,
    pub factory: Address,
}

/// One decoded ERC-20 `Transfer` event. Transient: only used to build
/// holder approximations, never persisted.
#[derive(Debug, Clone)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Scan request as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Target blockchain (e.g. "ethereum", "polygon").
    pub chain: String,
    /// AMM factory contracts to monitor.
    pub factories: Vec<Address>,
    /// Trailing time window to scan, in minutes. Must be positive.
    pub window_minutes: u64,
}

/// One enriched discovered pair. Constructed once per creation event,
/// immutable afterwards, held only for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRecord {
    pub pair_address: Address,
    pub tokens: [Address; 2],
    pub init_liquidity: String,
    pub top_holders: Vec<Address>,
    pub created_at: u64,
}

/// Successful scan response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub pairs: Vec<PairRecord>,
    pub count: usize,
    pub window_minutes: u64,
    pub scanned_factories: Vec<Address>,
}

/// Fatal-failure response shape. Callers always receive a well-formed
/// object; this is returned only when the whole pipeline cannot run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFailure {
    pub error: String,
    pub pairs: Vec<PairRecord>,
    pub count: usize,
}

impl ScanFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            pairs: Vec::new(),
            count: 0,
        }
    }
}

/// Top-level outcome of `scan_new_pairs`: either the full record set or
/// the fatal error shape. Serializes untagged so both arms match the
/// documented wire formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanOutcome {
    Ok(ScanResponse),
    Err(ScanFailure),
}

impl ScanOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ScanOutcome::Ok(_))
    }
}

/// Merges per-token holder lists into one deduplicated union, preserving
/// first-seen order across the concatenation and capping at `cap`.
pub fn merge_holder_lists(lists: &[Vec<Address>], cap: usize) -> Vec<Address> {
    let mut merged: Vec<Address> = Vec::with_capacity(cap);
    for list in lists {
        for &holder in list {
            if merged.len() >= cap {
                return merged;
            }
            if !merged.contains(&holder) {
                merged.push(holder);
            }
        }
    }
    merged
}
