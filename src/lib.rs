//! # Fresh Markets Watch
//!
//! Observes a blockchain network for newly created AMM trading pairs
//! within a trailing time window, then enriches each discovered pair with
//! its initial liquidity and a best-effort list of top token holders,
//! under strict latency budgets.
//!
//! ## Overview
//!
//! The pipeline is stateless per request:
//!
//! 1. **ChainClock** turns the requested window into a block range using
//!    a per-chain average block-production rate.
//! 2. **LogScanner** fetches and decodes `PairCreated` factory events in
//!    that range, dropping malformed entries instead of failing.
//! 3. For each discovered pair, the **liquidity snapshot** and the
//!    **holder approximation** run concurrently, each bounded by its own
//!    timeout and degrading to a documented default on any failure.
//! 4. Records are sorted newest-first and returned with the echoed
//!    request parameters.
//!
//! Holder ranking is explicitly approximate: it is derived from recent
//! Transfer events (plus optional live balance confirmation), not from an
//! authoritative balance audit.
//!
//! ## Degradation policy
//!
//! Partial data beats errors. A broken pair yields `"0, 0"` liquidity, a
//! dead holder source yields an empty list, a missing creation block
//! falls back to the wall clock. Only failing to resolve the current
//! block height aborts a request, surfacing the documented error shape.

// Core Types
/// Request/response shapes and intermediate event types
pub mod types;
/// Failure taxonomy
pub mod error;

// Discovery & Enrichment
/// Window-to-block-range derivation
pub mod chain_clock;
/// Filtered-log queries and event decoding
pub mod log_scanner;
/// Initial-liquidity snapshots
pub mod liquidity;
/// Approximate top-holder ranking
pub mod holders;
/// Pipeline orchestration and the scan entry point
pub mod pipeline;

// Infrastructure
/// Chain-to-endpoint resolution and provider construction
pub mod rpc;
/// Configuration management
pub mod settings;

// Contracts (Public ABIs Only)
/// Smart contract ABIs (read-only)
pub mod contracts;

// Re-exports for convenience
pub use error::ScanError;
pub use pipeline::{scan_new_pairs, PairScanner};
pub use settings::Settings;
pub use types::{PairRecord, ScanOutcome, ScanRequest, ScanResponse};
