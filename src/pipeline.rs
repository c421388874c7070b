//! Pair-discovery and enrichment pipeline.
//!
//! One request flows range computation -> factory log scans -> per-event
//! concurrent enrichment (creation timestamp, liquidity snapshot, holder
//! approximation, each under its own timeout) -> newest-first sort. The
//! pipeline is stateless between calls; failures degrade per component
//! contract, and only a current-height failure aborts the request. There
//! is no overall request deadline beyond the per-stage bounds; callers
//! wanting one can wrap `scan_new_pairs` in `tokio::time::timeout`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::Middleware;
use ethers::types::Address;
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::chain_clock::{block_range_for_window, ChainProfile};
use crate::error::ScanError;
use crate::holders::top_holders;
use crate::liquidity::{snapshot, LIQUIDITY_SENTINEL};
use crate::log_scanner::scan_pair_created;
use crate::rpc::provider_for_chain;
use crate::settings::Settings;
use crate::types::{
    merge_holder_lists, BlockRange, PairCreationEvent, PairRecord, ScanFailure, ScanOutcome,
    ScanRequest, ScanResponse,
};

/// Scans one chain for freshly created pairs and enriches them.
///
/// Generic over the middleware so tests can substitute a mocked provider.
pub struct PairScanner<M> {
    provider: Arc<M>,
    settings: Arc<Settings>,
}

impl<M: Middleware + 'static> PairScanner<M> {
    pub fn new(provider: Arc<M>, settings: Arc<Settings>) -> Self {
        Self { provider, settings }
    }

    /// Runs the full pipeline. The only fatal failure is being unable to
    /// resolve the current block height (no range means no scan); a
    /// failing factory is logged and skipped, and every per-pair
    /// sub-fetch degrades to its documented default.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanResponse, ScanError> {
        if request.window_minutes == 0 {
            return Err(ScanError::FatalRange(
                "window_minutes must be positive".to_string(),
            ));
        }

        let profile = ChainProfile::resolve(&self.settings, &request.chain);
        let current_height = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| {
                ScanError::FatalRange(format!("failed to resolve current block height: {}", e))
            })?
            .as_u64();

        let range = block_range_for_window(&profile, request.window_minutes, current_height);
        info!(
            "Scanning chain {} blocks [{}, {}] ({} factories, window {}m)",
            profile.chain,
            range.from,
            range.to,
            request.factories.len(),
            request.window_minutes
        );

        let scans = join_all(
            request
                .factories
                .iter()
                .map(|&factory| scan_pair_created(self.provider.as_ref(), factory, range)),
        )
        .await;

        let mut events: Vec<PairCreationEvent> = Vec::new();
        for (factory, result) in request.factories.iter().zip(scans) {
            match result {
                Ok(mut factory_events) => events.append(&mut factory_events),
                // Recoverable at the factory level: skip and keep going.
                Err(e) => warn!("Skipping factory {:?}: {}", factory, e),
            }
        }

        let mut records: Vec<PairRecord> =
            join_all(events.iter().map(|event| self.enrich(event, range))).await;

        sort_newest_first(&mut records);

        Ok(ScanResponse {
            count: records.len(),
            pairs: records,
            window_minutes: request.window_minutes,
            scanned_factories: request.factories.clone(),
        })
    }

    /// Enriches one creation event. The three sub-fetches are independent
    /// and run concurrently, each racing its own timer; a timeout only
    /// degrades that sub-result.
    async fn enrich(&self, event: &PairCreationEvent, range: BlockRange) -> PairRecord {
        let timeouts = &self.settings.timeouts;

        let (created_at, init_liquidity, top_holders) = tokio::join!(
            bounded(
                "block timestamp lookup",
                timeouts.block_timestamp(),
                self.creation_timestamp(event),
                None,
            ),
            bounded(
                "liquidity lookup",
                timeouts.liquidity(),
                snapshot(self.provider.clone(), event.pair),
                LIQUIDITY_SENTINEL.to_string(),
            ),
            bounded(
                "holder lookup",
                timeouts.holders(),
                self.pair_holders(event, range),
                Vec::new(),
            ),
        );

        PairRecord {
            pair_address: event.pair,
            tokens: [event.token0, event.token1],
            init_liquidity,
            top_holders,
            created_at: created_at.unwrap_or_else(now_unix),
        }
    }

    /// Shapes the scan result into the documented wire outcome: the full
    /// record set, or `{error, pairs: [], count: 0}` on fatal failure.
    pub async fn scan_to_outcome(&self, request: &ScanRequest) -> ScanOutcome {
        match self.scan(request).await {
            Ok(response) => ScanOutcome::Ok(response),
            Err(e) => {
                error!("Scan failed: {}", e);
                ScanOutcome::Err(ScanFailure::new(e.to_string()))
            }
        }
    }

    /// Resolves the creation block's timestamp; `None` (-> wall clock at
    /// enrichment) on any error.
    async fn creation_timestamp(&self, event: &PairCreationEvent) -> Option<u64> {
        match self.provider.get_block(event.block_number).await {
            Ok(Some(block)) => Some(block.timestamp.as_u64()),
            Ok(None) => None,
            Err(e) => {
                warn!(
                    "Failed to fetch block {} for pair {:?}: {}",
                    event.block_number, event.pair, e
                );
                None
            }
        }
    }

    /// Fetches both constituent tokens' holder lists concurrently and
    /// merges them into a deduplicated first-seen-order union.
    async fn pair_holders(&self, event: &PairCreationEvent, range: BlockRange) -> Vec<Address> {
        let cfg = &self.settings.holders;
        let (holders0, holders1) = tokio::join!(
            top_holders(
                self.provider.clone(),
                event.token0,
                cfg.per_token_limit,
                range,
                cfg,
            ),
            top_holders(
                self.provider.clone(),
                event.token1,
                cfg.per_token_limit,
                range,
                cfg,
            ),
        );
        merge_holder_lists(&[holders0, holders1], cfg.pair_cap)
    }
}

/// Races `fut` against `limit`; on timeout, logs the operation and bound,
/// abandons the in-flight call, and substitutes `fallback`.
async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    fut: impl Future<Output = T>,
    fallback: T,
) -> T {
    match timeout(limit, fut).await {
        Ok(value) => value,
        Err(_) => {
            warn!("{}, using fallback", ScanError::timeout(operation, limit));
            fallback
        }
    }
}

/// Newest first; the stable sort keeps insertion order between records
/// created in the same second.
fn sort_newest_first(records: &mut [PairRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn now_unix() -> u64 {
    let now = chrono::Utc::now().timestamp();
    u64::try_from(now).unwrap_or(0)
}

/// Entry point mounted by an external transport layer. Always yields a
/// well-formed response object: partial data is preferred over errors,
/// and only a total pipeline failure produces the error shape.
pub async fn scan_new_pairs(settings: &Settings, request: &ScanRequest) -> ScanOutcome {
    let provider = match provider_for_chain(settings, &request.chain) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Scan aborted: {}", e);
            return ScanOutcome::Err(ScanFailure::new(e.to_string()));
        }
    };

    let scanner = PairScanner::new(provider, Arc::new(settings.clone()));
    scanner.scan_to_outcome(request).await
}
