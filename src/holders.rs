//! Approximate top-holder ranking for a token, derived from recent
//! Transfer events.
//!
//! Two strategies satisfy the same contract: **net-balance** accumulates a
//! signed running balance per address and confirms candidates with live
//! `balanceOf` reads (accurate, slower), **largest-transfer** ranks
//! recipients by their single largest recent inbound transfer (no live
//! reads, the fast path). Whichever runs first, an error triggers one
//! attempt of the other before degrading to an empty list. Each attempt
//! runs under its own time bound, so a hung primary scan still leaves
//! room for the fallback. The ranking is explicitly a heuristic, not a
//! balance audit.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::Middleware;
use ethers::types::{Address, I256, U256};
use indexmap::{IndexMap, IndexSet};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::contracts::Erc20;
use crate::error::ScanError;
use crate::log_scanner::scan_transfers;
use crate::settings::{Holders, HolderStrategy};
use crate::types::{BlockRange, TransferEvent};

/// Returns up to `limit` unique holder addresses for `token`, best first.
///
/// Never fails: if both strategies error (including timeouts bounded by
/// the caller), the result is an empty list.
pub async fn top_holders<M: Middleware + 'static>(
    provider: Arc<M>,
    token: Address,
    limit: usize,
    range: BlockRange,
    cfg: &Holders,
) -> Vec<Address> {
    let primary = cfg.strategy;
    match run_strategy(provider.clone(), token, limit, range, cfg, primary).await {
        Ok(holders) => holders,
        Err(e) => {
            let fallback = other_strategy(primary);
            warn!(
                "Holder strategy {:?} failed for token {:?} ({}), trying {:?}",
                primary, token, e, fallback
            );
            match run_strategy(provider, token, limit, range, cfg, fallback).await {
                Ok(holders) => holders,
                Err(e) => {
                    warn!(
                        "Holder fallback {:?} also failed for token {:?}: {}",
                        fallback, token, e
                    );
                    Vec::new()
                }
            }
        }
    }
}

fn other_strategy(strategy: HolderStrategy) -> HolderStrategy {
    match strategy {
        HolderStrategy::NetBalance => HolderStrategy::LargestTransfer,
        HolderStrategy::LargestTransfer => HolderStrategy::NetBalance,
    }
}

async fn run_strategy<M: Middleware + 'static>(
    provider: Arc<M>,
    token: Address,
    limit: usize,
    range: BlockRange,
    cfg: &Holders,
    strategy: HolderStrategy,
) -> Result<Vec<Address>, ScanError> {
    let bound = cfg.strategy_timeout();
    match strategy {
        HolderStrategy::NetBalance => {
            bounded_strategy(
                "net-balance holder scan",
                bound,
                net_balance_holders(provider, token, limit, range, cfg),
            )
            .await
        }
        HolderStrategy::LargestTransfer => {
            bounded_strategy(
                "largest-transfer holder scan",
                bound,
                largest_transfer_holders(provider, token, limit, range, cfg),
            )
            .await
        }
    }
}

/// Caps one strategy attempt. A timeout surfaces as an error so the
/// one-shot fallback in `top_holders` fires, instead of the hung attempt
/// consuming the caller's whole holder budget.
async fn bounded_strategy(
    operation: &'static str,
    bound: Duration,
    fut: impl Future<Output = Result<Vec<Address>, ScanError>>,
) -> Result<Vec<Address>, ScanError> {
    match timeout(bound, fut).await {
        Ok(result) => result,
        Err(_) => Err(ScanError::timeout(operation, bound)),
    }
}

/// Net-balance strategy: scan Transfer events in `range`, accumulate
/// signed balances, then confirm the strongest candidates with live
/// `balanceOf` reads (bounded by `cfg.max_balance_calls`). Only addresses
/// with a strictly positive current balance rank; ties keep first-seen
/// order.
async fn net_balance_holders<M: Middleware + 'static>(
    provider: Arc<M>,
    token: Address,
    limit: usize,
    range: BlockRange,
    cfg: &Holders,
) -> Result<Vec<Address>, ScanError> {
    let transfers = scan_transfers(provider.as_ref(), token, range).await?;
    let candidates = net_positive_recipients(&transfers, cfg.max_balance_calls);
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let erc20 = Erc20::new(token, provider);
    let mut balances: Vec<(Address, U256)> = Vec::with_capacity(candidates.len());
    for holder in candidates {
        // One live call per distinct recipient; a single failed read only
        // drops that candidate.
        match erc20.balance_of(holder).call().await {
            Ok(balance) if !balance.is_zero() => balances.push((holder, balance)),
            Ok(_) => {}
            Err(e) => debug!("balanceOf({:?}) failed: {}", holder, e),
        }
    }

    // Stable sort keeps first-seen order between equal balances.
    balances.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(balances.into_iter().take(limit).map(|(a, _)| a).collect())
}

/// Largest-transfer heuristic: scan a narrower, more recent span and rank
/// recipients by single transfer magnitude. A single large inbound
/// transfer is enough to rank; no live balance reads.
async fn largest_transfer_holders<M: Middleware + 'static>(
    provider: Arc<M>,
    token: Address,
    limit: usize,
    range: BlockRange,
    cfg: &Holders,
) -> Result<Vec<Address>, ScanError> {
    let recent = BlockRange::new(range.to.saturating_sub(cfg.recent_blocks), range.to);
    let transfers = scan_transfers(provider.as_ref(), token, recent).await?;
    Ok(rank_by_transfer_value(&transfers, limit))
}

/// Accumulates signed net balances per address. Mint and burn legs are not
/// attributed to the zero address. Returns the recipients whose net is
/// strictly positive, capped to the `max` strongest nets, handed back in
/// first-seen order so downstream stable sorts tie-break on it.
pub fn net_positive_recipients(transfers: &[TransferEvent], max: usize) -> Vec<Address> {
    let mut net: IndexMap<Address, I256> = IndexMap::new();
    let mut recipients: IndexSet<Address> = IndexSet::new();

    for transfer in transfers {
        let value = saturating_signed(transfer.value);
        if transfer.from != Address::zero() {
            let entry = net.entry(transfer.from).or_insert(I256::zero());
            *entry = entry.saturating_sub(value);
        }
        if transfer.to != Address::zero() {
            let entry = net.entry(transfer.to).or_insert(I256::zero());
            *entry = entry.saturating_add(value);
            recipients.insert(transfer.to);
        }
    }

    let mut ranked: Vec<(Address, I256)> = recipients
        .iter()
        .filter_map(|addr| {
            let balance = net.get(addr).copied().unwrap_or_else(I256::zero);
            (balance > I256::zero()).then_some((*addr, balance))
        })
        .collect();
    // The stable sort keeps first-seen order between equal nets, so the
    // cap favors earlier recipients on ties.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(max);

    let keep: IndexSet<Address> = ranked.into_iter().map(|(a, _)| a).collect();
    recipients.into_iter().filter(|a| keep.contains(a)).collect()
}

/// Ranks recipients by single transfer value, descending, excluding the
/// zero address and zero-value transfers. Unique recipients only, in
/// sorted order.
pub fn rank_by_transfer_value(transfers: &[TransferEvent], limit: usize) -> Vec<Address> {
    let mut inbound: Vec<(Address, U256)> = transfers
        .iter()
        .filter(|t| t.to != Address::zero() && !t.value.is_zero())
        .map(|t| (t.to, t.value))
        .collect();
    inbound.sort_by(|a, b| b.1.cmp(&a.1));

    let mut holders: Vec<Address> = Vec::with_capacity(limit);
    for (to, _) in inbound {
        if holders.len() >= limit {
            break;
        }
        if !holders.contains(&to) {
            holders.push(to);
        }
    }
    holders
}

fn saturating_signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}
