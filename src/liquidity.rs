//! Initial-liquidity snapshot for a discovered pair.
//!
//! Liquidity is best-effort enrichment, not primary output: a broken or
//! non-standard pair must not abort the whole scan, so every failure path
//! degrades to the `"0, 0"` sentinel instead of propagating.

use std::sync::Arc;

use ethers::prelude::Middleware;
use ethers::types::{Address, U256};
use ethers::utils::format_units;
use tracing::debug;

use crate::contracts::{Erc20, IUniswapV2Pair};
use crate::error::ScanError;

/// Placeholder returned for any pair whose reserves cannot be read.
pub const LIQUIDITY_SENTINEL: &str = "0, 0";

/// Reads both reserve quantities and formats them with each token's
/// decimal precision, joined as `"amount0, amount1"`.
///
/// Never fails: unreachable pair, call revert, or decode error all yield
/// the sentinel. The caller additionally bounds this with a timeout and
/// treats a timeout the same way.
pub async fn snapshot<M: Middleware + 'static>(provider: Arc<M>, pair: Address) -> String {
    match try_snapshot(provider, pair).await {
        Ok(formatted) => formatted,
        Err(e) => {
            debug!("Liquidity snapshot failed for pair {:?}: {}", pair, e);
            LIQUIDITY_SENTINEL.to_string()
        }
    }
}

async fn try_snapshot<M: Middleware + 'static>(
    provider: Arc<M>,
    pair: Address,
) -> Result<String, ScanError> {
    let pair_contract = IUniswapV2Pair::new(pair, provider.clone());

    let ((reserve0, reserve1, _), token0, token1) = tokio::try_join!(
        async {
            pair_contract
                .get_reserves()
                .call()
                .await
                .map_err(|e| ScanError::rpc("getReserves", e))
        },
        async {
            pair_contract
                .token_0()
                .call()
                .await
                .map_err(|e| ScanError::rpc("token0", e))
        },
        async {
            pair_contract
                .token_1()
                .call()
                .await
                .map_err(|e| ScanError::rpc("token1", e))
        },
    )?;

    let (decimals0, decimals1) = tokio::try_join!(
        async {
            Erc20::new(token0, provider.clone())
                .decimals()
                .call()
                .await
                .map_err(|e| ScanError::rpc("decimals(token0)", e))
        },
        async {
            Erc20::new(token1, provider.clone())
                .decimals()
                .call()
                .await
                .map_err(|e| ScanError::rpc("decimals(token1)", e))
        },
    )?;

    let amount0 = format_reserve(reserve0, decimals0)?;
    let amount1 = format_reserve(reserve1, decimals1)?;
    Ok(format!("{}, {}", amount0, amount1))
}

fn format_reserve(reserve: u128, decimals: u8) -> Result<String, ScanError> {
    format_units(U256::from(reserve), u32::from(decimals))
        .map_err(|e| ScanError::rpc("format_units", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::Provider;

    #[test]
    fn formats_reserves_with_token_precision() {
        assert_eq!(format_reserve(1_500_000, 6).unwrap(), "1.500000");
        assert_eq!(
            format_reserve(2_000_000_000_000_000_000u128, 18).unwrap(),
            "2.000000000000000000"
        );
        assert_eq!(format_reserve(0, 18).unwrap(), "0.000000000000000000");
    }

    #[tokio::test]
    async fn unreachable_pair_degrades_to_sentinel() {
        // A mock transport with no queued responses errors on every call.
        let (provider, _mock) = Provider::mocked();
        let result = snapshot(Arc::new(provider), Address::from_low_u64_be(1)).await;
        assert_eq!(result, LIQUIDITY_SENTINEL);
    }
}
