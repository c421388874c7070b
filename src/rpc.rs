//! Chain-to-endpoint resolution and provider construction.

use std::sync::Arc;

use ethers::prelude::{Http, Provider};
use tracing::debug;

use crate::error::ScanError;
use crate::settings::Settings;

/// Builds an HTTP provider for the requested chain. Endpoint precedence:
/// `RPC_URL_<CHAIN>` env var, then the `[chains]` config table, then the
/// process-wide `RPC_URL`, then the public default table.
pub fn provider_for_chain(
    settings: &Settings,
    chain: &str,
) -> Result<Arc<Provider<Http>>, ScanError> {
    let endpoint = settings.endpoint_for_chain(chain);
    debug!("Using RPC endpoint {} for chain {}", endpoint, chain);
    let provider = Provider::<Http>::try_from(endpoint.as_str())
        .map_err(|e| ScanError::FatalRange(format!("invalid RPC endpoint {}: {}", endpoint, e)))?;
    Ok(Arc::new(provider))
}
