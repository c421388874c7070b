use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Per-chain overrides. Anything left unset falls back to the built-in
/// defaults (see `default_endpoint` / `default_blocks_per_minute`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChainSettings {
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub blocks_per_minute: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Bound on resolving a creation block's timestamp.
    #[serde(default = "default_block_timestamp_ms")]
    pub block_timestamp_ms: u64,
    /// Bound on the liquidity snapshot for one pair.
    #[serde(default = "default_liquidity_ms")]
    pub liquidity_ms: u64,
    /// Bound on the combined holder lookup for both tokens of a pair.
    #[serde(default = "default_holders_ms")]
    pub holders_ms: u64,
}

fn default_block_timestamp_ms() -> u64 {
    3_000
}
fn default_liquidity_ms() -> u64 {
    3_000
}
fn default_holders_ms() -> u64 {
    4_000
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            block_timestamp_ms: default_block_timestamp_ms(),
            liquidity_ms: default_liquidity_ms(),
            holders_ms: default_holders_ms(),
        }
    }
}

impl Timeouts {
    pub fn block_timestamp(&self) -> Duration {
        Duration::from_millis(self.block_timestamp_ms)
    }
    pub fn liquidity(&self) -> Duration {
        Duration::from_millis(self.liquidity_ms)
    }
    pub fn holders(&self) -> Duration {
        Duration::from_millis(self.holders_ms)
    }
}

/// Which holder-approximation strategy runs first. The other one is the
/// one-shot fallback when the primary errors.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HolderStrategy {
    /// Accumulate signed net balances from Transfer events, then confirm
    /// with live balanceOf reads. More accurate, more RPC calls.
    NetBalance,
    /// Rank recipients by their single largest recent inbound transfer.
    /// No live balance reads; the fast path.
    LargestTransfer,
}

impl Default for HolderStrategy {
    fn default() -> Self {
        HolderStrategy::NetBalance
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Holders {
    #[serde(default)]
    pub strategy: HolderStrategy,
    /// Holder addresses contributed per constituent token.
    #[serde(default = "default_per_token_limit")]
    pub per_token_limit: usize,
    /// Cap on the merged per-pair holder union.
    #[serde(default = "default_pair_cap")]
    pub pair_cap: usize,
    /// Trailing span for the largest-transfer scan (narrower than the
    /// discovery range on purpose).
    #[serde(default = "default_recent_blocks")]
    pub recent_blocks: u64,
    /// Cap on distinct recipients receiving a live balanceOf call.
    #[serde(default = "default_max_balance_calls")]
    pub max_balance_calls: usize,
    /// Bound on one strategy attempt. Two attempts (primary plus the
    /// one-shot fallback) must fit inside the pipeline's holder bound,
    /// so a hung primary still leaves room for the fallback.
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,
}

fn default_per_token_limit() -> usize {
    5
}
fn default_pair_cap() -> usize {
    10
}
fn default_recent_blocks() -> u64 {
    5_000
}
fn default_max_balance_calls() -> usize {
    100
}
fn default_strategy_timeout_ms() -> u64 {
    2_000
}

impl Default for Holders {
    fn default() -> Self {
        Self {
            strategy: HolderStrategy::default(),
            per_token_limit: default_per_token_limit(),
            pair_cap: default_pair_cap(),
            recent_blocks: default_recent_blocks(),
            max_balance_calls: default_max_balance_calls(),
            strategy_timeout_ms: default_strategy_timeout_ms(),
        }
    }
}

impl Holders {
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub chains: HashMap<String, ChainSettings>,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub holders: Holders,
    /// Process-wide endpoint override (RPC_URL). Never read from the file.
    #[serde(skip)]
    pub global_rpc_url: Option<String>,
}

impl Settings {
    /// Loads `Config.toml` if present, then applies environment overrides.
    ///
    /// `RPC_URL_<CHAIN>` (e.g. `RPC_URL_POLYGON`) pins the endpoint for one
    /// chain and beats every other source. A per-chain `[chains]` entry is
    /// next, then the process-wide `RPC_URL`, then the built-in defaults.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("Config.toml").required(false))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.apply_env_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    fn apply_env_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        let chain_names: Vec<String> = self.chains.keys().cloned().collect();
        for name in chain_names {
            let key = format!("RPC_URL_{}", name.to_uppercase());
            if let Some(url) = get(&key).filter(|u| !u.trim().is_empty()) {
                self.chains.entry(name).or_default().rpc_url = Some(url);
            }
        }
        if let Some(url) = get("RPC_URL").filter(|u| !u.trim().is_empty()) {
            self.global_rpc_url = Some(url);
        }
    }

    /// Resolves the RPC endpoint for a chain: env/per-chain config first,
    /// then the process-wide `RPC_URL`, then the public default table.
    pub fn endpoint_for_chain(&self, chain: &str) -> String {
        let chain_lower = chain.to_lowercase();
        if let Ok(url) = env::var(format!("RPC_URL_{}", chain.to_uppercase())) {
            if !url.trim().is_empty() {
                return url;
            }
        }
        if let Some(cfg) = self.chains.get(&chain_lower) {
            if let Some(url) = cfg.rpc_url.as_ref().filter(|u| !u.trim().is_empty()) {
                return url.clone();
            }
        }
        if let Some(url) = self.global_rpc_url.as_ref() {
            return url.clone();
        }
        default_endpoint(&chain_lower).to_string()
    }

    /// Average block production rate for a chain, in blocks per minute.
    /// Unknown chains use the Ethereum mainnet cadence (12 blocks/minute).
    pub fn blocks_per_minute(&self, chain: &str) -> f64 {
        let chain_lower = chain.to_lowercase();
        self.chains
            .get(&chain_lower)
            .and_then(|c| c.blocks_per_minute)
            .filter(|r| *r > 0.0)
            .unwrap_or_else(|| default_blocks_per_minute(&chain_lower))
    }
}

/// Public default endpoints, used when neither config nor environment
/// supplies one.
pub fn default_endpoint(chain: &str) -> &'static str {
    match chain {
        "ethereum" => "https://eth.llamarpc.com",
        "polygon" => "https://polygon.llamarpc.com",
        "arbitrum" => "https://arbitrum.llamarpc.com",
        "optimism" => "https://optimism.llamarpc.com",
        "base" => "https://base.llamarpc.com",
        "bsc" => "https://bsc.llamarpc.com",
        _ => "https://eth.llamarpc.com",
    }
}

/// Built-in average block rates (blocks per minute).
pub fn default_blocks_per_minute(chain: &str) -> f64 {
    match chain {
        "polygon" => 28.0,
        "arbitrum" => 12.0,
        "optimism" => 12.0,
        "base" => 30.0,
        "bsc" => 20.0,
        // Ethereum mainnet cadence, also the unknown-chain default.
        _ => 12.0,
    }
}
