//! Derives a block-number range from a wall-clock time window using a
//! per-chain average block-production rate.

use crate::settings::Settings;
use crate::types::BlockRange;

/// Immutable per-chain block cadence, resolved once per request.
#[derive(Debug, Clone)]
pub struct ChainProfile {
    pub chain: String,
    pub blocks_per_minute: f64,
}

impl ChainProfile {
    /// Looks up the chain's rate from settings; unknown chains fall back
    /// to the built-in default table rather than failing.
    pub fn resolve(settings: &Settings, chain: &str) -> Self {
        Self {
            chain: chain.to_lowercase(),
            blocks_per_minute: settings.blocks_per_minute(chain),
        }
    }
}

/// Computes the inclusive block range covering the trailing window.
///
/// `blocks_to_scan = ceil(window_minutes * rate)`; the lower bound is
/// clamped at genesis. Never fails; a zero window degenerates to a
/// zero-width range at the tip (the caller validates window positivity).
pub fn block_range_for_window(
    profile: &ChainProfile,
    window_minutes: u64,
    current_height: u64,
) -> BlockRange {
    let blocks_to_scan = (window_minutes as f64 * profile.blocks_per_minute).ceil() as u64;
    BlockRange::new(current_height.saturating_sub(blocks_to_scan), current_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(rate: f64) -> ChainProfile {
        ChainProfile {
            chain: "ethereum".to_string(),
            blocks_per_minute: rate,
        }
    }

    #[test]
    fn span_matches_ceiled_product() {
        let range = block_range_for_window(&profile(12.0), 30, 1_000_000);
        assert_eq!(range.span(), 360);
        assert_eq!(range.to, 1_000_000);
        assert!(range.from <= range.to);
    }

    #[test]
    fn fractional_rate_rounds_up() {
        // 7 minutes at 2.5 blocks/minute = 17.5 -> 18 blocks
        let range = block_range_for_window(&profile(2.5), 7, 100_000);
        assert_eq!(range.span(), 18);
    }

    #[test]
    fn clamps_at_genesis() {
        let range = block_range_for_window(&profile(12.0), 60, 100);
        assert_eq!(range.from, 0);
        assert_eq!(range.to, 100);
    }

    #[test]
    fn zero_window_degenerates_to_tip() {
        let range = block_range_for_window(&profile(12.0), 0, 500);
        assert_eq!(range, BlockRange::new(500, 500));
    }

    #[test]
    fn unknown_chain_uses_default_rate() {
        let settings = Settings::default();
        let p = ChainProfile::resolve(&settings, "FancyChain");
        assert_eq!(p.blocks_per_minute, 12.0);
        assert_eq!(p.chain, "fancychain");
    }
}
