// Contracts Module - Public ABIs Only

pub mod erc20;
pub mod i_uniswap_v2_factory;
pub mod i_uniswap_v2_pair;

// Public exports
pub use erc20::{Erc20, TransferFilter};
pub use i_uniswap_v2_factory::{IUniswapV2Factory, PairCreatedFilter};
pub use i_uniswap_v2_pair::IUniswapV2Pair;
