use ethers::prelude::*;

abigen!(
    IUniswapV2Factory,
    r#"[
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256)
        function getPair(address tokenA, address tokenB) external view returns (address pair)
        function allPairsLength() external view returns (uint256)
    ]"#
);
