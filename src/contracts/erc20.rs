use ethers::prelude::*;

abigen!(
    Erc20,
    r#"[
        event Transfer(address indexed from, address indexed to, uint256 value)
        function totalSupply() external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
    ]"#
);
