//! Price feed bindings.

use alloy_sol_types::sol;

sol! {
    /// Aggregated price feed
    #[sol(rpc)]
    interface IPriceFeed {
        /// Emitted when a new price is pushed
        event PriceUpdated(uint256 price, uint256 updatedAt);

        /// Latest aggregated price and the time it was recorded
        function latestPrice() external view returns (uint256 price, uint256 updatedAt);

        /// Decimals of the reported price
        function decimals() external view returns (uint8);

        /// Push a new price (requires the feeder role)
        function updatePrice(uint256 price) external;
    }
}
