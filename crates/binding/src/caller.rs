//! Bindings for the call-forwarding helper and the EIP-712 domain contract.

use alloy_sol_types::sol;

sol! {
    /// Forwards arbitrary calls on behalf of its owner
    #[sol(rpc)]
    interface ICaller {
        /// Emitted after every forwarded call
        event Executed(address indexed target, bytes data, bool success);

        /// Forward `data` to `target` with the attached value
        function execute(address target, bytes calldata data) external payable returns (bytes memory);
    }

    /// EIP-712 domain introspection (EIP-5267)
    #[sol(rpc)]
    interface IEIP712 {
        function DOMAIN_SEPARATOR() external view returns (bytes32);

        function eip712Domain() external view returns (
            bytes1 fields,
            string memory name,
            string memory version,
            uint256 chainId,
            address verifyingContract,
            bytes32 salt,
            uint256[] memory extensions
        );
    }
}
