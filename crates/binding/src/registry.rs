//! Key-value registry bindings.
//!
//! The registry maps 32-byte keys to opaque values. Contract addresses are
//! published under well-known keys (for example the core token under
//! `SHA3-256("CTN")`).

use alloy_sol_types::sol;

sol! {
    /// Generic key-value registry
    #[sol(rpc)]
    interface IRegistry {
        /// Emitted when a key is written
        event Set(bytes32 indexed key, bytes value);

        /// Read the value stored under `key` (empty if unset)
        function get(bytes32 key) external view returns (bytes memory);

        /// Write `value` under `key` (owner only)
        function set(bytes32 key, bytes calldata value) external;
    }
}
