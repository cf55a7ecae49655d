//! Role-based access control bindings.

use alloy_sol_types::sol;

sol! {
    /// Role registry shared by the token family
    #[sol(rpc)]
    interface IAccessControl {
        /// Emitted when `newAdminRole` replaces `previousAdminRole` as the admin of `role`
        event RoleAdminChanged(
            bytes32 indexed role,
            bytes32 indexed previousAdminRole,
            bytes32 indexed newAdminRole
        );

        /// Emitted when `account` is granted `role`
        event RoleGranted(
            bytes32 indexed role,
            address indexed account,
            address indexed sender
        );

        /// Emitted when `account` is revoked `role`
        event RoleRevoked(
            bytes32 indexed role,
            address indexed account,
            address indexed sender
        );

        function DEFAULT_ADMIN_ROLE() external view returns (bytes32);

        function hasRole(bytes32 role, address account) external view returns (bool);

        function getRoleAdmin(bytes32 role) external view returns (bytes32);

        function grantRole(bytes32 role, address account) external;

        function revokeRole(bytes32 role, address account) external;

        function renounceRole(bytes32 role, address callerConfirmation) external;
    }
}
