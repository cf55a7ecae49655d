//! Token contract bindings.
//!
//! Includes the standard ERC20 surface plus the token variants deployed
//! alongside the registry:
//! - BaseToken / CoreToken (mintable ERC20, the faucet pays out CoreToken)
//! - ChequableToken (cashes signed cheques)
//! - BountiableToken (executes signed bounties for a reward)
//! - EquivalentToken / WrapperToken (1:1 wrapping of an underlying asset)

use alloy_sol_types::sol;

sol! {
    /// Signed authorization to move `amount` from `owner` to `spender`,
    /// independent of any on-chain allowance.
    #[derive(Debug, PartialEq, Eq)]
    struct Cheque {
        address owner;
        address spender;
        uint256 amount;
        uint256 nonce;
        uint256 deadline;
        bytes signature;
    }

    /// Signed authorization for a third party to execute `data` on `target`
    /// on behalf of `owner`, paid with `reward`.
    #[derive(Debug, PartialEq, Eq)]
    struct Bounty {
        address owner;
        address target;
        bytes data;
        uint256 reward;
        uint256 nonce;
        uint256 deadline;
        uint256 energy;
        bytes signature;
    }

    /// Standard ERC20 token interface
    #[sol(rpc)]
    interface IERC20 {
        /// Emitted when tokens are transferred
        event Transfer(
            address indexed from,
            address indexed to,
            uint256 value
        );

        /// Emitted when an allowance is set
        event Approval(
            address indexed owner,
            address indexed spender,
            uint256 value
        );

        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get allowance granted by owner to spender
        function allowance(address owner, address spender) external view returns (uint256);

        /// Approve spender to spend tokens
        function approve(address spender, uint256 amount) external returns (bool);

        /// Transfer tokens to recipient
        function transfer(address recipient, uint256 amount) external returns (bool);

        /// Transfer tokens from sender to recipient (requires allowance)
        function transferFrom(address sender, address recipient, uint256 amount) external returns (bool);

        /// Get token name
        function name() external view returns (string memory);

        /// Get token symbol
        function symbol() external view returns (string memory);

        /// Get token decimals
        function decimals() external view returns (uint8);

        /// Get total supply
        function totalSupply() external view returns (uint256);
    }

    /// Mintable ERC20 base shared by the token family
    #[sol(rpc)]
    interface IBaseToken {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function balanceOf(address account) external view returns (uint256);
        function transfer(address recipient, uint256 amount) external returns (bool);
        function totalSupply() external view returns (uint256);

        /// Mint new tokens (requires the minter role)
        function mint(address to, uint256 amount) external;

        /// Burn tokens from the caller
        function burn(uint256 amount) external;

        /// Role allowed to mint
        function MINTER_ROLE() external view returns (bytes32);
    }

    /// Core token, resolved through the registry and paid out by the faucet
    #[sol(rpc)]
    interface ICoreToken {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function balanceOf(address account) external view returns (uint256);
        function transfer(address recipient, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string memory);
    }

    /// Token that cashes EIP-712 signed cheques
    #[sol(rpc)]
    interface IChequableToken {
        /// Emitted once per cheque when it is cashed
        event ChequeCashed(
            address indexed owner,
            address indexed spender,
            uint256 amount,
            uint256 nonce
        );

        /// Cash a signed cheque; reverts on a used nonce, expired deadline or bad signature
        function cashCheque(Cheque calldata cheque) external returns (bool);

        /// Whether `nonce` has already been consumed for `owner`
        function chequeUsed(address owner, uint256 nonce) external view returns (bool);
    }

    /// Token that pays a reward for executing signed bounties
    #[sol(rpc)]
    interface IBountiableToken {
        /// Emitted once per bounty when it is claimed
        event BountyClaimed(
            address indexed owner,
            address indexed target,
            address indexed claimer,
            uint256 reward,
            uint256 nonce
        );

        /// Execute a signed bounty and collect its reward
        function claimBounty(Bounty calldata bounty) external returns (bytes memory);

        /// Whether `nonce` has already been consumed for `owner`
        function bountyUsed(address owner, uint256 nonce) external view returns (bool);
    }

    /// Token backed 1:1 by an underlying ERC20
    #[sol(rpc)]
    interface IEquivalentToken {
        event Deposit(address indexed account, uint256 amount);
        event Withdrawal(address indexed account, uint256 amount);

        function underlying() external view returns (address);
        function deposit(uint256 amount) external;
        function withdraw(uint256 amount) external;
    }

    /// Token wrapping the native coin
    #[sol(rpc)]
    interface IWrapperToken {
        event Wrapped(address indexed account, uint256 amount);
        event Unwrapped(address indexed account, uint256 amount);

        function wrap() external payable;
        function unwrap(uint256 amount) external;
    }
}
