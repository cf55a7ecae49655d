//! Contract bindings for all external contracts.
//!
//! This crate consolidates the Solidity interfaces the faucet talks to:
//! - Access control (role registry shared by the token family)
//! - Token family (ERC20, BaseToken, CoreToken, ChequableToken, BountiableToken,
//!   EquivalentToken, WrapperToken)
//! - Caller and EIP712 helpers
//! - PriceFeed
//! - Registry (key-value lookup used to resolve the core token)
//!
//! All bindings are generated using alloy's `sol!` macro. Calls, transactions and
//! event filters come from `#[sol(rpc)]`; no bytecode is embedded.

pub mod access;
pub mod caller;
pub mod oracle;
pub mod registry;
pub mod token;
