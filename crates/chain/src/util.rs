use alloy_primitives::{Address, U256};

/// Whether `address` is a 20-byte hex address and, if `checksummed`, spelled
/// exactly as its EIP-55 form.
pub fn is_valid_address(address: &str, checksummed: bool) -> bool {
    match address.parse::<Address>() {
        Ok(parsed) => !checksummed || parsed.to_checksum(None) == address,
        Err(_) => false,
    }
}

/// Parse an address only if it is given in its EIP-55 form.
pub fn parse_checksummed(address: &str) -> Option<Address> {
    address
        .parse::<Address>()
        .ok()
        .filter(|parsed| parsed.to_checksum(None) == address)
}

/// Convert whole coins (18 decimals) to base units.
pub fn to_wei(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}
