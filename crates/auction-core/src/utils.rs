use ethers::types::{Address, U256};
use ethers::utils::to_checksum;

/// Wei per ether
pub fn wei_per_ether() -> U256 {
    U256::exp10(18)
}

/// Whole ether to wei; `None` on overflow
pub fn ether_to_wei(ether: U256) -> Option<U256> {
    ether.checked_mul(wei_per_ether())
}

/// Parse an ethereum address. The `0x` prefix is optional. All-lowercase and
/// all-uppercase hex are accepted as is; mixed case must be a valid EIP-55
/// checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex_part = input.strip_prefix("0x").unwrap_or(input);
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let bytes = hex::decode(hex_part).ok()?;
    let address = Address::from_slice(&bytes);

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address, None)[2..] != *hex_part {
        return None;
    }

    Some(address)
}
