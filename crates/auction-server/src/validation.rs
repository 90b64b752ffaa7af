//! Bid form validation. Runs before any node contact.

use auction_core::utils::{ether_to_wei, parse_address};
use ethers::types::{Address, U256};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid address")]
    InvalidAddress,

    #[error("invalid amount")]
    InvalidAmount,
}

/// `POST /bid` form body
#[derive(Debug, Clone, Deserialize)]
pub struct BidForm {
    #[serde(default)]
    pub bidder_address: String,
    #[serde(default)]
    pub bid_amount: String,
}

/// A bid that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidBid {
    pub bidder: Address,
    pub amount_ether: U256,
    pub amount_wei: U256,
}

pub fn parse_bidder(input: &str) -> Result<Address, ValidationError> {
    parse_address(input).ok_or(ValidationError::InvalidAddress)
}

/// Whole ether as a non-negative base-10 integer; surrounding whitespace is
/// ignored and a leading `+` is allowed.
pub fn parse_amount(input: &str) -> Result<U256, ValidationError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidAmount);
    }
    U256::from_dec_str(digits).map_err(|_| ValidationError::InvalidAmount)
}

impl BidForm {
    pub fn validate(&self) -> Result<ValidBid, ValidationError> {
        let bidder = parse_bidder(&self.bidder_address)?;
        let amount_ether = parse_amount(&self.bid_amount)?;
        let amount_wei = ether_to_wei(amount_ether).ok_or(ValidationError::InvalidAmount)?;
        Ok(ValidBid {
            bidder,
            amount_ether,
            amount_wei,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIDDER: &str = "0xb95A8c720bbDD408f97CccF07de6ceD493bDbc74";

    fn form(address: &str, amount: &str) -> BidForm {
        BidForm {
            bidder_address: address.to_string(),
            bid_amount: amount.to_string(),
        }
    }

    #[test]
    fn test_valid_bid() {
        let bid = form(BIDDER, " 5 ").validate().unwrap();
        assert_eq!(bid.bidder, BIDDER.parse::<Address>().unwrap());
        assert_eq!(bid.amount_ether, U256::from(5u64));
        assert_eq!(bid.amount_wei, U256::from(5u64) * U256::exp10(18));
    }

    #[test]
    fn test_amounts() {
        assert_eq!(parse_amount("0"), Ok(U256::zero()));
        assert_eq!(parse_amount("+12"), Ok(U256::from(12u64)));
        assert_eq!(parse_amount("\t7\n"), Ok(U256::from(7u64)));
        for bad in ["", "  ", "-1", "abc", "1.5", "1e3", "0x10", "++1", "1 000"] {
            assert_eq!(parse_amount(bad), Err(ValidationError::InvalidAmount), "{:?}", bad);
        }
    }

    #[test]
    fn test_amount_overflow_is_invalid() {
        let huge = U256::MAX.to_string();
        assert_eq!(
            form(BIDDER, &huge).validate(),
            Err(ValidationError::InvalidAmount)
        );
        let too_many_digits = "9".repeat(100);
        assert_eq!(parse_amount(&too_many_digits), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn test_address_checked_before_amount() {
        assert_eq!(
            form("0x123", "-1").validate(),
            Err(ValidationError::InvalidAddress)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::InvalidAddress.to_string(), "invalid address");
        assert_eq!(ValidationError::InvalidAmount.to_string(), "invalid amount");
    }
}
