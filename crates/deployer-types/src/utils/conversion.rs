//! Conversion utilities for JSON-RPC values.
//!
//! Ethereum JSON-RPC encodes integers as "quantities": `0x`-prefixed hex with
//! no leading zeros. Byte strings ("data") are `0x`-prefixed hex with an even
//! number of digits.

use super::formatting::without_0x_prefix;
use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Errors produced when converting JSON-RPC strings into typed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
	#[error("Missing 0x prefix in '{0}'")]
	MissingPrefix(String),
	#[error("Invalid quantity '{0}'")]
	InvalidQuantity(String),
	#[error("Invalid hex data: {0}")]
	InvalidHex(String),
	#[error("Invalid address '{0}'")]
	InvalidAddress(String),
}

fn quantity_digits(value: &str) -> Result<&str, ConversionError> {
	let digits = value
		.strip_prefix("0x")
		.or_else(|| value.strip_prefix("0X"))
		.ok_or_else(|| ConversionError::MissingPrefix(value.to_string()))?;
	if digits.is_empty() {
		return Err(ConversionError::InvalidQuantity(value.to_string()));
	}
	Ok(digits)
}

/// Parses a hex quantity such as `"0x1a"` into a `u64`.
pub fn parse_quantity_u64(value: &str) -> Result<u64, ConversionError> {
	let digits = quantity_digits(value)?;
	u64::from_str_radix(digits, 16).map_err(|_| ConversionError::InvalidQuantity(value.to_string()))
}

/// Parses a hex quantity into a 256-bit integer.
pub fn parse_quantity_u256(value: &str) -> Result<U256, ConversionError> {
	let digits = quantity_digits(value)?;
	U256::from_str_radix(digits, 16)
		.map_err(|_| ConversionError::InvalidQuantity(value.to_string()))
}

/// Decodes hex data with or without a `0x` prefix. An empty string is empty data.
pub fn parse_hex_bytes(value: &str) -> Result<Vec<u8>, ConversionError> {
	hex::decode(without_0x_prefix(value.trim()))
		.map_err(|e| ConversionError::InvalidHex(e.to_string()))
}

/// Parses a 20-byte address. Both checksummed and lowercase forms are accepted.
pub fn parse_address(value: &str) -> Result<Address, ConversionError> {
	let bytes =
		parse_hex_bytes(value).map_err(|_| ConversionError::InvalidAddress(value.to_string()))?;
	if bytes.len() != 20 {
		return Err(ConversionError::InvalidAddress(value.to_string()));
	}
	Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_quantity_u64() {
		assert_eq!(parse_quantity_u64("0x0"), Ok(0));
		assert_eq!(parse_quantity_u64("0x5208"), Ok(21000));
		assert_eq!(parse_quantity_u64("0xffffffffffffffff"), Ok(u64::MAX));
		assert!(parse_quantity_u64("0x1ffffffffffffffff").is_err());
		assert_eq!(
			parse_quantity_u64("5208"),
			Err(ConversionError::MissingPrefix("5208".to_string()))
		);
		assert!(parse_quantity_u64("0x").is_err());
	}

	#[test]
	fn test_parse_quantity_u256() {
		assert_eq!(
			parse_quantity_u256("0x3b9aca00").unwrap(),
			U256::from(1_000_000_000u64)
		);
		assert_eq!(
			parse_quantity_u256("0xde0b6b3a7640000").unwrap(),
			U256::from(1_000_000_000_000_000_000u64)
		);
		assert!(parse_quantity_u256("0xzz").is_err());
	}

	#[test]
	fn test_parse_hex_bytes() {
		assert_eq!(parse_hex_bytes("0x").unwrap(), Vec::<u8>::new());
		assert_eq!(parse_hex_bytes("0x6080").unwrap(), vec![0x60, 0x80]);
		assert_eq!(parse_hex_bytes("6080").unwrap(), vec![0x60, 0x80]);
		assert!(parse_hex_bytes("0x608").is_err());
	}

	#[test]
	fn test_parse_address() {
		let address = parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap();
		assert_eq!(
			hex::encode(address),
			"5fbdb2315678afecb367f032d93f642f64180aa3"
		);
		assert!(parse_address("0xdead").is_err());
	}
}
