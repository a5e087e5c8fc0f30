//! Common types module for the EVM deployer.
//!
//! This module defines the core data types shared by the codec, signing and
//! delivery crates. Primitive Ethereum types (`Address`, `U256`, `B256`,
//! `Bytes`) are re-exported from `alloy-primitives` so every crate agrees on a
//! single representation.

/// Signature types produced by account implementations.
pub mod account;
/// Transaction delivery types for blockchain interactions.
pub mod delivery;
/// Keccak-256 hashing and address derivation from public keys.
pub mod hash;
/// Network configuration types.
pub mod networks;
/// Base trait for self-registering implementations.
pub mod registry;
/// Secure string type for private keys.
pub mod secret_string;
/// Utility functions for common type conversions.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use alloy_primitives::{Address, Bytes, B256, U256};

// Re-export all types for convenient access
pub use account::*;
pub use delivery::*;
pub use hash::{keccak256, public_key_to_address};
pub use networks::{NetworkConfig, NetworksConfig};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{
	format_units, parse_address, parse_hex_bytes, parse_quantity_u256, parse_quantity_u64,
	with_0x_prefix, without_0x_prefix, ConversionError,
};
pub use validation::*;
