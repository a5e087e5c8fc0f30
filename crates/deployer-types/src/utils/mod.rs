//! Utility functions for common type conversions and transformations.

pub mod conversion;
pub mod formatting;

pub use conversion::{
	parse_address, parse_hex_bytes, parse_quantity_u256, parse_quantity_u64, ConversionError,
};
pub use formatting::{format_units, with_0x_prefix, without_0x_prefix};
