//! Secure string type for handling private keys.
//!
//! `SecretString` wraps sensitive string data so that it is zeroed when dropped
//! and never shows up in logs, debug output or serialized configuration.

use crate::utils::without_0x_prefix;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// A secure string type that automatically zeros memory on drop and
/// prevents accidental exposure in logs.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	/// Creates a new SecretString from a regular string.
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret string as a string slice.
	///
	/// # Security Warning
	/// This method exposes the actual secret. Use it only when absolutely necessary
	/// and ensure the exposed value is not logged or stored insecurely.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Exposes the secret string to a closure for processing.
	///
	/// Prefer this over [`expose_secret`](Self::expose_secret): the borrow cannot
	/// outlive the closure.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// Decodes the secret as hex (with or without a `0x` prefix) into a buffer
	/// that is zeroed on drop.
	pub fn decode_hex(&self) -> Result<Zeroizing<Vec<u8>>, hex::FromHexError> {
		self.with_exposed(|s| hex::decode(without_0x_prefix(s.trim())).map(Zeroizing::new))
	}

	/// Returns the length of the secret string.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if the secret string is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString(***REDACTED***)")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "***REDACTED***")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

// Serialization always redacts; keys are only ever read from configuration.
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str("***REDACTED***")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_secret_string_debug() {
		let secret = SecretString::from(KEY);
		let debug_str = format!("{:?}", secret);
		assert_eq!(debug_str, "SecretString(***REDACTED***)");
		assert!(!debug_str.contains("ac0974"));
	}

	#[test]
	fn test_secret_string_display() {
		let secret = SecretString::from(KEY);
		let display_str = format!("{}", secret);
		assert_eq!(display_str, "***REDACTED***");
	}

	#[test]
	fn test_secret_string_serialize_redacts() {
		let secret = SecretString::from(KEY);
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, "\"***REDACTED***\"");
	}

	#[test]
	fn test_decode_hex_accepts_prefixed_and_bare() {
		let prefixed = SecretString::from(KEY).decode_hex().unwrap();
		let bare = SecretString::from(&KEY[2..]).decode_hex().unwrap();
		assert_eq!(prefixed.len(), 32);
		assert_eq!(*prefixed, *bare);
		assert_eq!(prefixed[0], 0xac);
	}

	#[test]
	fn test_decode_hex_rejects_garbage() {
		assert!(SecretString::from("0xnothex").decode_hex().is_err());
	}

	#[test]
	fn test_with_exposed() {
		let secret = SecretString::from("my-secret-value");
		let result = secret.with_exposed(|s| {
			assert_eq!(s, "my-secret-value");
			s.len()
		});
		assert_eq!(result, 15);
		assert_eq!(secret.len(), 15);
		assert!(!secret.is_empty());
	}
}
