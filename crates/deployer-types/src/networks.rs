//! Network configuration types for EVM chains.
//!
//! This module defines the configuration structures for managing network-specific
//! settings: the JSON-RPC endpoint, a display name and an optional block explorer.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Configuration for a single blockchain network.
///
/// # Fields
///
/// * `name` - Human readable network name (e.g., "Sepolia Testnet")
/// * `rpc_url` - The HTTP(S) JSON-RPC endpoint
/// * `explorer_url` - Base URL of a block explorer, used to render links
/// * `native_symbol` - Symbol of the native currency for balance display
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
	pub name: String,
	pub rpc_url: String,
	#[serde(default)]
	pub explorer_url: Option<String>,
	#[serde(default = "default_native_symbol")]
	pub native_symbol: String,
}

fn default_native_symbol() -> String {
	"ETH".to_string()
}

impl NetworkConfig {
	/// Explorer link for a transaction hash, if an explorer is configured.
	pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
		self.explorer_url
			.as_ref()
			.map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
	}

	/// Explorer link for an address, if an explorer is configured.
	pub fn address_url(&self, address: &str) -> Option<String> {
		self.explorer_url
			.as_ref()
			.map(|base| format!("{}/address/{}", base.trim_end_matches('/'), address))
	}
}

/// Networks configuration mapping chain IDs to their configurations.
///
/// TOML tables cannot have integer keys, so chain IDs are written as string
/// keys and converted by [`deserialize_networks`].
pub type NetworksConfig = HashMap<u64, NetworkConfig>;

/// Helper function to deserialize network configurations from TOML.
///
/// # Errors
///
/// Returns a deserialization error if:
/// - A chain ID key cannot be parsed as a u64
/// - The underlying network configuration is invalid
pub fn deserialize_networks<'de, D>(deserializer: D) -> Result<NetworksConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, NetworkConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, value) in string_map {
		let chain_id = key
			.parse::<u64>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid chain_id '{}': {}", key, e)))?;
		result.insert(chain_id, value);
	}

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Deserialize)]
	struct Wrapper {
		#[serde(deserialize_with = "deserialize_networks")]
		networks: NetworksConfig,
	}

	#[test]
	fn test_deserialize_networks_with_string_keys() {
		let parsed: Wrapper = toml::from_str(
			r#"
[networks.11155111]
name = "Sepolia Testnet"
rpc_url = "https://rpc.sepolia.org"
explorer_url = "https://sepolia.etherscan.io/"
"#,
		)
		.unwrap();

		let sepolia = parsed.networks.get(&11155111).unwrap();
		assert_eq!(sepolia.native_symbol, "ETH");
		assert_eq!(
			sepolia.tx_url("0xabc").as_deref(),
			Some("https://sepolia.etherscan.io/tx/0xabc")
		);
		assert_eq!(
			sepolia.address_url("0xdef").as_deref(),
			Some("https://sepolia.etherscan.io/address/0xdef")
		);
	}

	#[test]
	fn test_invalid_chain_id_key() {
		let result: Result<Wrapper, _> = toml::from_str(
			r#"
[networks.sepolia]
name = "Sepolia Testnet"
rpc_url = "https://rpc.sepolia.org"
"#,
		);
		assert!(result.is_err());
	}

	#[test]
	fn test_links_absent_without_explorer() {
		let network = NetworkConfig {
			name: "local".to_string(),
			rpc_url: "http://127.0.0.1:8545".to_string(),
			explorer_url: None,
			native_symbol: default_native_symbol(),
		};
		assert!(network.tx_url("0x01").is_none());
	}
}
