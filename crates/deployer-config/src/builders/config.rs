//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{AccountConfig, Config, DeliveryConfig, DeployerConfig};
use deployer_tx::ReplayProtection;
use deployer_types::NetworkConfig;
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to a single local Hardhat network (chain 31337) signed by the
/// first Hardhat development key. The built value is not validated.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	deployer_id: String,
	networks: HashMap<u64, NetworkConfig>,
	private_key: String,
	network_ids: Option<Vec<u64>>,
	poll_interval_seconds: u64,
	max_attempts: u32,
	request_timeout_seconds: u64,
	check_balance: bool,
	replay_protection: ReplayProtection,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		let mut networks = HashMap::new();
		networks.insert(
			31337,
			NetworkConfig {
				name: "Hardhat".to_string(),
				rpc_url: "http://127.0.0.1:8545".to_string(),
				explorer_url: None,
				native_symbol: "ETH".to_string(),
			},
		);

		Self {
			deployer_id: "test-deployer".to_string(),
			networks,
			private_key: "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
				.to_string(),
			network_ids: None,
			poll_interval_seconds: 2,
			max_attempts: 60,
			request_timeout_seconds: 10,
			check_balance: true,
			replay_protection: ReplayProtection::Eip155,
		}
	}

	/// Sets the deployer ID.
	pub fn deployer_id(mut self, id: impl Into<String>) -> Self {
		self.deployer_id = id.into();
		self
	}

	/// Adds or replaces a network.
	pub fn network(mut self, chain_id: u64, name: &str, rpc_url: &str) -> Self {
		self.networks.insert(
			chain_id,
			NetworkConfig {
				name: name.to_string(),
				rpc_url: rpc_url.to_string(),
				explorer_url: None,
				native_symbol: "ETH".to_string(),
			},
		);
		self
	}

	/// Points the default Hardhat network at another RPC endpoint.
	pub fn rpc_url(self, rpc_url: &str) -> Self {
		self.network(31337, "Hardhat", rpc_url)
	}

	/// Sets the hex private key of the local account.
	pub fn private_key(mut self, key: impl Into<String>) -> Self {
		self.private_key = key.into();
		self
	}

	/// Restricts delivery to these chains. Defaults to every configured network.
	pub fn network_ids(mut self, ids: Vec<u64>) -> Self {
		self.network_ids = Some(ids);
		self
	}

	pub fn poll_interval_seconds(mut self, seconds: u64) -> Self {
		self.poll_interval_seconds = seconds;
		self
	}

	pub fn max_attempts(mut self, attempts: u32) -> Self {
		self.max_attempts = attempts;
		self
	}

	pub fn check_balance(mut self, check: bool) -> Self {
		self.check_balance = check;
		self
	}

	pub fn replay_protection(mut self, protection: ReplayProtection) -> Self {
		self.replay_protection = protection;
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		let network_ids = self.network_ids.unwrap_or_else(|| {
			let mut ids: Vec<u64> = self.networks.keys().copied().collect();
			ids.sort_unstable();
			ids
		});

		let mut local = toml::map::Map::new();
		local.insert(
			"private_key".to_string(),
			toml::Value::String(self.private_key),
		);
		let mut implementations = HashMap::new();
		implementations.insert("local".to_string(), toml::Value::Table(local));

		Config {
			deployer: DeployerConfig {
				id: self.deployer_id,
			},
			networks: self.networks,
			account: AccountConfig {
				primary: "local".to_string(),
				implementations,
			},
			delivery: DeliveryConfig {
				network_ids,
				poll_interval_seconds: self.poll_interval_seconds,
				max_attempts: self.max_attempts,
				request_timeout_seconds: self.request_timeout_seconds,
				check_balance: self.check_balance,
				replay_protection: self.replay_protection,
			},
		}
	}
}
