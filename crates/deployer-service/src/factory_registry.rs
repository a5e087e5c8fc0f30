//! Factory registry for deployer implementations.
//!
//! Account and delivery implementations register themselves through their
//! crate's `get_all_implementations`. This module looks them up by the names
//! used in the configuration and wires a [`DeliveryService`].

use deployer_account::{AccountFactory, AccountService};
use deployer_config::{Config, DeliveryConfig};
use deployer_delivery::{DeliveryFactory, DeliveryInterface, DeliveryService, DeliverySettings};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Delivery implementation used for every configured network.
const DELIVERY_IMPLEMENTATION: &str = "json_rpc";

/// Registered implementation factories, keyed by configuration name.
pub struct FactoryRegistry {
	pub account: HashMap<String, AccountFactory>,
	pub delivery: HashMap<String, DeliveryFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			account: HashMap::new(),
			delivery: HashMap::new(),
		}
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}

	pub fn register_delivery(&mut self, name: impl Into<String>, factory: DeliveryFactory) {
		self.delivery.insert(name.into(), factory);
	}

	fn account_factory(&self, name: &str) -> Result<AccountFactory, Box<dyn std::error::Error>> {
		self.account
			.get(name)
			.copied()
			.ok_or_else(|| unknown("account", name, self.account.keys()))
	}

	fn delivery_factory(&self, name: &str) -> Result<DeliveryFactory, Box<dyn std::error::Error>> {
		self.delivery
			.get(name)
			.copied()
			.ok_or_else(|| unknown("delivery", name, self.delivery.keys()))
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

fn unknown<'a>(
	kind: &str,
	name: &str,
	available: impl Iterator<Item = &'a String>,
) -> Box<dyn std::error::Error> {
	let mut available: Vec<_> = available.cloned().collect();
	available.sort();
	format!(
		"Unknown {} implementation '{}'. Available: [{}]",
		kind,
		name,
		available.join(", ")
	)
	.into()
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global factory registry, filling it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in deployer_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		for (name, factory) in deployer_delivery::get_all_implementations() {
			tracing::debug!("Registering delivery implementation: {}", name);
			registry.register_delivery(name, factory);
		}

		registry
	})
}

/// Engine settings derived from the `[delivery]` section.
pub fn delivery_settings(config: &DeliveryConfig) -> DeliverySettings {
	DeliverySettings {
		poll_interval: config.poll_interval(),
		max_attempts: config.max_attempts,
		check_balance: config.check_balance,
		replay_protection: config.replay_protection,
	}
}

/// Instantiates the primary account implementation.
pub fn build_account(
	registry: &FactoryRegistry,
	config: &Config,
) -> Result<Arc<AccountService>, Box<dyn std::error::Error>> {
	let primary = &config.account.primary;
	let factory = registry.account_factory(primary)?;
	let account_config = config
		.account
		.primary_config()
		.ok_or_else(|| format!("Missing configuration for account '{}'", primary))?;

	let account = factory(account_config)?;
	Ok(Arc::new(AccountService::new(account)))
}

/// Builds the delivery service with one node client per configured network,
/// in the order of `delivery.network_ids`.
pub fn build_delivery_service(
	registry: &FactoryRegistry,
	config: &Config,
) -> Result<DeliveryService, Box<dyn std::error::Error>> {
	let account = build_account(registry, config)?;
	let factory = registry.delivery_factory(DELIVERY_IMPLEMENTATION)?;
	let delivery_table = config.delivery.as_table()?;

	let mut providers: Vec<(u64, Box<dyn DeliveryInterface>)> = Vec::new();
	for chain_id in &config.delivery.network_ids {
		let network = config
			.network(*chain_id)
			.ok_or_else(|| format!("Network {} is not configured", chain_id))?;
		let provider = factory(&delivery_table, network)?;
		providers.push((*chain_id, provider));
	}

	tracing::info!(
		deployer = %config.deployer.id,
		networks = providers.len(),
		"Built delivery service"
	);

	Ok(DeliveryService::new(
		providers,
		config.networks.clone(),
		account,
		delivery_settings(&config.delivery),
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use deployer_config::ConfigBuilder;
	use deployer_tx::ReplayProtection;
	use std::time::Duration;

	#[test]
	fn test_registry_has_builtin_implementations() {
		let registry = get_registry();
		assert!(registry.account.contains_key("local"));
		assert!(registry.delivery.contains_key("json_rpc"));
	}

	#[test]
	fn test_settings_follow_config() {
		let config = ConfigBuilder::new()
			.poll_interval_seconds(5)
			.max_attempts(12)
			.check_balance(false)
			.replay_protection(ReplayProtection::None)
			.build();
		let settings = delivery_settings(&config.delivery);
		assert_eq!(settings.poll_interval, Duration::from_secs(5));
		assert_eq!(settings.max_attempts, 12);
		assert!(!settings.check_balance);
		assert_eq!(settings.replay_protection, ReplayProtection::None);
	}

	#[tokio::test]
	async fn test_build_account_from_config() {
		let config = ConfigBuilder::new().build();
		let account = build_account(get_registry(), &config).unwrap();
		assert_eq!(
			account.address().await.unwrap().to_checksum(None),
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
		);
	}

	#[test]
	fn test_unknown_account_implementation() {
		let mut config = ConfigBuilder::new().build();
		config.account.primary = "hsm".to_string();
		let err = build_account(get_registry(), &config).err().unwrap();
		assert_eq!(
			err.to_string(),
			"Unknown account implementation 'hsm'. Available: [local]"
		);
	}

	#[test]
	fn test_invalid_private_key_is_reported() {
		let config = ConfigBuilder::new().private_key("0x1234").build();
		assert!(build_account(get_registry(), &config).is_err());
	}

	#[test]
	fn test_delivery_service_keeps_network_order() {
		let config = ConfigBuilder::new()
			.network(11155111, "Sepolia", "https://rpc.sepolia.org")
			.network_ids(vec![11155111, 31337])
			.build();
		let service = build_delivery_service(get_registry(), &config).unwrap();
		assert_eq!(service.network_ids(), vec![11155111, 31337]);
	}
}
