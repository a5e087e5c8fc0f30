//! Configuration module for the EVM deployer.
//!
//! This module provides structures and utilities for loading and validating
//! the deployer's TOML configuration. Configuration files may pull in other
//! files through a top-level `include` array and may reference environment
//! variables with `${VAR}` or `${VAR:-default}`.

mod loader;

pub mod builders;

pub use builders::config::ConfigBuilder;
pub use loader::ConfigLoader;

use deployer_tx::ReplayProtection;
use deployer_types::networks::deserialize_networks;
use deployer_types::NetworksConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration processing.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Parse error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the deployer.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Identity of this deployer instance, used in logs.
	pub deployer: DeployerConfig,
	/// Networks the deployer knows about, keyed by chain id.
	#[serde(deserialize_with = "deserialize_networks")]
	pub networks: NetworksConfig,
	/// Signing account configuration.
	pub account: AccountConfig,
	/// Submission and confirmation settings.
	pub delivery: DeliveryConfig,
}

/// Identity of the deployer instance.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployerConfig {
	pub id: String,
}

/// Configuration for the signing account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
	/// Which implementation from `implementations` signs transactions.
	pub primary: String,
	/// Per-implementation settings, passed verbatim to the factory.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

impl AccountConfig {
	/// The configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Configuration for transaction submission and confirmation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
	/// Chain ids a node client is created for. Each must appear in `networks`.
	pub network_ids: Vec<u64>,
	/// Delay between receipt polls.
	#[serde(default = "default_poll_interval_seconds")]
	pub poll_interval_seconds: u64,
	/// Receipt polls before giving up with a timeout.
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	/// Per-request HTTP timeout for JSON-RPC calls.
	#[serde(default = "default_request_timeout_seconds")]
	pub request_timeout_seconds: u64,
	/// Refuse to sign when the balance cannot cover the worst-case cost.
	#[serde(default = "default_check_balance")]
	pub check_balance: bool,
	/// Signature scheme. `none` produces pre-EIP-155 signatures.
	#[serde(default)]
	pub replay_protection: ReplayProtection,
}

fn default_poll_interval_seconds() -> u64 {
	2
}

fn default_max_attempts() -> u32 {
	60
}

fn default_request_timeout_seconds() -> u64 {
	10
}

fn default_check_balance() -> bool {
	true
}

impl DeliveryConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_seconds)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_seconds)
	}

	/// The `[delivery]` section as a TOML value, in the shape delivery
	/// factories accept.
	pub fn as_table(&self) -> Result<toml::Value, ConfigError> {
		toml::Value::try_from(self).map_err(|e| ConfigError::Parse(e.to_string()))
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply back to front so earlier offsets stay valid
	for (start, end, value) in replacements.into_iter().rev() {
		result.replace_range(start..end, &value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following any `include` entries.
	pub async fn from_file(file_path: &str) -> Result<Self, ConfigError> {
		let path = Path::new(file_path);
		let base_path = path.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_path);
		let file_name = path
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", file_path)))?;
		loader.load_config(file_name).await
	}

	/// The network a chain id refers to, if configured.
	pub fn network(&self, chain_id: u64) -> Option<&deployer_types::NetworkConfig> {
		self.networks.get(&chain_id)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// This method performs comprehensive validation across all configuration sections:
	/// - Ensures the deployer id is not empty
	/// - Validates every network has a non-zero chain id and an HTTP(S) RPC URL
	/// - Checks that the primary account implementation is configured
	/// - Verifies that every delivery network is defined in `networks`
	/// - Keeps polling and timeout settings within sane bounds
	fn validate(&self) -> Result<(), ConfigError> {
		if self.deployer.id.trim().is_empty() {
			return Err(ConfigError::Validation(
				"Deployer ID cannot be empty".into(),
			));
		}

		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"At least one network must be configured".into(),
			));
		}

		for (chain_id, network) in &self.networks {
			if *chain_id == 0 {
				return Err(ConfigError::Validation(
					"Chain id 0 is not a valid network".into(),
				));
			}
			if network.name.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} must have a name",
					chain_id
				)));
			}
			if !(network.rpc_url.starts_with("http://") || network.rpc_url.starts_with("https://"))
			{
				return Err(ConfigError::Validation(format!(
					"Network {} rpc_url must be an http(s) URL, got '{}'",
					chain_id, network.rpc_url
				)));
			}
		}

		if self.account.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Account primary implementation cannot be empty".into(),
			));
		}
		if self.account.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary account '{}' not found in implementations",
				self.account.primary
			)));
		}

		let delivery = &self.delivery;
		if delivery.network_ids.is_empty() {
			return Err(ConfigError::Validation(
				"delivery.network_ids cannot be empty".into(),
			));
		}
		let mut seen = HashSet::new();
		for chain_id in &delivery.network_ids {
			if !seen.insert(*chain_id) {
				return Err(ConfigError::Validation(format!(
					"Duplicate network {} in delivery.network_ids",
					chain_id
				)));
			}
			if !self.networks.contains_key(chain_id) {
				return Err(ConfigError::Validation(format!(
					"Delivery network {} is not defined in networks",
					chain_id
				)));
			}
		}

		if !(1..=60).contains(&delivery.poll_interval_seconds) {
			return Err(ConfigError::Validation(format!(
				"poll_interval_seconds must be between 1 and 60, got {}",
				delivery.poll_interval_seconds
			)));
		}
		if !(1..=10_000).contains(&delivery.max_attempts) {
			return Err(ConfigError::Validation(format!(
				"max_attempts must be between 1 and 10000, got {}",
				delivery.max_attempts
			)));
		}
		if !(1..=300).contains(&delivery.request_timeout_seconds) {
			return Err(ConfigError::Validation(format!(
				"request_timeout_seconds must be between 1 and 300, got {}",
				delivery.request_timeout_seconds
			)));
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// This allows configuration to be parsed from TOML strings using the standard
/// string parsing interface. Environment variables are resolved and the
/// configuration is validated.
impl std::str::FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
