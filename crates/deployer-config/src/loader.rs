//! Configuration loader for split configuration files.
//!
//! A main file may list other files under a top-level `include` key. Every
//! top-level section must come from exactly one file, so two files can never
//! silently override each other.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Configuration loader that handles multi-file configurations with includes.
pub struct ConfigLoader {
	/// Base path for resolving relative includes
	base_path: PathBuf,
	/// Files already read, to catch an include cycle
	loaded_files: HashSet<PathBuf>,
	/// Which file each top-level section came from
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads a configuration file and all its includes, then validates the
	/// combined result.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;

		let main_content = self.load_file(&config_path).await?;
		let main_toml: toml::Value = toml::from_str(&main_content)?;

		let includes = extract_includes(&main_toml)?;
		if includes.is_empty() {
			return parse_validated(main_toml);
		}

		let combined = self
			.load_and_combine(main_toml, includes, config_path)
			.await?;
		parse_validated(combined)
	}

	/// Reads a file and resolves environment variables in it.
	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical_path = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical_path.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical_path.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	async fn load_and_combine(
		&mut self,
		mut main_toml: toml::Value,
		includes: Vec<PathBuf>,
		main_file_path: PathBuf,
	) -> Result<toml::Value, ConfigError> {
		if let Some(table) = main_toml.as_table_mut() {
			table.remove("include");
			for key in table.keys() {
				self.section_sources
					.insert(key.clone(), main_file_path.clone());
			}
		}

		for include_path in includes {
			let resolved_path = self.resolve_path(&include_path)?;
			let include_content = self.load_file(&resolved_path).await?;
			let include_toml: toml::Value = toml::from_str(&include_content)?;

			let Some(include_table) = include_toml.as_table() else {
				continue;
			};

			if include_table.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"Nested include in {} is not supported",
					resolved_path.display()
				)));
			}

			for key in include_table.keys() {
				if let Some(existing_source) = self.section_sources.get(key) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						key,
						existing_source.display(),
						resolved_path.display()
					)));
				}
				self.section_sources
					.insert(key.clone(), resolved_path.clone());
			}

			if let Some(main_table) = main_toml.as_table_mut() {
				for (key, value) in include_table {
					main_table.insert(key.clone(), value.clone());
				}
			}
		}

		Ok(main_toml)
	}

	/// Resolves a path relative to the base path.
	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();

		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

fn extract_includes(toml: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	let Some(include_value) = toml.get("include") else {
		return Ok(Vec::new());
	};

	if let Some(path_str) = include_value.as_str() {
		return Ok(vec![PathBuf::from(path_str)]);
	}

	let include_array = include_value.as_array().ok_or_else(|| {
		ConfigError::Validation("Include must be a string or array of strings".into())
	})?;

	include_array
		.iter()
		.map(|item| {
			item.as_str().map(PathBuf::from).ok_or_else(|| {
				ConfigError::Validation("Include array must contain only strings".into())
			})
		})
		.collect()
}

/// Environment variables are already resolved at this point, so the value is
/// deserialized directly instead of going back through `FromStr`.
fn parse_validated(value: toml::Value) -> Result<Config, ConfigError> {
	let config: Config = value.try_into()?;
	config.validate()?;
	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const DEPLOYER: &str = r#"
[deployer]
id = "split-deployer"
"#;

	const NETWORKS: &str = r#"
[networks.31337]
name = "Hardhat"
rpc_url = "http://127.0.0.1:8545"

[networks.11155111]
name = "Sepolia"
rpc_url = "https://rpc.sepolia.org"
explorer_url = "https://sepolia.etherscan.io"
"#;

	const ACCOUNT_AND_DELIVERY: &str = r#"
[account]
primary = "local"
[account.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[delivery]
network_ids = [31337, 11155111]
max_attempts = 30
"#;

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		fs::write(
			&config_path,
			format!("{}{}{}", DEPLOYER, NETWORKS, ACCOUNT_AND_DELIVERY),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config(&config_path).await.unwrap();

		assert_eq!(config.deployer.id, "split-deployer");
		assert_eq!(config.networks.len(), 2);
		assert_eq!(config.delivery.max_attempts, 30);
	}

	#[tokio::test]
	async fn test_config_with_includes() {
		let temp_dir = TempDir::new().unwrap();
		let main = format!("include = [\"networks.toml\", \"rest.toml\"]\n{}", DEPLOYER);

		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(temp_dir.path().join("networks.toml"), NETWORKS).unwrap();
		fs::write(temp_dir.path().join("rest.toml"), ACCOUNT_AND_DELIVERY).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.deployer.id, "split-deployer");
		assert_eq!(
			config.network(11155111).and_then(|n| n.explorer_url.as_deref()),
			Some("https://sepolia.etherscan.io")
		);
		assert_eq!(config.account.primary, "local");
	}

	#[tokio::test]
	async fn test_single_string_include() {
		let temp_dir = TempDir::new().unwrap();
		let main = format!(
			"include = \"networks.toml\"\n{}{}",
			DEPLOYER, ACCOUNT_AND_DELIVERY
		);

		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(temp_dir.path().join("networks.toml"), NETWORKS).unwrap();

		let config = Config::from_file(temp_dir.path().join("main.toml").to_str().unwrap())
			.await
			.unwrap();
		assert_eq!(config.networks.len(), 2);
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();
		let main = format!("include = [\"duplicate.toml\"]\n{}", DEPLOYER);

		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(temp_dir.path().join("duplicate.toml"), DEPLOYER).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader
			.load_config("main.toml")
			.await
			.unwrap_err()
			.to_string();

		assert!(error_msg.contains("Duplicate section 'deployer'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let temp_dir = TempDir::new().unwrap();
		let config = format!("include = [\"self.toml\"]\n{}", DEPLOYER);
		fs::write(temp_dir.path().join("self.toml"), config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader
			.load_config("self.toml")
			.await
			.unwrap_err()
			.to_string();

		assert!(error_msg.contains("already loaded"));
	}

	#[tokio::test]
	async fn test_missing_include() {
		let temp_dir = TempDir::new().unwrap();
		let main = format!("include = [\"absent.toml\"]\n{}", DEPLOYER);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let result = loader.load_config("main.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}

	#[tokio::test]
	async fn test_include_must_be_strings() {
		let temp_dir = TempDir::new().unwrap();
		let main = format!("include = [1]\n{}", DEPLOYER);
		fs::write(temp_dir.path().join("main.toml"), main).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader
			.load_config("main.toml")
			.await
			.unwrap_err()
			.to_string();
		assert!(error_msg.contains("only strings"));
	}

	#[tokio::test]
	async fn test_shipped_config_loads() {
		let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/deployer.toml");
		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();
		assert_eq!(config.deployer.id, "local-deployer");
		assert_eq!(config.delivery.network_ids, vec![31337, 11155111]);
		assert!(config.network(11155111).unwrap().explorer_url.is_some());
	}

	#[tokio::test]
	async fn test_env_vars_resolved_in_included_file() {
		std::env::set_var("DEPLOYER_LOADER_RPC", "http://10.0.0.5:8545");
		let temp_dir = TempDir::new().unwrap();
		let main = format!("include = [\"rest.toml\"]\n{}", DEPLOYER);
		let networks = r#"
[networks.31337]
name = "Hardhat"
rpc_url = "${DEPLOYER_LOADER_RPC}"
"#;
		let rest = format!(
			"{}{}",
			networks,
			ACCOUNT_AND_DELIVERY.replace("[31337, 11155111]", "[31337]")
		);

		fs::write(temp_dir.path().join("main.toml"), main).unwrap();
		fs::write(temp_dir.path().join("rest.toml"), rest).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();
		assert_eq!(config.network(31337).unwrap().rpc_url, "http://10.0.0.5:8545");
		std::env::remove_var("DEPLOYER_LOADER_RPC");
	}
}
