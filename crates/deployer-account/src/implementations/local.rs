//! Local private-key account.
//!
//! The key is supplied as a hex string (usually through `${PRIVATE_KEY}` in
//! the configuration file) and held as a k256 `SigningKey`, which zeroes its
//! scalar on drop. Neither the key nor its hex form is ever logged.

use crate::{
	signer::{sign_hash, signing_key_from_bytes, verifying_key_to_address},
	AccountError, AccountFactory, AccountInterface, AccountRegistry,
};
use async_trait::async_trait;
use deployer_types::{
	Address, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, SecretString,
	Signature, ValidationError, B256,
};
use k256::ecdsa::SigningKey;
use std::fmt;
use zeroize::Zeroizing;

/// An account backed by an in-memory secp256k1 key.
pub struct LocalAccount {
	key: SigningKey,
	address: Address,
}

impl fmt::Debug for LocalAccount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LocalAccount")
			.field("address", &self.address)
			.finish_non_exhaustive()
	}
}

impl LocalAccount {
	/// Builds an account from a hex-encoded private key, with or without `0x`.
	pub fn from_secret(secret: &SecretString) -> Result<Self, AccountError> {
		let bytes = secret
			.decode_hex()
			.map_err(|_| AccountError::InvalidKey("private key is not valid hex".into()))?;
		let key = signing_key_from_bytes(&bytes)?;
		let address = verifying_key_to_address(key.verifying_key());
		Ok(Self { key, address })
	}

	/// Generates a fresh random key, returning the account and the key's
	/// `0x`-prefixed hex so the caller can store it.
	pub fn generate() -> (Self, SecretString) {
		let key = SigningKey::random(&mut rand::rngs::OsRng);
		let bytes = Zeroizing::new(key.to_bytes().to_vec());
		let secret = SecretString::new(format!("0x{}", hex::encode(bytes.as_slice())));
		let address = verifying_key_to_address(key.verifying_key());
		(Self { key, address }, secret)
	}

	/// The address controlled by this key.
	pub fn address(&self) -> Address {
		self.address
	}
}

/// Configuration schema for the local account.
pub struct LocalAccountSchema;

impl LocalAccountSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for LocalAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new(
				"private_key",
				FieldType::HexString { bytes: Some(32) },
			)],
			vec![],
		);
		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalAccountSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.address)
	}

	async fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError> {
		sign_hash(hash.as_slice(), &self.key)
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: 32-byte hex key, `0x` prefix optional
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalAccountSchema::validate_config(config)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".into()))?;

	let account = LocalAccount::from_secret(&SecretString::from(private_key))?;
	tracing::debug!(address = %account.address().to_checksum(None), "Loaded local account");
	Ok(Box::new(account))
}

/// Registry for the local account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}
