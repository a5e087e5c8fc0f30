//! Account management module for the EVM deployer.
//!
//! This module provides abstractions for the key that authorizes transactions.
//! An account knows its address and can sign a 32-byte hash; attaching that
//! signature to a transaction (and computing `v`) is done here too so callers
//! only ever see fully signed transactions.

use async_trait::async_trait;
use deployer_tx::{ReplayProtection, SignedTransaction, TransactionError, UnsignedTransaction};
use deployer_types::{Address, ConfigSchema, ImplementationRegistry, Signature, B256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub mod signer;

pub use implementations::local::LocalAccount;
pub use signer::{derive_address, recover_address, sign_hash, verifying_key_to_address};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when a public key cannot be recovered from a signature.
	#[error("Recovery failed: {0}")]
	Recovery(String),
	/// The transaction could not be turned into a signing payload.
	#[error("Transaction error: {0}")]
	Transaction(#[from] TransactionError),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for account implementations.
///
/// This trait must be implemented by any account implementation that wants to
/// sign transactions for the deployer.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	///
	/// The schema is used to validate the `[account.implementations.<name>]`
	/// table before the implementation is constructed.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Retrieves the address associated with this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte hash, returning `(r, s, recovery_id)`.
	async fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError>;

	/// Signs a transaction under the given replay-protection scheme.
	///
	/// The default implementation hashes the signing payload and delegates to
	/// [`AccountInterface::sign_hash`].
	async fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
		protection: ReplayProtection,
	) -> Result<SignedTransaction, AccountError> {
		let hash = tx.signing_hash(protection)?;
		let signature = self.sign_hash(&hash).await?;
		Ok(SignedTransaction::new(tx.clone(), &signature, protection)?)
	}
}

/// Type alias for account factory functions.
///
/// This is the function signature that all account implementations must provide
/// to create instances of their account interface.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
///
/// Returns a vector of (name, factory) tuples for all available account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service that manages account operations.
///
/// Each service owns exactly one implementation. Deploying from several
/// wallets means several services; they share nothing.
pub struct AccountService {
	/// The underlying account implementation.
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address associated with the managed account.
	pub async fn address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs a transaction using the managed account.
	pub async fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
		protection: ReplayProtection,
	) -> Result<SignedTransaction, AccountError> {
		self.implementation.sign_transaction(tx, protection).await
	}

	/// Signs a raw 32-byte hash using the managed account.
	pub async fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError> {
		self.implementation.sign_hash(hash).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use deployer_types::{Bytes, SecretString, U256};
	use std::str::FromStr;

	const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn service() -> AccountService {
		let account = LocalAccount::from_secret(&SecretString::from(HARDHAT_KEY)).unwrap();
		AccountService::new(Box::new(account))
	}

	fn dead_transfer() -> UnsignedTransaction {
		UnsignedTransaction {
			nonce: 0,
			gas_price: U256::from(1_000_000_000u64),
			gas_limit: 21000,
			to: Some(Address::from_str("0x000000000000000000000000000000000000dead").unwrap()),
			value: U256::ZERO,
			data: Bytes::new(),
			chain_id: 1,
		}
	}

	#[test]
	fn test_registry_lists_local() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["local"]);
	}

	#[tokio::test]
	async fn test_service_signs_golden_transfer() {
		let signed = service()
			.sign_transaction(&dead_transfer(), ReplayProtection::Eip155)
			.await
			.unwrap();
		assert_eq!(signed.v, 37);
		assert_eq!(
			signed.raw_hex(),
			"0xf86380843b9aca0082520894000000000000000000000000000000000000dead808025a003e958d29a15656af2386b65e621c8201587f1c33f149c8e59ba04ed65d80bc9a068a253689110f83ce4159c0abcffd1a3839f3a5c71e659adcfd29f5dce63bacd"
		);
		assert_eq!(
			signed.hash().to_string(),
			"0x9cdaaa78145ea92c3ab4b010d6b4aab9d07ff348ce4abf1a63212ad29715e44f"
		);
	}

	#[tokio::test]
	async fn test_service_signs_pre_eip155_when_selected() {
		let signed = service()
			.sign_transaction(&dead_transfer(), ReplayProtection::None)
			.await
			.unwrap();
		assert_eq!(signed.v, 27);
		assert_eq!(
			signed.raw_hex(),
			"0xf86380843b9aca0082520894000000000000000000000000000000000000dead80801ba0fe5058b73df433efba7eb8e7957fbeef8ea892d04ce7d557ece5ad3d7db33ba8a07d9537260129dbab788c24711fb4f6f7589ffd77a75900a1671099a7c4275a63"
		);
	}

	#[tokio::test]
	async fn test_signed_transaction_recovers_to_account() {
		let service = service();
		let signed = service
			.sign_transaction(&dead_transfer(), ReplayProtection::Eip155)
			.await
			.unwrap();
		let hash = signed.signing_hash().unwrap();
		let recovered = recover_address(hash.as_slice(), &signed.signature().unwrap()).unwrap();
		assert_eq!(recovered, service.address().await.unwrap());
	}

	#[tokio::test]
	async fn test_sign_transaction_propagates_validation() {
		let tx = UnsignedTransaction {
			gas_limit: 0,
			..dead_transfer()
		};
		let err = service()
			.sign_transaction(&tx, ReplayProtection::Eip155)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AccountError::Transaction(TransactionError::Validation(_))
		));
	}
}
