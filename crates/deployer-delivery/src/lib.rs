//! Transaction delivery module for the EVM deployer.
//!
//! This module handles the submission and monitoring of signed legacy
//! transactions. A [`DeliveryInterface`] is the narrow view of one node that
//! the engine needs (nonce, gas price, balance, raw submission, receipts), and
//! [`DeliveryService`] drives a transaction through
//! `Built → Signed → Broadcast → Pending → {Confirmed, Reverted, TimedOut}`.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use deployer_account::AccountError;
use deployer_tx::TransactionError;
use deployer_types::{
	ConfigSchema, ImplementationRegistry, NetworkConfig, TransactionHash, TransactionReceipt,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod rpc;
	}
}

pub mod clock;
pub mod engine;

pub use clock::{Clock, RecordingClock, TokioClock};
pub use engine::{
	ConfirmationOutcome, DeliveryReport, DeliveryService, DeliverySettings, PredictionMismatch,
	ProbeResult, SubmissionState, TransactionRequest,
};
pub use implementations::evm::rpc::HttpRpcDelivery;

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// The account cannot cover `gas_price * gas_limit + value`.
	#[error("Insufficient funds: required {required} wei, available {available} wei")]
	InsufficientFunds { required: U256, available: U256 },
	/// The node refused the raw transaction.
	#[error("Broadcast rejected ({code}): {message}")]
	BroadcastRejected { code: i64, message: String },
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The node answered with something that is not a valid JSON-RPC result.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// The node returned a JSON-RPC error object.
	#[error("RPC error ({code}): {message}")]
	Rpc { code: i64, message: String },
	/// Error building or encoding the transaction.
	#[error("Transaction error: {0}")]
	Transaction(#[from] TransactionError),
	/// Error from the signing account.
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
	/// The signature does not recover to the sending account.
	#[error("Signature recovers to {recovered}, expected {expected}")]
	SignerMismatch { expected: Address, recovered: Address },
	/// Error that occurs when no suitable provider is available for the operation.
	#[error("No provider available")]
	NoProviderAvailable,
	/// The node accepted the transaction but polling for its receipt failed.
	/// The transaction may still land under `hash`.
	#[error("Transaction {hash} was broadcast but confirmation failed: {source}")]
	Unconfirmed {
		hash: TransactionHash,
		#[source]
		source: Box<DeliveryError>,
	},
}

/// Trait defining the interface for node providers.
///
/// One instance talks to exactly one network. Every method is a single
/// request; retries and polling live in [`DeliveryService`].
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Returns the configuration schema for this delivery implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// The chain id the node reports (`eth_chainId`).
	async fn chain_id(&self) -> Result<u64, DeliveryError>;

	/// Next nonce for `address` (`eth_getTransactionCount(address, "latest")`).
	async fn nonce(&self, address: &Address) -> Result<u64, DeliveryError>;

	/// Current suggested gas price in wei (`eth_gasPrice`).
	async fn gas_price(&self) -> Result<U256, DeliveryError>;

	/// Balance of `address` in wei (`eth_getBalance(address, "latest")`).
	async fn balance(&self, address: &Address) -> Result<U256, DeliveryError>;

	/// Latest block number (`eth_blockNumber`).
	async fn block_number(&self) -> Result<u64, DeliveryError>;

	/// Submits a raw signed transaction (`eth_sendRawTransaction`).
	///
	/// A node-side rejection is reported as [`DeliveryError::BroadcastRejected`].
	async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TransactionHash, DeliveryError>;

	/// Fetches a receipt (`eth_getTransactionReceipt`). `None` means the
	/// transaction is still pending.
	async fn receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionReceipt>, DeliveryError>;
}

/// Type alias for delivery factory functions.
///
/// Takes the `[delivery]` table and the network the instance will serve.
pub type DeliveryFactory =
	fn(&toml::Value, &NetworkConfig) -> Result<Box<dyn DeliveryInterface>, DeliveryError>;

/// Registry trait for delivery implementations.
pub trait DeliveryRegistry: ImplementationRegistry<Factory = DeliveryFactory> {}

/// Get all registered delivery implementations.
pub fn get_all_implementations() -> Vec<(&'static str, DeliveryFactory)> {
	use implementations::evm::rpc;

	vec![(rpc::Registry::NAME, rpc::Registry::factory())]
}
