//! Legacy (non-typed) Ethereum transactions.
//!
//! This crate assembles the six transaction fields, produces the payload that
//! gets hashed and signed, serializes the signed nine-field form that is
//! broadcast with `eth_sendRawTransaction`, and predicts `CREATE` addresses.
//! Signing itself lives in the account crate.

use deployer_rlp::RlpError;
use thiserror::Error;

pub mod builder;
pub mod predictor;
pub mod signed;

pub use builder::{ReplayProtection, UnsignedTransaction};
pub use predictor::predict_contract_address;
pub use signed::SignedTransaction;

/// Errors that can occur while building or decoding transactions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
	/// A transaction field has a value the network would reject.
	#[error("Validation failed: {0}")]
	Validation(String),
	/// A raw transaction could not be decoded.
	#[error("Decoding failed: {0}")]
	Decoding(#[from] RlpError),
}
