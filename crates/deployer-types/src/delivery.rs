//! Transaction delivery types for the deployer.
//!
//! This module defines types related to blockchain transaction submission
//! and monitoring, including transaction hashes and receipts.

use alloy_primitives::{Address, B256};
use std::fmt;

/// Blockchain transaction hash representation.
///
/// The Keccak-256 digest of the raw signed transaction bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TransactionHash(pub B256);

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

impl From<B256> for TransactionHash {
	fn from(hash: B256) -> Self {
		Self(hash)
	}
}

/// Transaction receipt containing execution details.
///
/// Receipts are produced exclusively by the node; the deployer only parses and
/// validates them. `block_number` is absent while a node reports a receipt for
/// a transaction that is not yet in a canonical block.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: Option<u64>,
	/// Gas consumed by the transaction.
	pub gas_used: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Address of the created contract, present only for creation transactions.
	pub contract_address: Option<Address>,
}

/// Chain data structure containing current blockchain state information.
///
/// A snapshot of the values the builder needs to assemble a transaction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChainData {
	/// The chain ID reported by the node.
	pub chain_id: u64,
	/// Current gas price in wei.
	pub gas_price: alloy_primitives::U256,
	/// Latest block number.
	pub block_number: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transaction_hash_display() {
		let hash = TransactionHash(B256::repeat_byte(0xab));
		let shown = hash.to_string();
		assert!(shown.starts_with("0xabab"));
		assert_eq!(shown.len(), 66);
	}
}
