//! Unsigned transaction assembly and the pre-signature payload.

use crate::TransactionError;
use alloy_primitives::{Address, Bytes, B256, U256};
use deployer_rlp::{encode_bytes, encode_list, encode_u64, encode_uint};
use deployer_types::keccak256;
use serde::{Deserialize, Serialize};

/// How the chain id is bound into a signature.
///
/// EIP-155 is the default. Pre-EIP-155 signatures can be replayed on every
/// chain that shares the sender's nonce, so that mode has to be chosen
/// explicitly in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayProtection {
	/// `v = chain_id * 2 + 35 + recovery_id`, payload carries `[chain_id, "", ""]`.
	#[default]
	Eip155,
	/// `v = 27 + recovery_id`, payload is the six bare fields.
	None,
}

impl ReplayProtection {
	/// Computes the `v` value for a recovery id under this scheme.
	pub fn v(&self, chain_id: u64, recovery_id: u8) -> Result<u64, TransactionError> {
		if recovery_id > 1 {
			return Err(TransactionError::Validation(format!(
				"recovery id must be 0 or 1, got {}",
				recovery_id
			)));
		}
		match self {
			ReplayProtection::Eip155 => chain_id
				.checked_mul(2)
				.and_then(|v| v.checked_add(35 + u64::from(recovery_id)))
				.ok_or_else(|| {
					TransactionError::Validation(format!("chain id {} too large", chain_id))
				}),
			ReplayProtection::None => Ok(27 + u64::from(recovery_id)),
		}
	}
}

/// The six signed fields of a legacy transaction plus the chain it targets.
///
/// `to == None` marks a contract-creation transaction; `data` is then the
/// init code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
	pub nonce: u64,
	pub gas_price: U256,
	pub gas_limit: u64,
	pub to: Option<Address>,
	pub value: U256,
	pub data: Bytes,
	pub chain_id: u64,
}

impl UnsignedTransaction {
	/// Whether this transaction deploys a contract.
	pub fn is_create(&self) -> bool {
		self.to.is_none()
	}

	/// Upper bound on what the sender pays: `gas_price * gas_limit + value`.
	pub fn max_cost(&self) -> U256 {
		self.gas_price
			.saturating_mul(U256::from(self.gas_limit))
			.saturating_add(self.value)
	}

	/// Checks the fields the node would otherwise reject after a round trip.
	pub fn validate(&self, protection: ReplayProtection) -> Result<(), TransactionError> {
		if self.gas_limit == 0 {
			return Err(TransactionError::Validation(
				"gas_limit must be greater than 0".into(),
			));
		}
		if protection == ReplayProtection::Eip155 && self.chain_id == 0 {
			return Err(TransactionError::Validation(
				"chain_id must be non-zero for EIP-155 signing".into(),
			));
		}
		Ok(())
	}

	/// RLP items for `[nonce, gasPrice, gasLimit, to, value, data]`.
	///
	/// `to` is the empty string for contract creation, never the zero address.
	pub(crate) fn encoded_fields(&self) -> Vec<Vec<u8>> {
		vec![
			encode_u64(self.nonce),
			encode_uint(self.gas_price),
			encode_u64(self.gas_limit),
			match &self.to {
				Some(to) => encode_bytes(to.as_slice()),
				None => encode_bytes(&[]),
			},
			encode_uint(self.value),
			encode_bytes(&self.data),
		]
	}

	/// Builds the payload whose Keccak-256 hash is signed.
	///
	/// With EIP-155 this is `[nonce, gasPrice, gasLimit, to, value, data,
	/// chainId, "", ""]`, the two empty strings standing in for `r` and `s`.
	pub fn signing_payload(
		&self,
		protection: ReplayProtection,
	) -> Result<Vec<u8>, TransactionError> {
		self.validate(protection)?;
		let mut fields = self.encoded_fields();
		if protection == ReplayProtection::Eip155 {
			fields.push(encode_u64(self.chain_id));
			fields.push(encode_bytes(&[]));
			fields.push(encode_bytes(&[]));
		}
		Ok(encode_list(&fields))
	}

	/// Keccak-256 of the signing payload.
	pub fn signing_hash(&self, protection: ReplayProtection) -> Result<B256, TransactionError> {
		Ok(keccak256(self.signing_payload(protection)?))
	}
}
