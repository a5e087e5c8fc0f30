//! The signed nine-field transaction that goes over the wire.

use crate::{ReplayProtection, TransactionError, UnsignedTransaction};
use alloy_primitives::{Address, Bytes, B256, U256};
use deployer_rlp::{decode, encode_list, encode_u64, encode_uint, RlpError};
use deployer_types::{keccak256, Signature, TransactionHash};

/// Number of list elements in a signed legacy transaction.
const SIGNED_FIELDS: usize = 9;

/// A legacy transaction together with its `(v, r, s)` signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub tx: UnsignedTransaction,
	pub v: u64,
	pub r: U256,
	pub s: U256,
}

impl SignedTransaction {
	/// Attaches a signature to a transaction, deriving `v` from the recovery id.
	pub fn new(
		tx: UnsignedTransaction,
		signature: &Signature,
		protection: ReplayProtection,
	) -> Result<Self, TransactionError> {
		tx.validate(protection)?;
		let v = protection.v(tx.chain_id, signature.recovery_id)?;
		Ok(Self {
			tx,
			v,
			r: signature.r,
			s: signature.s,
		})
	}

	/// Serializes `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`.
	pub fn encode_raw(&self) -> Vec<u8> {
		let mut fields = self.tx.encoded_fields();
		fields.push(encode_u64(self.v));
		fields.push(encode_uint(self.r));
		fields.push(encode_uint(self.s));
		encode_list(&fields)
	}

	/// The raw transaction as `0x`-prefixed lowercase hex, ready for
	/// `eth_sendRawTransaction`.
	pub fn raw_hex(&self) -> String {
		format!("0x{}", hex::encode(self.encode_raw()))
	}

	/// Keccak-256 of the raw bytes. This is the hash the node reports.
	pub fn hash(&self) -> TransactionHash {
		TransactionHash(keccak256(self.encode_raw()))
	}

	/// Which replay-protection scheme the `v` value encodes.
	pub fn replay_protection(&self) -> ReplayProtection {
		if self.v == 27 || self.v == 28 {
			ReplayProtection::None
		} else {
			ReplayProtection::Eip155
		}
	}

	/// Recovers the 0/1 recovery id from `v`.
	pub fn recovery_id(&self) -> Result<u8, TransactionError> {
		let base = match self.replay_protection() {
			ReplayProtection::None => 27,
			ReplayProtection::Eip155 => self
				.tx
				.chain_id
				.checked_mul(2)
				.and_then(|c| c.checked_add(35))
				.ok_or_else(|| TransactionError::Validation("chain id too large".into()))?,
		};
		match self.v.checked_sub(base) {
			Some(id @ (0 | 1)) => Ok(id as u8),
			_ => Err(TransactionError::Validation(format!(
				"v value {} does not match chain id {}",
				self.v, self.tx.chain_id
			))),
		}
	}

	/// The signature as carried by this transaction.
	pub fn signature(&self) -> Result<Signature, TransactionError> {
		Ok(Signature {
			r: self.r,
			s: self.s,
			recovery_id: self.recovery_id()?,
		})
	}

	/// The hash that was signed to produce this transaction.
	pub fn signing_hash(&self) -> Result<B256, TransactionError> {
		self.tx.signing_hash(self.replay_protection())
	}

	/// Parses a raw signed legacy transaction.
	///
	/// The chain id is reconstructed from `v`. Transactions signed without
	/// replay protection decode with a chain id of 0.
	pub fn decode_raw(raw: &[u8]) -> Result<Self, TransactionError> {
		let item = decode(raw)?;
		let fields = item.as_list()?;
		if fields.len() != SIGNED_FIELDS {
			return Err(RlpError::UnexpectedLength {
				expected: SIGNED_FIELDS,
				found: fields.len(),
			}
			.into());
		}

		let to_bytes = fields[3].as_bytes()?;
		let to = match to_bytes.len() {
			0 => None,
			20 => Some(Address::from_slice(to_bytes)),
			n => {
				return Err(TransactionError::Validation(format!(
					"recipient must be empty or 20 bytes, got {}",
					n
				)))
			},
		};

		let v = fields[6].as_u64()?;
		let chain_id = match v {
			27 | 28 => 0,
			v if v >= 35 => (v - 35) / 2,
			v => {
				return Err(TransactionError::Validation(format!(
					"unsupported v value {}",
					v
				)))
			},
		};

		Ok(Self {
			tx: UnsignedTransaction {
				nonce: fields[0].as_u64()?,
				gas_price: fields[1].as_uint()?,
				gas_limit: fields[2].as_u64()?,
				to,
				value: fields[4].as_uint()?,
				data: Bytes::copy_from_slice(fields[5].as_bytes()?),
				chain_id,
			},
			v,
			r: fields[7].as_uint()?,
			s: fields[8].as_uint()?,
		})
	}
}
