//! Signature types shared between the signer and the transaction encoder.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A recoverable secp256k1 ECDSA signature.
///
/// `r` and `s` are kept as integers because RLP encodes them as minimal-length
/// integers rather than fixed 32-byte strings. `recovery_id` is the parity of
/// the ephemeral point and is always 0 or 1 once `s` has been normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
	pub r: U256,
	pub s: U256,
	pub recovery_id: u8,
}

impl Signature {
	/// Returns the 64-byte `r || s` compact form.
	pub fn to_compact(&self) -> [u8; 64] {
		let mut out = [0u8; 64];
		out[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
		out[32..].copy_from_slice(&self.s.to_be_bytes::<32>());
		out
	}
}
