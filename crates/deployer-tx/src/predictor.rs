//! `CREATE` address prediction.

use alloy_primitives::Address;
use deployer_rlp::{encode_bytes, encode_list, encode_u64};
use deployer_types::keccak256;

/// Address of the contract created by `sender` at `nonce`.
///
/// The last 20 bytes of `keccak256(rlp([sender, nonce]))`. A nonce of zero is
/// encoded as the empty string like any other zero integer.
pub fn predict_contract_address(sender: &Address, nonce: u64) -> Address {
	let encoded = encode_list(&[encode_bytes(sender.as_slice()), encode_u64(nonce)]);
	Address::from_slice(&keccak256(encoded)[12..])
}
