//! Keccak-256 hashing.
//!
//! Ethereum uses the original Keccak submission padding (`0x01`), not the
//! NIST SHA3-256 padding (`0x06`). The two produce different digests for every
//! input, so `sha3::Sha3_256` must never be used here.

use alloy_primitives::{Address, B256};
use sha3::{Digest, Keccak256};

/// Computes the Keccak-256 digest of `input`.
pub fn keccak256(input: impl AsRef<[u8]>) -> B256 {
	let mut hasher = Keccak256::new();
	hasher.update(input.as_ref());
	B256::from_slice(&hasher.finalize())
}

/// Derives an Ethereum address from an uncompressed public key.
///
/// `public_key` is the 64-byte `X || Y` encoding without the leading `0x04`
/// tag. The address is the last 20 bytes of its Keccak-256 digest.
pub fn public_key_to_address(public_key: &[u8; 64]) -> Address {
	let digest = keccak256(public_key);
	Address::from_slice(&digest[12..])
}

#[cfg(test)]
mod tests {
	use super::*;
	use sha3::Sha3_256;

	#[test]
	fn test_keccak_empty_input() {
		assert_eq!(
			hex::encode(keccak256(b"")),
			"c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
		);
	}

	#[test]
	fn test_keccak_differs_from_nist_sha3() {
		let nist = Sha3_256::digest(b"");
		assert_eq!(
			hex::encode(nist),
			"a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
		);
		assert_ne!(keccak256(b"").as_slice(), nist.as_slice());
	}

	#[test]
	fn test_keccak_known_string() {
		assert_eq!(
			hex::encode(keccak256(b"hello")),
			"1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
		);
	}

	#[test]
	fn test_address_takes_last_twenty_bytes() {
		let key = [0x11u8; 64];
		let digest = keccak256(key);
		assert_eq!(public_key_to_address(&key).as_slice(), &digest[12..]);
	}
}
