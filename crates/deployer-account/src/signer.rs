//! secp256k1 signing, public-key recovery and address derivation.
//!
//! Signatures use RFC 6979 deterministic nonces and are normalized to low `s`
//! (with the recovery id flipped accordingly), so the same key and hash always
//! produce the same `(r, s, recovery_id)`.

use crate::AccountError;
use deployer_types::{public_key_to_address, Address, Signature, U256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};

/// Length of a message hash accepted by the signer.
const HASH_LEN: usize = 32;

/// Parses a 32-byte big-endian scalar into a signing key.
///
/// Fails if the scalar is zero or not below the curve order.
pub fn signing_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, AccountError> {
	if bytes.len() != 32 {
		return Err(AccountError::InvalidKey(format!(
			"private key must be 32 bytes, got {}",
			bytes.len()
		)));
	}
	SigningKey::from_slice(bytes).map_err(|_| {
		AccountError::InvalidKey("private key is zero or not below the curve order".into())
	})
}

/// Address of a public key: last 20 bytes of Keccak-256 over `X || Y`.
pub fn verifying_key_to_address(key: &VerifyingKey) -> Address {
	let point = key.to_encoded_point(false);
	let mut xy = [0u8; 64];
	// skip the 0x04 uncompressed tag
	xy.copy_from_slice(&point.as_bytes()[1..]);
	public_key_to_address(&xy)
}

/// Derives the address controlled by a raw 32-byte private key.
pub fn derive_address(private_key: &[u8]) -> Result<Address, AccountError> {
	let key = signing_key_from_bytes(private_key)?;
	Ok(verifying_key_to_address(key.verifying_key()))
}

/// Signs a 32-byte hash.
pub fn sign_hash(hash: &[u8], key: &SigningKey) -> Result<Signature, AccountError> {
	if hash.len() != HASH_LEN {
		return Err(AccountError::SigningFailed(format!(
			"hash must be {} bytes, got {}",
			HASH_LEN,
			hash.len()
		)));
	}
	let (signature, recovery_id) = key
		.sign_prehash_recoverable(hash)
		.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
	let bytes = signature.to_bytes();
	Ok(Signature {
		r: U256::from_be_slice(&bytes[..32]),
		s: U256::from_be_slice(&bytes[32..]),
		recovery_id: recovery_id.to_byte(),
	})
}

/// Recovers the signer address from a hash and signature.
pub fn recover_address(hash: &[u8], signature: &Signature) -> Result<Address, AccountError> {
	if hash.len() != HASH_LEN {
		return Err(AccountError::Recovery(format!(
			"hash must be {} bytes, got {}",
			HASH_LEN,
			hash.len()
		)));
	}
	let recovery_id = RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| {
		AccountError::Recovery(format!("invalid recovery id {}", signature.recovery_id))
	})?;
	let ecdsa = EcdsaSignature::from_slice(&signature.to_compact())
		.map_err(|e| AccountError::Recovery(e.to_string()))?;
	let key = VerifyingKey::recover_from_prehash(hash, &ecdsa, recovery_id)
		.map_err(|e| AccountError::Recovery(e.to_string()))?;
	Ok(verifying_key_to_address(&key))
}
