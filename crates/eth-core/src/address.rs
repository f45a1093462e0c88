use alloy_primitives::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Derives the account address for a secp256k1 public key.
///
/// The address is the last 20 bytes of the Keccak-256 hash of the
/// uncompressed public key (without its 0x04 prefix). It is always computed
/// from the key, never stored independently of it.
pub fn from_public_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Derives the account address owned by a raw 32-byte private key.
pub fn from_private_key(key_bytes: &[u8]) -> Result<Address, EthError> {
    let signing = signing_key(key_bytes)?;
    Ok(from_public_key(signing.verifying_key()))
}

/// Parses and validates raw private-key bytes into a signing key.
pub(crate) fn signing_key(key_bytes: &[u8]) -> Result<SigningKey, EthError> {
    if key_bytes.len() != 32 {
        return Err(EthError::InvalidPrivateKey(format!(
            "expected 32 bytes, got {}",
            key_bytes.len()
        )));
    }

    SigningKey::from_slice(key_bytes)
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))
}
