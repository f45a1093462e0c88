use alloy_primitives::{Address, U256};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use zeroize::Zeroizing;

use crate::address;
use crate::error::EthError;

/// Length of the message hashes this signer accepts.
pub const HASH_LEN: usize = 32;

/// A recoverable secp256k1 signature over a 32-byte hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: U256,
    pub s: U256,
    pub y_parity: bool,
}

impl Signature {
    /// Replay-protected recovery value: `chain_id * 2 + 35 + y_parity`
    /// (EIP-155), binding the signature to one network.
    pub fn v(&self, chain_id: u64) -> u64 {
        chain_id * 2 + 35 + self.y_parity as u64
    }
}

/// Signs a 32-byte message hash with the given private key.
///
/// Signing is deterministic (RFC 6979 nonces), so the same key and hash
/// always produce the same signature. The hash is signed as supplied; no
/// prefixing or re-hashing happens here.
pub fn sign_hash(private_key: &[u8], hash: &[u8]) -> Result<Signature, EthError> {
    if hash.len() != HASH_LEN {
        return Err(EthError::InvalidHash(hash.len()));
    }

    let signing_key = address::signing_key(private_key)?;
    let (signature, recovery_id): (EcdsaSignature, RecoveryId) = signing_key
        .sign_prehash(hash)
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    Ok(Signature {
        r: U256::from_be_slice(signature.r().to_bytes().as_slice()),
        s: U256::from_be_slice(signature.s().to_bytes().as_slice()),
        y_parity: recovery_id.is_y_odd(),
    })
}

/// Recovers the signer's address from a hash and its signature.
pub fn recover_address(hash: &[u8], signature: &Signature) -> Result<Address, EthError> {
    if hash.len() != HASH_LEN {
        return Err(EthError::InvalidHash(hash.len()));
    }

    let sig = EcdsaSignature::from_scalars(
        signature.r.to_be_bytes::<32>(),
        signature.s.to_be_bytes::<32>(),
    )
    .map_err(|e| EthError::RecoveryError(e.to_string()))?;

    let recovery_id = RecoveryId::from_byte(signature.y_parity as u8)
        .ok_or_else(|| EthError::RecoveryError("invalid recovery id".into()))?;

    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| EthError::RecoveryError(e.to_string()))?;

    Ok(address::from_public_key(&key))
}

/// Parses a hex-encoded private key (with or without 0x prefix) into a
/// zeroized-on-drop byte buffer.
pub fn key_from_hex(text: &str) -> Result<Zeroizing<[u8; 32]>, EthError> {
    let stripped = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let mut key = Zeroizing::new([0u8; 32]);
    hex::decode_to_slice(stripped, key.as_mut_slice())
        .map_err(|e| EthError::InvalidPrivateKey(format!("invalid hex: {e}")))?;

    Ok(key)
}
