use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use zeroize::Zeroizing;

use crate::error::KeystoreError;

/// AES-256-GCM nonce size in bytes.
const NONCE_LEN: usize = 12;

/// Seals key material under a 32-byte symmetric key.
///
/// A random 12-byte nonce is generated per call and prepended:
/// `[nonce | ciphertext + tag]`.
pub fn seal(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, KeystoreError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| KeystoreError::Cipher(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    Ok(sealed)
}

/// Opens data previously sealed with [`seal`], returning the plaintext in a
/// buffer wiped on drop.
///
/// A GCM authentication failure means the key derived from the supplied
/// passphrase is not the one that sealed the record, so it surfaces as
/// [`KeystoreError::WrongPassphrase`].
pub fn open(sealed: &[u8], key: &[u8; 32]) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
    if sealed.len() < NONCE_LEN {
        return Err(KeystoreError::Corrupt(format!(
            "sealed key too short: expected at least {NONCE_LEN} bytes, got {}",
            sealed.len()
        )));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| KeystoreError::WrongPassphrase)
}
