//! Encrypted custody of secp256k1 private keys.
//!
//! A key exists in exactly two forms: sealed inside an [`EncryptedKey`]
//! record owned by a [`RecordStore`], or transiently decrypted into a
//! zeroized-on-drop buffer for the duration of one signing call. Every
//! operation that needs the plaintext proves the passphrase by decryption;
//! there is no unlock-and-cache state.

pub mod cipher;
pub mod error;
pub mod kdf;
pub mod record;
pub mod store;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use eth_core::signer::{self, Signature};
use eth_core::{address, Address};
use k256::ecdsa::SigningKey;
use rand_core::OsRng;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::error::KeystoreError;
use crate::kdf::KdfParams;
use crate::record::{EncryptedKey, RECORD_VERSION};
use crate::store::{FileStore, RecordStore};

/// Passphrase-guarded store of encrypted private keys.
pub struct KeyStore<S: RecordStore> {
    store: S,
    params: KdfParams,
    // Serializes mutations per address; lookups and signing stay lock-free.
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl KeyStore<FileStore> {
    /// Opens (creating if needed) a file-backed keystore directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, KeystoreError> {
        Ok(Self::new(FileStore::open(dir.as_ref())?))
    }
}

impl<S: RecordStore> KeyStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_params(store, KdfParams::default())
    }

    /// A keystore with explicit KDF costs; existing records keep the costs
    /// they were written with.
    pub fn with_params(store: S, params: KdfParams) -> Self {
        Self {
            store,
            params,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Generates a fresh key pair, seals the private key under
    /// `passphrase`, and persists it. The address is only returned once
    /// the record is durably stored.
    pub fn create(&self, passphrase: &SecretString) -> Result<Address, KeystoreError> {
        let signing = SigningKey::random(&mut OsRng);
        let key_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(signing.to_bytes().into());
        let account = address::from_public_key(signing.verifying_key());

        let entry = self.entry(account);
        let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
        self.encrypt_and_save(account, key_bytes.as_slice(), passphrase)?;

        Ok(account)
    }

    /// Looks up an account by address; absence is a value, not an error.
    pub fn find(&self, account: Address) -> Result<Option<Address>, KeystoreError> {
        Ok(self.store.load(account)?.map(|record| record.address))
    }

    /// All addresses with a stored key.
    pub fn accounts(&self) -> Result<Vec<Address>, KeystoreError> {
        self.store.addresses()
    }

    /// Decrypts the key just long enough to sign the supplied 32-byte
    /// hash. The plaintext buffer is wiped when the call returns, on the
    /// error paths included.
    pub fn unlock_and_sign(
        &self,
        account: Address,
        passphrase: &SecretString,
        hash: &[u8],
    ) -> Result<Signature, KeystoreError> {
        let record = self
            .store
            .load(account)?
            .ok_or(KeystoreError::NotFound(account))?;
        let key = self.decrypt_key(&record, passphrase)?;

        Ok(signer::sign_hash(&key, hash)?)
    }

    /// Re-encrypts the key under a new passphrase. The old passphrase is
    /// proved by decryption first; the record is replaced atomically, so a
    /// failure leaves the previous encryption in place.
    pub fn update(
        &self,
        account: Address,
        old_passphrase: &SecretString,
        new_passphrase: &SecretString,
    ) -> Result<(), KeystoreError> {
        let entry = self.entry(account);
        let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);

        let record = self
            .store
            .load(account)?
            .ok_or(KeystoreError::NotFound(account))?;
        let key = self.decrypt_key(&record, old_passphrase)?;

        self.encrypt_and_save(account, &key, new_passphrase)
    }

    /// Removes a key after proving passphrase ownership. Irreversible.
    pub fn delete(
        &self,
        account: Address,
        passphrase: &SecretString,
    ) -> Result<(), KeystoreError> {
        let entry = self.entry(account);
        let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);

        let record = self
            .store
            .load(account)?
            .ok_or(KeystoreError::NotFound(account))?;
        self.decrypt_key(&record, passphrase)?;

        self.store.remove(account)
    }

    /// Seals an externally supplied raw private key. Rejects an address
    /// that already has a record rather than silently re-encrypting it.
    pub fn import_raw(
        &self,
        key_bytes: &[u8],
        passphrase: &SecretString,
    ) -> Result<Address, KeystoreError> {
        let account = address::from_private_key(key_bytes)?;

        let entry = self.entry(account);
        let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);

        if self.store.load(account)?.is_some() {
            return Err(KeystoreError::AlreadyExists(account));
        }
        self.encrypt_and_save(account, key_bytes, passphrase)?;

        Ok(account)
    }

    /// Decrypts and hands out the raw private key. The caller owns the
    /// buffer; it is wiped on drop.
    pub fn export_raw(
        &self,
        account: Address,
        passphrase: &SecretString,
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        let record = self
            .store
            .load(account)?
            .ok_or(KeystoreError::NotFound(account))?;
        self.decrypt_key(&record, passphrase)
    }

    fn encrypt_and_save(
        &self,
        account: Address,
        key_bytes: &[u8],
        passphrase: &SecretString,
    ) -> Result<(), KeystoreError> {
        let salt = kdf::generate_salt();
        let kek = kdf::derive_key(passphrase.expose_secret().as_bytes(), &salt, &self.params)?;
        let ciphertext = cipher::seal(key_bytes, &kek)?;

        self.store.save(&EncryptedKey {
            version: RECORD_VERSION,
            address: account,
            kdf: self.params,
            salt: salt.to_vec(),
            ciphertext,
        })
    }

    fn decrypt_key(
        &self,
        record: &EncryptedKey,
        passphrase: &SecretString,
    ) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        let kek = kdf::derive_key(
            passphrase.expose_secret().as_bytes(),
            &record.salt,
            &record.kdf,
        )?;
        cipher::open(&record.ciphertext, &kek)
    }

    fn entry(&self, account: Address) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(account).or_default().clone()
    }
}
