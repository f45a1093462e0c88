use alloy_primitives::Address;
use eth_core::EthError;
use thiserror::Error;

/// Key custody errors.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("wrong passphrase")]
    WrongPassphrase,

    #[error("no key for address {0}")]
    NotFound(Address),

    #[error("a key for address {0} already exists")]
    AlreadyExists(Address),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("corrupt key record: {0}")]
    Corrupt(String),

    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("encryption failed: {0}")]
    Cipher(String),

    #[error(transparent)]
    Key(#[from] EthError),
}
