use std::time::Duration;

use eth_core::EthError;
use keystore::error::KeystoreError;
use thiserror::Error;

use crate::client::ClientError;

/// End-to-end transfer failures.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Key(#[from] EthError),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    #[error("network failure: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("rejected by the chain: {0}")]
    Rejected(String),
}

impl From<ClientError> for TransferError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(msg) => Self::Network(msg),
            ClientError::Timeout(after) => Self::Timeout(after),
            ClientError::Rejected(msg) => Self::Rejected(msg),
        }
    }
}
