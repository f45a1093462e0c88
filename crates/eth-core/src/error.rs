use thiserror::Error;

/// Errors raised by the signing and encoding primitives.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid message hash: expected 32 bytes, got {0}")]
    InvalidHash(usize),

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("recovery failed: {0}")]
    RecoveryError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}
