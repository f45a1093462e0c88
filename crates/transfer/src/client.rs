use std::sync::mpsc::Receiver;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use eth_core::SignedTransaction;
use thiserror::Error;

/// Errors surfaced by a [`ChainClient`] implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("rejected by the chain: {0}")]
    Rejected(String),
}

/// A contract log delivered by a subscription.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
    pub block_number: u64,
    pub transaction_hash: B256,
}

/// The narrow view of a chain node consumed by the transfer engine.
///
/// Transport (JSON-RPC over HTTP or WebSocket) is entirely the
/// implementor's concern. Every call must return within the supplied
/// `timeout` and report [`ClientError::Timeout`] when the deadline
/// passes; hanging indefinitely is a contract violation. Cancelling
/// before [`submit`](ChainClient::submit) returns is a clean no-op; once
/// a transaction is broadcast it belongs to the chain and cannot be
/// un-submitted.
pub trait ChainClient: Send + Sync {
    /// The network's replay-protection id.
    fn chain_id(&self, timeout: Duration) -> Result<u64, ClientError>;

    /// Balance of `address` in wei.
    fn balance_of(&self, address: Address, timeout: Duration) -> Result<U256, ClientError>;

    /// Next nonce for `address`, counting pending transactions.
    fn pending_nonce(&self, address: Address, timeout: Duration) -> Result<u64, ClientError>;

    /// Gas price the node currently suggests, in wei.
    fn suggested_gas_price(&self, timeout: Duration) -> Result<U256, ClientError>;

    /// Broadcasts a signed transaction and returns its canonical hash.
    ///
    /// Chain-side refusal (insufficient funds, nonce conflict) is
    /// [`ClientError::Rejected`].
    fn submit(&self, tx: &SignedTransaction, timeout: Duration) -> Result<B256, ClientError>;

    /// Log stream for a contract; runs until the receiver is dropped.
    fn subscribe_logs(&self, contract: Address) -> Result<Receiver<LogEvent>, ClientError>;
}

impl<C: ChainClient + ?Sized> ChainClient for &C {
    fn chain_id(&self, timeout: Duration) -> Result<u64, ClientError> {
        (**self).chain_id(timeout)
    }

    fn balance_of(&self, address: Address, timeout: Duration) -> Result<U256, ClientError> {
        (**self).balance_of(address, timeout)
    }

    fn pending_nonce(&self, address: Address, timeout: Duration) -> Result<u64, ClientError> {
        (**self).pending_nonce(address, timeout)
    }

    fn suggested_gas_price(&self, timeout: Duration) -> Result<U256, ClientError> {
        (**self).suggested_gas_price(timeout)
    }

    fn submit(&self, tx: &SignedTransaction, timeout: Duration) -> Result<B256, ClientError> {
        (**self).submit(tx, timeout)
    }

    fn subscribe_logs(&self, contract: Address) -> Result<Receiver<LogEvent>, ClientError> {
        (**self).subscribe_logs(contract)
    }
}

impl<C: ChainClient + ?Sized> ChainClient for std::sync::Arc<C> {
    fn chain_id(&self, timeout: Duration) -> Result<u64, ClientError> {
        (**self).chain_id(timeout)
    }

    fn balance_of(&self, address: Address, timeout: Duration) -> Result<U256, ClientError> {
        (**self).balance_of(address, timeout)
    }

    fn pending_nonce(&self, address: Address, timeout: Duration) -> Result<u64, ClientError> {
        (**self).pending_nonce(address, timeout)
    }

    fn suggested_gas_price(&self, timeout: Duration) -> Result<U256, ClientError> {
        (**self).suggested_gas_price(timeout)
    }

    fn submit(&self, tx: &SignedTransaction, timeout: Duration) -> Result<B256, ClientError> {
        (**self).submit(tx, timeout)
    }

    fn subscribe_logs(&self, contract: Address) -> Result<Receiver<LogEvent>, ClientError> {
        (**self).subscribe_logs(contract)
    }
}
