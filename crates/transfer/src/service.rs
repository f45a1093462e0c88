use std::sync::mpsc::Receiver;
use std::sync::PoisonError;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use eth_core::transaction::{self, UnsignedTransaction, TRANSFER_GAS_LIMIT};
use eth_core::{address, amount, SignedTransaction};
use keystore::store::RecordStore;
use keystore::KeyStore;
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::client::{ChainClient, LogEvent};
use crate::error::TransferError;
use crate::nonce::{self, NonceSequencer};

/// Deadline applied to each individual chain call unless overridden.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Upper bound on every chain RPC issued by the service.
    pub rpc_timeout: Duration,
    /// Gas limit attached to outgoing transactions. Plain value transfers
    /// need exactly [`TRANSFER_GAS_LIMIT`]; raise it for contract calls.
    pub gas_limit: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            gas_limit: TRANSFER_GAS_LIMIT,
        }
    }
}

/// Orchestrates keystore, signer, builder, and chain client into
/// end-to-end value transfers.
///
/// The client is an injected capability; the service holds no global
/// connection state. A transfer runs Built -> Signed -> Submitted and
/// returns the transaction hash without waiting for confirmation; the
/// terminal Confirmed/Rejected/TimedOut states are observed by the
/// caller's own polling.
pub struct TransferService<C: ChainClient> {
    client: C,
    config: TransferConfig,
    nonces: NonceSequencer,
}

impl<C: ChainClient> TransferService<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, TransferConfig::default())
    }

    pub fn with_config(client: C, config: TransferConfig) -> Self {
        Self {
            client,
            config,
            nonces: NonceSequencer::default(),
        }
    }

    /// Balance of `account` in wei. A fresh account reports zero.
    pub fn balance(&self, account: Address) -> Result<U256, TransferError> {
        Ok(self.client.balance_of(account, self.config.rpc_timeout)?)
    }

    /// Balance of `account` as an exact decimal ether string.
    pub fn balance_in_ether(&self, account: Address) -> Result<String, TransferError> {
        Ok(amount::format_ether(self.balance(account)?))
    }

    /// Signs and broadcasts a value transfer with a raw private key.
    /// Returns the transaction hash for later status polling.
    pub fn transfer(
        &self,
        from_key: &[u8],
        to: Address,
        amount_wei: U256,
    ) -> Result<B256, TransferError> {
        let sender = address::from_private_key(from_key)?;
        self.submit_transfer(sender, to, amount_wei, |tx| {
            Ok(transaction::sign(tx, from_key)?)
        })
    }

    /// Like [`transfer`](Self::transfer), with the amount given as a
    /// decimal ether string (`"10"`, `"0.5"`). Parsing is exact; an
    /// amount finer than one wei is an error, not a rounding.
    pub fn transfer_ether(
        &self,
        from_key: &[u8],
        to: Address,
        amount_ether: &str,
    ) -> Result<B256, TransferError> {
        let wei = amount::parse_ether(amount_ether)?;
        self.transfer(from_key, to, wei)
    }

    /// Transfers from a keystore-held account. The private key never
    /// leaves the keystore; only the signing hash crosses over for a
    /// scoped unlock-and-sign.
    pub fn transfer_from_keystore<S: RecordStore>(
        &self,
        keys: &KeyStore<S>,
        from: Address,
        passphrase: &SecretString,
        to: Address,
        amount_wei: U256,
    ) -> Result<B256, TransferError> {
        self.submit_transfer(from, to, amount_wei, |tx| {
            let hash = tx.signing_hash();
            let signature = keys.unlock_and_sign(from, passphrase, hash.as_slice())?;
            Ok(tx.into_signed(signature))
        })
    }

    /// Contract log stream; terminated by dropping the receiver.
    pub fn subscribe_logs(&self, contract: Address) -> Result<Receiver<LogEvent>, TransferError> {
        Ok(self.client.subscribe_logs(contract)?)
    }

    fn submit_transfer<F>(
        &self,
        sender: Address,
        to: Address,
        amount_wei: U256,
        sign: F,
    ) -> Result<B256, TransferError>
    where
        F: FnOnce(UnsignedTransaction) -> Result<SignedTransaction, TransferError>,
    {
        let timeout = self.config.rpc_timeout;

        // Serialize per sender for the whole fetch-sign-submit window and
        // read the pending nonce fresh inside it; two concurrent
        // transfers must never be assigned the same nonce.
        let slot = self.nonces.slot(sender);
        let mut issued = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let pending = self.client.pending_nonce(sender, timeout)?;
        let nonce = nonce::next_nonce(*issued, pending);

        let gas_price = self.client.suggested_gas_price(timeout)?;
        let chain_id = self.client.chain_id(timeout)?;

        let tx = UnsignedTransaction {
            chain_id,
            nonce,
            gas_price,
            gas_limit: self.config.gas_limit,
            to,
            value: amount_wei,
            data: Bytes::new(),
        };
        debug!(%sender, %to, nonce, chain_id, "built transfer");

        let signed = sign(tx)?;

        match self.client.submit(&signed, timeout) {
            Ok(tx_hash) => {
                // The nonce is consumed only once the chain has the
                // transaction.
                *issued = Some(nonce + 1);
                info!(%sender, %tx_hash, nonce, "transfer submitted");
                Ok(tx_hash)
            }
            Err(err) => {
                warn!(%sender, nonce, error = %err, "transfer not submitted");
                Err(err.into())
            }
        }
    }
}
