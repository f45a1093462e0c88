use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, RlpEncodable};
use sha3::{Digest, Keccak256};

use crate::error::EthError;
use crate::signer::{self, Signature};

/// Gas consumed by a plain value transfer. Contract calls need more.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// A gas-priced (legacy) transaction awaiting a signature.
///
/// Immutable once built; signing consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    /// Price per gas unit, in wei.
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    /// Transfer value in wei.
    pub value: U256,
    /// Calldata; empty for plain transfers.
    pub data: Bytes,
}

/// Builds an unsigned value transfer. Pure and deterministic.
pub fn build_transfer(
    chain_id: u64,
    nonce: u64,
    to: Address,
    value_wei: U256,
    gas_price: U256,
    gas_limit: u64,
) -> UnsignedTransaction {
    UnsignedTransaction {
        chain_id,
        nonce,
        gas_price,
        gas_limit,
        to,
        value: value_wei,
        data: Bytes::new(),
    }
}

impl UnsignedTransaction {
    /// The hash committed to by the signature, per EIP-155:
    /// `keccak256(rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]))`.
    ///
    /// The embedded chain id makes signatures unreplayable across networks.
    pub fn signing_hash(&self) -> B256 {
        let fields = SigningFields {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            chain_id: self.chain_id,
            zero_r: 0,
            zero_s: 0,
        };

        let mut buf = Vec::with_capacity(fields.length());
        fields.encode(&mut buf);
        B256::from_slice(Keccak256::digest(&buf).as_slice())
    }

    /// Attaches a signature, consuming the unsigned transaction.
    pub fn into_signed(self, signature: Signature) -> SignedTransaction {
        SignedTransaction { tx: self, signature }
    }
}

/// Signs a transaction with a raw private key.
pub fn sign(
    tx: UnsignedTransaction,
    private_key: &[u8],
) -> Result<SignedTransaction, EthError> {
    let hash = tx.signing_hash();
    let signature = signer::sign_hash(private_key, hash.as_slice())?;
    Ok(tx.into_signed(signature))
}

/// A transaction ready for broadcast. Once submitted it belongs to the
/// chain and is not mutated locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx: UnsignedTransaction,
    pub signature: Signature,
}

impl SignedTransaction {
    /// Canonical broadcast bytes:
    /// `rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])`.
    pub fn encoded(&self) -> Vec<u8> {
        let fields = BroadcastFields {
            nonce: self.tx.nonce,
            gas_price: self.tx.gas_price,
            gas_limit: self.tx.gas_limit,
            to: self.tx.to,
            value: self.tx.value,
            data: self.tx.data.clone(),
            v: self.signature.v(self.tx.chain_id),
            r: self.signature.r,
            s: self.signature.s,
        };

        let mut buf = Vec::with_capacity(fields.length());
        fields.encode(&mut buf);
        buf
    }

    /// The transaction's canonical hash, used to poll for status after
    /// broadcast.
    pub fn hash(&self) -> B256 {
        B256::from_slice(Keccak256::digest(self.encoded()).as_slice())
    }

    /// Recovers the sender address from the signature.
    pub fn recover_sender(&self) -> Result<Address, EthError> {
        signer::recover_address(self.tx.signing_hash().as_slice(), &self.signature)
    }
}

/// Signing payload fields in canonical order. The two trailing zeros are
/// EIP-155's placeholders for r and s.
#[derive(RlpEncodable)]
struct SigningFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    chain_id: u64,
    zero_r: u8,
    zero_s: u8,
}

/// Broadcast fields in canonical order, signature appended.
#[derive(RlpEncodable)]
struct BroadcastFields {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}
