//! Core Ethereum signing primitives: address derivation, recoverable ECDSA
//! over secp256k1, EIP-155 transaction encoding, and exact wei/ether
//! decimal arithmetic.
//!
//! Everything here is pure computation; custody and chain access live in
//! the `keystore` and `transfer` crates.

pub mod address;
pub mod amount;
pub mod error;
pub mod signer;
pub mod transaction;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use error::EthError;
pub use signer::Signature;
pub use transaction::{SignedTransaction, UnsignedTransaction, TRANSFER_GAS_LIMIT};
