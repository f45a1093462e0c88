use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::kdf::KdfParams;

/// Current record format version.
pub const RECORD_VERSION: u32 = 1;

/// An encrypted private-key record, the only persisted form of a key.
///
/// The address is derivable from the key inside the ciphertext; it is kept
/// in the clear purely as the lookup index. The KDF parameters and salt
/// travel with the ciphertext so each record is self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedKey {
    pub version: u32,
    pub address: Address,
    pub kdf: KdfParams,
    /// Argon2id salt.
    pub salt: Vec<u8>,
    /// AES-256-GCM sealed private key, 12-byte nonce prepended.
    pub ciphertext: Vec<u8>,
}
