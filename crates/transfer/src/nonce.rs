use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use alloy_primitives::Address;

/// Per-sender nonce issue state.
///
/// A sender's slot mutex is held across fetch, sign, and submit, so two
/// in-flight transfers from the same sender can never observe the same
/// pending nonce. The slot stores the next nonce to issue locally; it
/// only advances on successful submission.
#[derive(Default)]
pub(crate) struct NonceSequencer {
    slots: Mutex<HashMap<Address, Arc<Mutex<Option<u64>>>>>,
}

impl NonceSequencer {
    pub(crate) fn slot(&self, sender: Address) -> Arc<Mutex<Option<u64>>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(sender).or_default().clone()
    }
}

/// Picks the nonce to issue: the freshly fetched pending nonce, unless a
/// locally issued one is ahead of what the node has seen yet.
pub(crate) fn next_nonce(issued: Option<u64>, pending: u64) -> u64 {
    issued.map_or(pending, |next| pending.max(next))
}
