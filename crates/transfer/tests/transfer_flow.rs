//! End-to-end transfer scenarios against an in-process mock chain:
//! key -> nonce -> build -> sign -> submit, plus the keystore-backed path.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use eth_core::{address, amount, EthError, SignedTransaction};
use keystore::error::KeystoreError;
use keystore::kdf::KdfParams;
use keystore::store::MemoryStore;
use keystore::KeyStore;
use secrecy::SecretString;
use transfer::{ChainClient, ClientError, LogEvent, TransferError, TransferService};

const CHAIN_ID: u64 = 1337;
const GAS_PRICE: u64 = 2_000_000_000;

const SENDER_KEY: [u8; 32] = {
    let mut key = [0u8; 32];
    key[31] = 1;
    key
};

fn sender() -> Address {
    address::from_private_key(&SENDER_KEY).unwrap()
}

fn recipient() -> Address {
    Address::from_slice(&[0xBEu8; 20])
}

fn ether(text: &str) -> U256 {
    amount::parse_ether(text).unwrap()
}

fn gas_fee() -> U256 {
    U256::from(GAS_PRICE) * U256::from(21_000u64)
}

fn test_keystore() -> KeyStore<MemoryStore> {
    KeyStore::with_params(
        MemoryStore::new(),
        KdfParams {
            m_cost: 1024,
            t_cost: 1,
            p_cost: 1,
        },
    )
}

// ─── Mock chain ──────────────────────────────────────────────────────

#[derive(Default)]
struct ChainState {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    submissions: u64,
}

/// A single-node chain that validates nonce and balance the way a real
/// node does at broadcast time.
#[derive(Default)]
struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    fn new() -> Self {
        Self::default()
    }

    fn fund(&self, account: Address, wei: U256) {
        let mut state = self.state.lock().unwrap();
        *state.balances.entry(account).or_default() += wei;
    }

    fn nonce_of(&self, account: Address) -> u64 {
        *self.state.lock().unwrap().nonces.get(&account).unwrap_or(&0)
    }

    fn submissions(&self) -> u64 {
        self.state.lock().unwrap().submissions
    }
}

impl ChainClient for MockChain {
    fn chain_id(&self, _timeout: Duration) -> Result<u64, ClientError> {
        Ok(CHAIN_ID)
    }

    fn balance_of(&self, account: Address, _timeout: Duration) -> Result<U256, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state.balances.get(&account).copied().unwrap_or_default())
    }

    fn pending_nonce(&self, account: Address, _timeout: Duration) -> Result<u64, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(*state.nonces.get(&account).unwrap_or(&0))
    }

    fn suggested_gas_price(&self, _timeout: Duration) -> Result<U256, ClientError> {
        Ok(U256::from(GAS_PRICE))
    }

    fn submit(&self, tx: &SignedTransaction, _timeout: Duration) -> Result<B256, ClientError> {
        let from = tx
            .recover_sender()
            .map_err(|e| ClientError::Rejected(format!("bad signature: {e}")))?;

        let mut state = self.state.lock().unwrap();

        let expected = *state.nonces.get(&from).unwrap_or(&0);
        if tx.tx.nonce != expected {
            return Err(ClientError::Rejected(format!(
                "nonce {} does not match pending nonce {expected}",
                tx.tx.nonce
            )));
        }

        let balance = state.balances.get(&from).copied().unwrap_or_default();
        let cost = tx.tx.value + tx.tx.gas_price * U256::from(tx.tx.gas_limit);
        if balance < cost {
            return Err(ClientError::Rejected("insufficient funds".into()));
        }

        *state.balances.entry(from).or_default() -= cost;
        *state.balances.entry(tx.tx.to).or_default() += tx.tx.value;
        state.nonces.insert(from, expected + 1);
        state.submissions += 1;

        Ok(tx.hash())
    }

    fn subscribe_logs(&self, contract: Address) -> Result<Receiver<LogEvent>, ClientError> {
        let (publisher, receiver) = mpsc::channel();
        publisher
            .send(LogEvent {
                address: contract,
                topics: vec![B256::from([0x11u8; 32])],
                data: vec![1, 2, 3],
                block_number: 1,
                transaction_hash: B256::from([0x22u8; 32]),
            })
            .ok();
        Ok(receiver)
    }
}

/// Wraps a chain whose reported pending nonce never advances, the way a
/// node that has not seen earlier broadcasts yet would behave.
struct StaleNonceChain<'a>(&'a MockChain);

impl ChainClient for StaleNonceChain<'_> {
    fn chain_id(&self, timeout: Duration) -> Result<u64, ClientError> {
        self.0.chain_id(timeout)
    }

    fn balance_of(&self, account: Address, timeout: Duration) -> Result<U256, ClientError> {
        self.0.balance_of(account, timeout)
    }

    fn pending_nonce(&self, _account: Address, _timeout: Duration) -> Result<u64, ClientError> {
        Ok(0)
    }

    fn suggested_gas_price(&self, timeout: Duration) -> Result<U256, ClientError> {
        self.0.suggested_gas_price(timeout)
    }

    fn submit(&self, tx: &SignedTransaction, timeout: Duration) -> Result<B256, ClientError> {
        self.0.submit(tx, timeout)
    }

    fn subscribe_logs(&self, contract: Address) -> Result<Receiver<LogEvent>, ClientError> {
        self.0.subscribe_logs(contract)
    }
}

/// A node that never answers in time.
struct DeadChain;

impl ChainClient for DeadChain {
    fn chain_id(&self, timeout: Duration) -> Result<u64, ClientError> {
        Err(ClientError::Timeout(timeout))
    }

    fn balance_of(&self, _account: Address, timeout: Duration) -> Result<U256, ClientError> {
        Err(ClientError::Timeout(timeout))
    }

    fn pending_nonce(&self, _account: Address, timeout: Duration) -> Result<u64, ClientError> {
        Err(ClientError::Timeout(timeout))
    }

    fn suggested_gas_price(&self, timeout: Duration) -> Result<U256, ClientError> {
        Err(ClientError::Timeout(timeout))
    }

    fn submit(&self, _tx: &SignedTransaction, timeout: Duration) -> Result<B256, ClientError> {
        Err(ClientError::Timeout(timeout))
    }

    fn subscribe_logs(&self, _contract: Address) -> Result<Receiver<LogEvent>, ClientError> {
        Err(ClientError::Network("unreachable".into()))
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────

#[test]
fn fresh_account_has_zero_balance() {
    let chain = MockChain::new();
    let service = TransferService::new(&chain);

    assert_eq!(service.balance(sender()).unwrap(), U256::ZERO);
    assert_eq!(service.balance_in_ether(sender()).unwrap(), "0");
}

#[test]
fn ten_ether_transfer_moves_value_and_advances_the_nonce() {
    let chain = MockChain::new();
    chain.fund(sender(), ether("11"));
    let service = TransferService::new(&chain);

    let tx_hash = service
        .transfer(&SENDER_KEY, recipient(), ether("10"))
        .unwrap();

    assert_ne!(tx_hash, B256::ZERO);
    assert_eq!(chain.nonce_of(sender()), 1);
    assert_eq!(service.balance(recipient()).unwrap(), ether("10"));
    assert_eq!(
        service.balance(sender()).unwrap(),
        ether("11") - ether("10") - gas_fee()
    );
}

#[test]
fn nonce_increments_by_exactly_one_per_transfer() {
    let chain = MockChain::new();
    chain.fund(sender(), ether("5"));
    let service = TransferService::new(&chain);

    service
        .transfer(&SENDER_KEY, recipient(), ether("1"))
        .unwrap();
    assert_eq!(chain.nonce_of(sender()), 1);

    service
        .transfer(&SENDER_KEY, recipient(), ether("1"))
        .unwrap();
    assert_eq!(chain.nonce_of(sender()), 2);
}

#[test]
fn transfer_ether_accepts_decimal_strings() {
    let chain = MockChain::new();
    chain.fund(sender(), ether("1"));
    let service = TransferService::new(&chain);

    service
        .transfer_ether(&SENDER_KEY, recipient(), "0.25")
        .unwrap();

    assert_eq!(service.balance_in_ether(recipient()).unwrap(), "0.25");
}

#[test]
fn unparseable_amount_is_an_encoding_error() {
    let chain = MockChain::new();
    let service = TransferService::new(&chain);

    let result = service.transfer_ether(&SENDER_KEY, recipient(), "ten");
    assert!(matches!(
        result,
        Err(TransferError::Key(EthError::EncodingError(_)))
    ));
    assert_eq!(chain.submissions(), 0);
}

#[test]
fn zero_balance_transfer_is_rejected_and_consumes_no_nonce() {
    let chain = MockChain::new();
    let service = TransferService::new(&chain);

    let result = service.transfer(&SENDER_KEY, recipient(), ether("10"));
    assert!(matches!(result, Err(TransferError::Rejected(_))));

    // Nothing was applied.
    assert_eq!(chain.nonce_of(sender()), 0);
    assert_eq!(chain.submissions(), 0);
    assert_eq!(service.balance(recipient()).unwrap(), U256::ZERO);

    // A funded retry still starts at nonce 0.
    chain.fund(sender(), ether("11"));
    service
        .transfer(&SENDER_KEY, recipient(), ether("10"))
        .unwrap();
    assert_eq!(chain.nonce_of(sender()), 1);
}

#[test]
fn invalid_key_fails_before_touching_the_chain() {
    let service = TransferService::new(DeadChain);

    let result = service.transfer(&[0u8; 32], recipient(), U256::ZERO);
    assert!(matches!(
        result,
        Err(TransferError::Key(EthError::InvalidPrivateKey(_)))
    ));
}

#[test]
fn unreachable_node_surfaces_a_timeout() {
    let service = TransferService::new(DeadChain);

    let result = service.transfer(&SENDER_KEY, recipient(), U256::ZERO);
    assert!(matches!(result, Err(TransferError::Timeout(_))));
}

#[test]
fn concurrent_transfers_from_one_sender_never_share_a_nonce() {
    let chain = MockChain::new();
    chain.fund(sender(), ether("10"));
    let stale = StaleNonceChain(&chain);
    let service = TransferService::new(stale);

    // The node's reported pending nonce is frozen at 0; only the
    // per-sender sequencer can keep the second transfer off nonce 0. The
    // mock rejects reused nonces, so two successes are the proof.
    thread::scope(|scope| {
        let first = scope.spawn(|| service.transfer(&SENDER_KEY, recipient(), ether("1")));
        let second = scope.spawn(|| service.transfer(&SENDER_KEY, recipient(), ether("1")));

        first.join().expect("thread panicked").unwrap();
        second.join().expect("thread panicked").unwrap();
    });

    assert_eq!(chain.nonce_of(sender()), 2);
}

#[test]
fn keystore_backed_transfer_signs_without_exporting_the_key() {
    let keys = test_keystore();
    let passphrase = SecretString::from("p1".to_owned());
    let account = keys.create(&passphrase).unwrap();

    let chain = MockChain::new();
    chain.fund(account, ether("2"));
    let service = TransferService::new(&chain);

    let tx_hash = service
        .transfer_from_keystore(&keys, account, &passphrase, recipient(), ether("1"))
        .unwrap();

    assert_ne!(tx_hash, B256::ZERO);
    assert_eq!(chain.nonce_of(account), 1);
    assert_eq!(service.balance(recipient()).unwrap(), ether("1"));
}

#[test]
fn keystore_transfer_with_wrong_passphrase_fails_cleanly() {
    let keys = test_keystore();
    let account = keys.create(&SecretString::from("p1".to_owned())).unwrap();

    let chain = MockChain::new();
    chain.fund(account, ether("2"));
    let service = TransferService::new(&chain);

    let result = service.transfer_from_keystore(
        &keys,
        account,
        &SecretString::from("wrong".to_owned()),
        recipient(),
        ether("1"),
    );

    assert!(matches!(
        result,
        Err(TransferError::Keystore(KeystoreError::WrongPassphrase))
    ));
    assert_eq!(chain.submissions(), 0);
    assert_eq!(service.balance(recipient()).unwrap(), U256::ZERO);
}

#[test]
fn returned_hash_is_the_canonical_transaction_hash() {
    let chain = MockChain::new();
    chain.fund(sender(), ether("1"));
    let service = TransferService::new(&chain);

    let tx_hash = service
        .transfer(&SENDER_KEY, recipient(), ether("0.5"))
        .unwrap();

    // A 32-byte keccak digest, not a sentinel.
    assert_ne!(tx_hash, B256::ZERO);
    assert_eq!(hex::encode(tx_hash).len(), 64);
}

#[test]
fn log_subscription_delivers_until_the_stream_ends() {
    let chain = MockChain::new();
    let service = TransferService::new(&chain);
    let contract = Address::from_slice(&[0xC0u8; 20]);

    let receiver = service.subscribe_logs(contract).unwrap();

    let event = receiver.recv().unwrap();
    assert_eq!(event.address, contract);
    assert_eq!(event.block_number, 1);

    // Publisher hung up; the stream terminates instead of blocking.
    assert!(receiver.recv().is_err());
}
