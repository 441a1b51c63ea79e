//! In-memory chain used by unit tests

use crate::client::ChainClient;
use crate::types::Confirmation;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use eyre::{bail, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Development keys (anvil accounts 0..3)
pub const KEY_A: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const KEY_B: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const KEY_C: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

/// Address of a development key
pub fn address_of(key: &str) -> Address {
    crate::signer::LocalSigner::from_private_key(key)
        .map(|signer| crate::signer::TransactionSigner::address(&signer))
        .expect("valid development key")
}

/// Network call observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    Balance(Address),
    Nonce(Address),
    GasPrice,
    Call(Address),
    Send { to: Address, nonce: u64 },
    Wait(TxHash),
}

#[derive(Default)]
struct State {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    call_results: HashMap<(Address, [u8; 4]), Bytes>,
    failing_balances: HashSet<Address>,
    failing_destinations: HashSet<Address>,
    reverting_destinations: HashSet<Address>,
    balance_latency: HashMap<Address, Duration>,
    transient_send_failures: u32,
    sent: HashMap<TxHash, TxEnvelope>,
    log: Vec<ChainCall>,
}

/// Scriptable [`ChainClient`]
pub struct FakeChain {
    endpoint: String,
    gas_price: u128,
    state: Mutex<State>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::named("fake")
    }

    pub fn named(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            gas_price: 1_000_000_000,
            state: Mutex::new(State::default()),
        }
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.lock().unwrap().balances.insert(address, balance);
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.state.lock().unwrap().nonces.insert(address, nonce);
    }

    pub fn set_call_result(&self, to: Address, selector: impl Into<[u8; 4]>, result: Bytes) {
        self.state
            .lock()
            .unwrap()
            .call_results
            .insert((to, selector.into()), result);
    }

    /// Every balance query for `address` fails
    pub fn fail_balance(&self, address: Address) {
        self.state.lock().unwrap().failing_balances.insert(address);
    }

    /// Every broadcast to `to` fails
    pub fn fail_sends_to(&self, to: Address) {
        self.state.lock().unwrap().failing_destinations.insert(to);
    }

    /// The next `count` broadcasts fail, whatever their destination
    pub fn fail_next_sends(&self, count: u32) {
        self.state.lock().unwrap().transient_send_failures = count;
    }

    /// Transactions to `to` are included with a failed status
    pub fn revert_sends_to(&self, to: Address) {
        self.state.lock().unwrap().reverting_destinations.insert(to);
    }

    /// Delay balance answers for `address`
    pub fn set_balance_latency(&self, address: Address, latency: Duration) {
        self.state
            .lock()
            .unwrap()
            .balance_latency
            .insert(address, latency);
    }

    pub fn log(&self) -> Vec<ChainCall> {
        self.state.lock().unwrap().log.clone()
    }

    /// Broadcasts that reached the fake, in order
    pub fn sends(&self) -> Vec<(Address, u64)> {
        self.log()
            .into_iter()
            .filter_map(|call| match call {
                ChainCall::Send { to, nonce } => Some((to, nonce)),
                _ => None,
            })
            .collect()
    }

    /// Destination of a broadcast transaction
    pub fn sent_to(&self, hash: TxHash) -> Option<Address> {
        self.state.lock().unwrap().sent.get(&hash).and_then(|tx| tx.to())
    }

    pub fn count(&self, predicate: impl Fn(&ChainCall) -> bool) -> usize {
        self.log().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: ChainCall) {
        self.state.lock().unwrap().log.push(call);
    }
}

impl ChainClient for FakeChain {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.record(ChainCall::Balance(address));
        let latency = self.state.lock().unwrap().balance_latency.get(&address).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_balances.contains(&address) {
            bail!("balance unavailable for {}", address);
        }
        Ok(state.balances.get(&address).copied().unwrap_or_default())
    }

    async fn get_pending_nonce(&self, address: Address) -> Result<u64> {
        self.record(ChainCall::Nonce(address));
        Ok(self
            .state
            .lock()
            .unwrap()
            .nonces
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn get_gas_price(&self) -> Result<u128> {
        self.record(ChainCall::GasPrice);
        Ok(self.gas_price)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.record(ChainCall::Call(to));
        let mut selector = [0u8; 4];
        if data.len() < 4 {
            bail!("calldata too short");
        }
        selector.copy_from_slice(&data[..4]);

        match self.state.lock().unwrap().call_results.get(&(to, selector)) {
            Some(result) => Ok(result.clone()),
            None => bail!("execution reverted: no result scripted for {}", to),
        }
    }

    async fn send_transaction(&self, envelope: TxEnvelope) -> Result<TxHash> {
        let to = envelope.to().unwrap_or_default();
        self.record(ChainCall::Send {
            to,
            nonce: envelope.nonce(),
        });

        // yield so concurrent rows interleave like real network calls
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        if state.transient_send_failures > 0 {
            state.transient_send_failures -= 1;
            bail!("connection reset");
        }
        if state.failing_destinations.contains(&to) {
            bail!("broadcast rejected for {}", to);
        }

        let hash = *envelope.tx_hash();
        state.sent.insert(hash, envelope);
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<Confirmation> {
        self.record(ChainCall::Wait(hash));
        let state = self.state.lock().unwrap();
        let Some(envelope) = state.sent.get(&hash) else {
            bail!("unknown transaction {}", hash);
        };
        let to = envelope.to().unwrap_or_default();

        Ok(Confirmation {
            hash,
            block_number: 100 + state.sent.len() as u64,
            gas_used: 21_000,
            success: !state.reverting_destinations.contains(&to),
        })
    }
}

/// One event recorded by [`LogCapture`]
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: tracing::Level,
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Layer that records every event; install it for the current thread
#[derive(Clone, Default)]
pub struct LogCapture {
    events: std::sync::Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        use tracing_subscriber::layer::SubscriberExt;

        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, level: tracing::Level) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }
}

struct FieldRecorder(Vec<(String, String)>);

impl tracing::field::Visit for FieldRecorder {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{:?}", value)));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut recorder = FieldRecorder(Vec::new());
        event.record(&mut recorder);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: recorder.0,
        });
    }
}
