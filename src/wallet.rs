// src/wallet.rs
//! Wallet session contract.
//!
//! The original demo talked to duck-typed injected provider objects and kept
//! session state in a global store plus browser local storage. Here the
//! provider is a capability trait, the storage is an injected key-value port,
//! and there is exactly one session contract. The aggregation core never
//! touches any of this.
//!
//! Event delivery follows a subscription contract: register a handler, get at
//! most one notification per state change, unregister to stop. The session
//! state is updated before handlers run, so a handler observing the session
//! sees the post-event state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Storage key for the persisted session snapshot.
const SESSION_KEY: &str = "wallet.session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Injected,
    WalletConnect,
    Coinbase,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet provider available")]
    ProviderUnavailable,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("provider rpc error: {0}")]
    Rpc(String),
}

/// A transfer to submit through a provider. `token` is `None` for the native
/// asset, or a token contract address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    pub token: Option<String>,
}

/// State-change notifications a provider can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
    Disconnected,
}

/// What any wallet backend must be able to do. Implementations per wallet
/// kind; all calls are synchronous request/response from the session's view.
pub trait WalletProvider {
    fn kind(&self) -> ProviderKind;
    fn request_accounts(&mut self) -> Result<Vec<String>, WalletError>;
    fn chain_id(&self) -> Result<u64, WalletError>;
    fn get_balance(&self, account: &str) -> Result<Decimal, WalletError>;
    fn send_transaction(&mut self, request: &TransferRequest) -> Result<String, WalletError>;
    fn sign_message(&self, account: &str, message: &str) -> Result<String, WalletError>;
}

/// Key-value persistence port. Replaces direct local-storage access; the
/// session never assumes a particular backing store.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

impl<S: SessionStore + ?Sized> SessionStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    map: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
    }
}

/// Explicit session state; the whole record is what gets persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub provider: Option<ProviderKind>,
    pub chain_id: u64,
    pub accounts: Vec<String>,
    pub connected: bool,
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            provider: None,
            chain_id: 1, // mainnet until a provider says otherwise
            accounts: Vec::new(),
            connected: false,
            error: None,
        }
    }
}

pub type SubscriptionId = u64;

type Handler = Box<dyn FnMut(&WalletEvent) + Send>;

/// The one canonical wallet-state container.
pub struct WalletSession<S: SessionStore> {
    state: SessionState,
    store: S,
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_subscription: SubscriptionId,
}

impl<S: SessionStore> WalletSession<S> {
    /// Create a session, restoring any persisted snapshot from the store.
    pub fn new(store: S) -> Self {
        let state = store
            .get(SESSION_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        WalletSession {
            state,
            store,
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.state) {
            Ok(raw) => self.store.set(SESSION_KEY, &raw),
            Err(_) => self.store.remove(SESSION_KEY),
        }
    }

    fn notify(&mut self, event: &WalletEvent) {
        for (_, handler) in self.subscribers.iter_mut() {
            handler(event);
        }
    }

    /// Connect through a provider: request accounts and the active chain,
    /// record them, persist. A failure is recorded in `state.error` and
    /// propagated.
    pub fn connect(&mut self, provider: &mut dyn WalletProvider) -> Result<(), WalletError> {
        self.state.error = None;

        let accounts = match provider.request_accounts() {
            Ok(a) => a,
            Err(e) => {
                self.state.error = Some(e.to_string());
                self.persist();
                return Err(e);
            }
        };
        let chain_id = match provider.chain_id() {
            Ok(c) => c,
            Err(e) => {
                self.state.error = Some(e.to_string());
                self.persist();
                return Err(e);
            }
        };

        self.state.provider = Some(provider.kind());
        self.state.chain_id = chain_id;
        self.state.connected = !accounts.is_empty();
        self.state.accounts = accounts;
        self.persist();
        Ok(())
    }

    /// Reset the session and drop the persisted snapshot. Subscribers get a
    /// single `Disconnected` notification.
    pub fn disconnect(&mut self) {
        self.state = SessionState::default();
        self.store.remove(SESSION_KEY);
        self.notify(&WalletEvent::Disconnected);
    }

    /// Apply a provider event to the session, then deliver it to every
    /// subscriber exactly once.
    pub fn handle_event(&mut self, event: WalletEvent) {
        match &event {
            WalletEvent::AccountsChanged(accounts) => {
                self.state.accounts = accounts.clone();
                self.state.connected = !accounts.is_empty();
            }
            WalletEvent::ChainChanged(chain_id) => {
                self.state.chain_id = *chain_id;
            }
            WalletEvent::Disconnected => {
                self.state = SessionState::default();
            }
        }
        self.persist();
        self.notify(&event);
    }

    pub fn subscribe(&mut self, handler: Handler) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, handler));
        id
    }

    /// Cancellation is simply removing the subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }
}

/// In-memory provider used by the demo and tests.
pub struct MockProvider {
    pub kind: ProviderKind,
    pub accounts: Vec<String>,
    pub chain_id: u64,
    pub balances: HashMap<String, Decimal>,
    pub reject_connect: bool,
    sent: u64,
}

impl MockProvider {
    pub fn new(kind: ProviderKind, accounts: Vec<String>, chain_id: u64) -> Self {
        MockProvider {
            kind,
            accounts,
            chain_id,
            balances: HashMap::new(),
            reject_connect: false,
            sent: 0,
        }
    }
}

impl WalletProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn request_accounts(&mut self) -> Result<Vec<String>, WalletError> {
        if self.reject_connect {
            return Err(WalletError::Rejected("user denied account access".into()));
        }
        Ok(self.accounts.clone())
    }

    fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.chain_id)
    }

    fn get_balance(&self, account: &str) -> Result<Decimal, WalletError> {
        self.balances
            .get(account)
            .copied()
            .ok_or_else(|| WalletError::Rpc(format!("unknown account {account}")))
    }

    fn send_transaction(&mut self, request: &TransferRequest) -> Result<String, WalletError> {
        if !self.accounts.iter().any(|a| a == &request.from) {
            return Err(WalletError::Rejected(format!(
                "account {} is not connected",
                request.from
            )));
        }
        self.sent += 1;
        Ok(format!("0xmocktx{:08x}", self.sent))
    }

    fn sign_message(&self, account: &str, message: &str) -> Result<String, WalletError> {
        if !self.accounts.iter().any(|a| a == account) {
            return Err(WalletError::Rejected(format!(
                "account {account} is not connected"
            )));
        }
        Ok(format!("0xsig:{account}:{}", message.len()))
    }
}
