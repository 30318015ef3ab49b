//! Wallet session lifecycle: connect, events, persistence, subscriptions.

use depthline::wallet::{
    MemoryStore, MockProvider, ProviderKind, TransferRequest, WalletError, WalletEvent,
    WalletProvider, WalletSession,
};
use rust_decimal_macros::dec;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

const ALICE: &str = "0xa11ce00000000000000000000000000000000000";
const BOB: &str = "0xb0b0000000000000000000000000000000000000";

fn provider() -> MockProvider {
    let mut p = MockProvider::new(ProviderKind::Injected, vec![ALICE.to_owned()], 1);
    p.balances.insert(ALICE.to_owned(), dec!(2.5));
    p
}

#[test]
fn connect_records_accounts_and_chain() {
    let mut session = WalletSession::new(MemoryStore::new());
    let mut p = provider();

    session.connect(&mut p).unwrap();
    let state = session.state();
    assert!(state.connected);
    assert_eq!(state.provider, Some(ProviderKind::Injected));
    assert_eq!(state.chain_id, 1);
    assert_eq!(state.accounts, vec![ALICE.to_owned()]);
    assert_eq!(state.error, None);
}

#[test]
fn rejected_connect_is_recorded_not_swallowed() {
    let mut session = WalletSession::new(MemoryStore::new());
    let mut p = provider();
    p.reject_connect = true;

    let err = session.connect(&mut p).unwrap_err();
    assert!(matches!(err, WalletError::Rejected(_)));
    assert!(!session.state().connected);
    assert!(session.state().error.is_some());
}

#[test]
fn events_update_state_before_delivery() {
    let mut session = WalletSession::new(MemoryStore::new());
    let mut p = provider();
    session.connect(&mut p).unwrap();

    session.handle_event(WalletEvent::ChainChanged(137));
    assert_eq!(session.state().chain_id, 137);

    session.handle_event(WalletEvent::AccountsChanged(vec![]));
    assert!(!session.state().connected);

    session.handle_event(WalletEvent::AccountsChanged(vec![BOB.to_owned()]));
    assert!(session.state().connected);
    assert_eq!(session.state().accounts, vec![BOB.to_owned()]);
}

#[test]
fn each_subscriber_sees_each_event_once() {
    let mut session = WalletSession::new(MemoryStore::new());

    let seen = Arc::new(AtomicUsize::new(0));
    let seen2 = seen.clone();
    let id = session.subscribe(Box::new(move |_| {
        seen2.fetch_add(1, Ordering::SeqCst);
    }));

    session.handle_event(WalletEvent::ChainChanged(10));
    session.handle_event(WalletEvent::ChainChanged(11));
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    session.unsubscribe(id);
    session.handle_event(WalletEvent::ChainChanged(12));
    assert_eq!(seen.load(Ordering::SeqCst), 2, "unsubscribed handler still ran");
}

#[test]
fn disconnect_resets_and_notifies() {
    let mut session = WalletSession::new(MemoryStore::new());
    let mut p = provider();
    session.connect(&mut p).unwrap();

    let got_disconnect = Arc::new(AtomicUsize::new(0));
    let flag = got_disconnect.clone();
    session.subscribe(Box::new(move |ev| {
        if matches!(ev, WalletEvent::Disconnected) {
            flag.fetch_add(1, Ordering::SeqCst);
        }
    }));

    session.disconnect();
    assert!(!session.state().connected);
    assert!(session.state().accounts.is_empty());
    assert_eq!(got_disconnect.load(Ordering::SeqCst), 1);
}

#[test]
fn session_survives_a_store_backed_restore() {
    let mut store = MemoryStore::new();
    {
        let mut session = WalletSession::new(&mut store);
        let mut p = provider();
        session.connect(&mut p).unwrap();
    }

    let restored = WalletSession::new(&mut store);
    assert!(restored.state().connected);
    assert_eq!(restored.state().accounts, vec![ALICE.to_owned()]);
}

#[test]
fn provider_capabilities() {
    let mut p = provider();
    assert_eq!(p.get_balance(ALICE).unwrap(), dec!(2.5));
    assert!(matches!(p.get_balance(BOB), Err(WalletError::Rpc(_))));

    let tx = TransferRequest {
        from: ALICE.to_owned(),
        to: BOB.to_owned(),
        amount: dec!(0.1),
        token: None,
    };
    let hash = p.send_transaction(&tx).unwrap();
    assert!(hash.starts_with("0xmocktx"));

    let bad = TransferRequest { from: BOB.to_owned(), ..tx };
    assert!(matches!(p.send_transaction(&bad), Err(WalletError::Rejected(_))));

    assert!(p.sign_message(ALICE, "hello").unwrap().starts_with("0xsig:"));
}
