//! Coordinator behavior tests.
//!
//! Drives the coordinator over scripted mock adapters and checks the
//! unified status, the connection table and the error surface exactly as
//! a host application observes them.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;

use fractl_core::{
    ConnectorById, ConnectorPicker, Coordinator, CoordinatorConfig, DynAdapter, FirstConnector,
    NamespaceConfig, Selection, Subscription,
};
use fractl_mock::{MockAdapter, MockConfig};
use fractl_protocol::{
    Action, AdapterError, AdapterStatus, ChainReference, ConnectorDescriptor, ConnectorOption,
    FractlError, FractlErrorCode, UnifiedStatus,
};

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn eip155_config() -> MockConfig {
    MockConfig::new("eip155")
        .with_connectors(vec![
            ConnectorDescriptor::new("injected", "Browser Wallet"),
            ConnectorDescriptor::new("walletConnect", "WalletConnect"),
        ])
        .with_addresses(["0xabc"])
}

fn cosmos_config() -> MockConfig {
    MockConfig::new("cosmos")
        .with_connectors(vec![ConnectorDescriptor::new("keplr", "Keplr")])
        .with_addresses(["cosmos1xyz"])
        .with_chain("cosmoshub-4")
}

fn build(configs: Vec<MockConfig>) -> (Coordinator, Vec<Arc<MockAdapter>>) {
    build_with(configs, CoordinatorConfig::default())
}

fn build_with(
    configs: Vec<MockConfig>,
    config: CoordinatorConfig,
) -> (Coordinator, Vec<Arc<MockAdapter>>) {
    let adapters: Vec<Arc<MockAdapter>> = configs
        .into_iter()
        .map(|c| Arc::new(MockAdapter::new(c)))
        .collect();
    let namespaces = adapters
        .iter()
        .map(|a| NamespaceConfig::shared(a.namespace(), a.clone()))
        .collect();
    let coordinator = Coordinator::with_config(namespaces, config).unwrap();
    (coordinator, adapters)
}

fn two_namespaces() -> (Coordinator, Arc<MockAdapter>, Arc<MockAdapter>) {
    let (coordinator, adapters) = build(vec![eip155_config(), cosmos_config()]);
    (coordinator, adapters[0].clone(), adapters[1].clone())
}

fn record_status(coordinator: &Coordinator) -> (Arc<Mutex<Vec<UnifiedStatus>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let sub = coordinator.subscribe_status(move |s| sink.lock().push(s));
    (seen, sub)
}

async fn wait_for_state(coordinator: &Coordinator, state: UnifiedStatus) {
    for _ in 0..1000 {
        if coordinator.state() == state {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("coordinator never reached {state}");
}

fn keplr() -> ConnectorDescriptor {
    ConnectorDescriptor::new("keplr", "Keplr")
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn empty_namespace_list_rejected() {
    let err = Coordinator::new(vec![]).unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::ConfigurationError);
}

#[test]
fn starts_disconnected() {
    let (coordinator, _, _) = two_namespaces();
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
    assert!(coordinator.connections().is_empty());
    assert!(coordinator.current_connection().is_none());
    assert_eq!(coordinator.namespaces(), vec!["eip155", "cosmos"]);
}

#[test]
fn initial_state_follows_adapters() {
    let adapter = MockAdapter::new(eip155_config());
    adapter.set_status(AdapterStatus::Connected);
    let coordinator = Coordinator::new(vec![NamespaceConfig::new("eip155", adapter)]).unwrap();
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
}

#[test]
fn connectors_are_flattened_in_registration_order() {
    let (coordinator, _, _) = two_namespaces();
    let options: Vec<(String, String)> = coordinator
        .connectors()
        .into_iter()
        .map(|o| (o.namespace, o.connector.id))
        .collect();
    assert_eq!(
        options,
        vec![
            ("eip155".to_string(), "injected".to_string()),
            ("eip155".to_string(), "walletConnect".to_string()),
            ("cosmos".to_string(), "keplr".to_string()),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Status unification
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unified_status_ignores_adapter_order() {
    use AdapterStatus::*;
    let cases = [
        ([Disconnected, Disconnected], UnifiedStatus::Disconnected),
        ([Connecting, Disconnected], UnifiedStatus::Connecting),
        ([Reconnecting, Disconnected], UnifiedStatus::Connecting),
        ([Connected, Connecting], UnifiedStatus::Connected),
        ([Connected, Disconnected], UnifiedStatus::Connected),
    ];

    for ([first, second], expected) in cases {
        for (a, b) in [(first, second), (second, first)] {
            let (coordinator, adapters) = build(vec![MockConfig::new("one"), MockConfig::new("two")]);
            adapters[0].set_status(a);
            adapters[1].set_status(b);
            assert_eq!(coordinator.state(), expected, "{a} + {b}");
        }
    }
}

#[test]
fn any_reconnecting_adapter_makes_state_connecting() {
    let (coordinator, eip155, cosmos) = two_namespaces();
    cosmos.set_status(AdapterStatus::Reconnecting);
    assert_eq!(coordinator.state(), UnifiedStatus::Connecting);

    eip155.set_status(AdapterStatus::Connected);
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);

    eip155.set_status(AdapterStatus::Disconnected);
    cosmos.set_status(AdapterStatus::Disconnected);
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

// ─────────────────────────────────────────────────────────────────────────────
// Connect
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_status_sequence_has_no_flicker() {
    let (coordinator, _, _) = two_namespaces();
    let (seen, _sub) = record_status(&coordinator);

    coordinator.connect(Selection::any()).await.unwrap();

    assert_eq!(
        *seen.lock(),
        vec![UnifiedStatus::Connecting, UnifiedStatus::Connected]
    );
}

#[tokio::test]
async fn connect_defaults_to_first_namespace_and_connector() {
    let (coordinator, eip155, cosmos) = two_namespaces();

    let connection = coordinator.connect(Selection::any()).await.unwrap();

    assert_eq!(connection.namespace(), "eip155");
    assert_eq!(connection.connector.id, "injected");
    assert_eq!(connection.record.addresses, vec!["0xabc"]);
    assert_eq!(connection.record.chain_id.to_string(), "eip155:1");
    assert_eq!(eip155.calls("connect"), 1);
    assert_eq!(cosmos.calls("connect"), 0);
    assert_eq!(coordinator.current_connection(), Some(connection));
}

#[tokio::test]
async fn connect_specific_namespace_and_connector() {
    let (coordinator, eip155, cosmos) = two_namespaces();

    let connection = coordinator
        .connect(Selection::namespace("cosmos").with_connector(keplr()))
        .await
        .unwrap();

    assert_eq!(connection.record.chain_id.to_string(), "cosmos:cosmoshub-4");
    assert_eq!(connection.primary_address(), Some("cosmos1xyz"));
    assert_eq!(eip155.calls("connect"), 0);
    assert_eq!(cosmos.calls("connect"), 1);
    assert!(cosmos.has_session("keplr"));
}

#[tokio::test]
async fn connect_while_connected_fails_without_adapter_call() {
    let (coordinator, eip155, cosmos) = two_namespaces();
    coordinator.connect(Selection::any()).await.unwrap();

    let err = coordinator
        .connect(Selection::namespace("cosmos"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::AlreadyConnected);
    assert_eq!(eip155.calls("connect"), 1);
    assert_eq!(cosmos.calls("connect"), 0);
    assert_eq!(coordinator.connections().len(), 1);
}

#[tokio::test]
async fn connect_while_adapter_reports_connected_fails() {
    let (coordinator, eip155, _) = two_namespaces();
    eip155.set_status(AdapterStatus::Connected);

    let err = coordinator.connect(Selection::any()).await.unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::AlreadyConnected);
    assert_eq!(eip155.calls("connect"), 0);
}

#[tokio::test]
async fn concurrent_connect_rejected_while_in_flight() {
    let (coordinator, eip155, cosmos) = two_namespaces();
    eip155.pause();

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.connect(Selection::any()).await }
    });
    wait_for_state(&coordinator, UnifiedStatus::Connecting).await;

    let err = coordinator
        .connect(Selection::namespace("cosmos"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::ConnectionInProgress);
    let err = coordinator.reconnect(Selection::any()).await.unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::ConnectionInProgress);
    assert_eq!(cosmos.calls("connect"), 0);
    assert_eq!(eip155.calls("reconnect"), 0);

    eip155.resume();
    let connection = first.await.unwrap().unwrap();
    assert_eq!(connection.namespace(), "eip155");
    assert_eq!(eip155.calls("connect"), 1);
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
}

#[tokio::test]
async fn connect_guard_runs_before_namespace_resolution() {
    let (coordinator, _, _) = two_namespaces();
    coordinator.connect(Selection::any()).await.unwrap();

    let err = coordinator
        .connect(Selection::namespace("solana"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::AlreadyConnected);
}

#[tokio::test]
async fn in_flight_guard_runs_before_namespace_resolution() {
    let (coordinator, eip155, _) = two_namespaces();
    eip155.pause();

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.connect(Selection::any()).await }
    });
    wait_for_state(&coordinator, UnifiedStatus::Connecting).await;

    let err = coordinator
        .connect(Selection::namespace("solana"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::ConnectionInProgress);
    let err = coordinator
        .reconnect(Selection::namespace("solana"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::ConnectionInProgress);

    eip155.resume();
    first.await.unwrap().unwrap();
}

#[tokio::test]
async fn connect_while_adapter_reconnecting_fails() {
    let (coordinator, _, cosmos) = two_namespaces();
    cosmos.set_status(AdapterStatus::Reconnecting);

    let err = coordinator.connect(Selection::any()).await.unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::ConnectionInProgress);
}

#[tokio::test]
async fn failed_connect_returns_to_disconnected() {
    let (coordinator, adapters) = build(vec![
        eip155_config().failing_connect(AdapterError::UserRejected),
        cosmos_config(),
    ]);
    let (seen, _sub) = record_status(&coordinator);

    let err = coordinator.connect(Selection::any()).await.unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::AdapterFailure);
    assert_eq!(err.adapter_error(), Some(&AdapterError::UserRejected));
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
    assert!(coordinator.connections().is_empty());
    assert_eq!(
        *seen.lock(),
        vec![UnifiedStatus::Connecting, UnifiedStatus::Disconnected]
    );

    // The guard is released, so a retry reaches the adapter again.
    adapters[0].set_connect_failure(None);
    coordinator.connect(Selection::any()).await.unwrap();
    assert_eq!(adapters[0].calls("connect"), 2);
}

#[tokio::test]
async fn connector_not_offered_is_adapter_failure() {
    let (coordinator, _, _) = two_namespaces();
    let err = coordinator
        .connect(Selection::namespace("eip155").with_connector(keplr()))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::AdapterFailure);
    assert_eq!(
        err.adapter_error(),
        Some(&AdapterError::ConnectorNotFound("keplr".into()))
    );
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

#[tokio::test]
async fn connect_without_connectors_fails() {
    let (coordinator, _) = build(vec![MockConfig::new("eip155").with_connectors(vec![])]);
    let err = coordinator.connect(Selection::any()).await.unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::NoConnectorAvailable);
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

#[tokio::test]
async fn unknown_namespace_lists_available() {
    let (coordinator, eip155, cosmos) = two_namespaces();

    let err = coordinator
        .connect(Selection::namespace("solana"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::UnknownNamespace);
    assert_eq!(
        err.available_namespaces(),
        Some(vec!["eip155".to_string(), "cosmos".to_string()])
    );
    assert_eq!(eip155.calls("connect") + cosmos.calls("connect"), 0);
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

// ─────────────────────────────────────────────────────────────────────────────
// Disconnect
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_disconnect_round_trip() {
    let (coordinator, eip155, _) = two_namespaces();
    let (seen, _sub) = record_status(&coordinator);

    coordinator.connect(Selection::any()).await.unwrap();
    coordinator.disconnect(Selection::any()).await.unwrap();

    assert!(coordinator.connections().is_empty());
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
    assert!(!eip155.has_session("injected"));
    assert_eq!(
        *seen.lock(),
        vec![
            UnifiedStatus::Connecting,
            UnifiedStatus::Connected,
            UnifiedStatus::Disconnected,
        ]
    );
}

#[tokio::test]
async fn second_disconnect_is_noop() {
    let (coordinator, eip155, _) = two_namespaces();
    coordinator.connect(Selection::any()).await.unwrap();
    coordinator.disconnect(Selection::any()).await.unwrap();

    coordinator.disconnect(Selection::any()).await.unwrap();

    assert_eq!(eip155.calls("disconnect"), 1);
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

#[tokio::test]
async fn disconnect_when_never_connected_is_noop() {
    let (coordinator, eip155, _) = two_namespaces();
    coordinator.disconnect(Selection::any()).await.unwrap();
    coordinator
        .disconnect(Selection::namespace("eip155").with_connector(keplr()))
        .await
        .unwrap();
    assert_eq!(eip155.calls("disconnect"), 0);
}

#[tokio::test]
async fn disconnect_without_record_while_connected_fails() {
    let (coordinator, eip155, _) = two_namespaces();
    eip155.set_status(AdapterStatus::Connected);

    let err = coordinator.disconnect(Selection::any()).await.unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::NoActiveConnection);
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
    assert_eq!(eip155.calls("disconnect"), 0);
}

#[tokio::test]
async fn disconnect_unrecorded_connector_reaches_adapter() {
    let (coordinator, eip155, _) = two_namespaces();
    eip155.set_status(AdapterStatus::Connected);

    coordinator
        .disconnect(Selection::connector(ConnectorDescriptor::new("injected", "Browser Wallet")))
        .await
        .unwrap();

    assert_eq!(eip155.calls("disconnect"), 1);
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

#[tokio::test]
async fn failed_disconnect_keeps_record() {
    let (coordinator, eip155, _) = two_namespaces();
    coordinator.connect(Selection::any()).await.unwrap();
    eip155.set_disconnect_failure(Some(AdapterError::Other("wallet locked".into())));

    let err = coordinator.disconnect(Selection::any()).await.unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::AdapterFailure);
    assert_eq!(err.message, "wallet locked");
    assert_eq!(coordinator.connections().len(), 1);
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
}

#[tokio::test]
async fn adapter_side_disconnect_clears_state() {
    let (coordinator, eip155, _) = two_namespaces();
    coordinator.connect(Selection::any()).await.unwrap();
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = sizes.clone();
    let _sub = coordinator.subscribe_connections(move |list| sink.lock().push(list.len()));

    // The wallet drops the session without going through the coordinator.
    eip155.set_status(AdapterStatus::Disconnected);

    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
    assert!(coordinator.connections().is_empty());
    assert!(coordinator.current_connection().is_none());
    assert_eq!(*sizes.lock(), vec![0]);

    // Nothing left to disconnect, and connecting again is allowed.
    coordinator.disconnect(Selection::any()).await.unwrap();
    assert_eq!(eip155.calls("disconnect"), 0);
    coordinator.connect(Selection::any()).await.unwrap();
    assert_eq!(eip155.calls("connect"), 2);
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
}

#[tokio::test]
async fn adapter_side_disconnect_keeps_other_namespaces() {
    let (coordinator, eip155, _) = two_namespaces();
    coordinator.connect(Selection::any()).await.unwrap();
    coordinator
        .reconnect(Selection::namespace("cosmos").with_connector(keplr()))
        .await
        .unwrap();

    eip155.set_status(AdapterStatus::Disconnected);

    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
    let namespaces: Vec<_> = coordinator
        .connections()
        .into_iter()
        .map(|c| c.namespace().to_string())
        .collect();
    assert_eq!(namespaces, vec!["cosmos"]);
}

#[tokio::test]
async fn disconnect_unknown_namespace_fails() {
    let (coordinator, _, _) = two_namespaces();
    let err = coordinator
        .disconnect(Selection::namespace("solana"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::UnknownNamespace);
}

// ─────────────────────────────────────────────────────────────────────────────
// Multi-namespace
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn connections_in_two_namespaces() {
    let (coordinator, eip155, cosmos) = two_namespaces();

    coordinator.connect(Selection::any()).await.unwrap();
    // A second namespace can join through reconnect, which is allowed
    // while connected.
    let cosmos_conn = coordinator
        .reconnect(Selection::namespace("cosmos").with_connector(keplr()))
        .await
        .unwrap();

    assert_eq!(coordinator.connections().len(), 2);
    assert_eq!(coordinator.current_connection(), Some(cosmos_conn));
    assert_eq!(
        coordinator.current_connection_in("eip155").unwrap().connector.id,
        "injected"
    );

    // Disconnecting the current (cosmos) leaves eip155 connected.
    coordinator.disconnect(Selection::any()).await.unwrap();
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
    assert!(!cosmos.has_session("keplr"));
    assert_eq!(coordinator.current_connection().unwrap().namespace(), "eip155");

    coordinator.disconnect(Selection::namespace("eip155")).await.unwrap();
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
    assert!(!eip155.has_session("injected"));
}

#[tokio::test]
async fn connections_subscription_sees_every_change() {
    let (coordinator, _, _) = two_namespaces();
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = sizes.clone();
    let _sub = coordinator.subscribe_connections(move |list| sink.lock().push(list.len()));

    coordinator.connect(Selection::any()).await.unwrap();
    coordinator
        .reconnect(Selection::namespace("cosmos"))
        .await
        .unwrap();
    coordinator.disconnect(Selection::namespace("eip155")).await.unwrap();

    assert_eq!(*sizes.lock(), vec![1, 2, 1]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconnect
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reconnect_restores_session() {
    let (coordinator, adapters) = build(vec![MockConfig::new("eip155")]);
    let first = coordinator.connect(Selection::any()).await.unwrap();
    let (seen, _sub) = record_status(&coordinator);

    let again = coordinator.reconnect(Selection::any()).await.unwrap();

    // No configured addresses: the mock made one up and restores it.
    assert_eq!(again.record.addresses, first.record.addresses);
    assert_eq!(adapters[0].calls("reconnect"), 1);
    assert_eq!(coordinator.connections().len(), 1);
    // The adapter passes through `reconnecting` on its way back.
    assert_eq!(
        *seen.lock(),
        vec![UnifiedStatus::Connecting, UnifiedStatus::Connected]
    );
}

#[tokio::test]
async fn reconnect_from_disconnected() {
    let (coordinator, _, _) = two_namespaces();
    let (seen, _sub) = record_status(&coordinator);

    coordinator.reconnect(Selection::any()).await.unwrap();

    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
    assert_eq!(
        *seen.lock(),
        vec![UnifiedStatus::Connecting, UnifiedStatus::Connected]
    );
}

#[tokio::test]
async fn reconnect_unsupported() {
    let (coordinator, adapters) = build(vec![MockConfig::new("eip155").without_reconnect()]);

    let err = coordinator.reconnect(Selection::any()).await.unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::UnsupportedAction);
    assert_eq!(adapters[0].calls("reconnect"), 0);
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

// ─────────────────────────────────────────────────────────────────────────────
// Connector picker
// ─────────────────────────────────────────────────────────────────────────────

struct Reject;

impl ConnectorPicker for Reject {
    async fn pick(&self, _options: &[ConnectorOption]) -> Result<ConnectorOption, FractlError> {
        Err(FractlError::selection_rejected("closed the modal"))
    }
}

#[tokio::test]
async fn picker_chooses_connector() {
    let (coordinator, eip155, cosmos) = two_namespaces();

    let connection = coordinator
        .connect_with_picker(&ConnectorById("keplr".into()))
        .await
        .unwrap();

    assert_eq!(connection.namespace(), "cosmos");
    assert_eq!(cosmos.calls("connect"), 1);
    assert_eq!(eip155.calls("connect"), 0);
}

#[tokio::test]
async fn first_connector_picker() {
    let (coordinator, _, _) = two_namespaces();
    let connection = coordinator.connect_with_picker(&FirstConnector).await.unwrap();
    assert_eq!(connection.key.to_string(), "eip155/injected");
}

#[tokio::test]
async fn picker_rejection_surfaces() {
    let (coordinator, eip155, _) = two_namespaces();

    let err = coordinator.connect_with_picker(&Reject).await.unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::SelectionRejected);
    assert_eq!(eip155.calls("connect"), 0);
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

#[tokio::test]
async fn picker_not_shown_while_connected() {
    let (coordinator, _, _) = two_namespaces();
    coordinator.connect(Selection::any()).await.unwrap();
    let err = coordinator.connect_with_picker(&Reject).await.unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::AlreadyConnected);
}

#[tokio::test]
async fn picker_without_connectors() {
    let (coordinator, _) = build(vec![
        MockConfig::new("eip155").with_connectors(vec![]),
        MockConfig::new("cosmos").with_connectors(vec![]),
    ]);
    let err = coordinator.connect_with_picker(&FirstConnector).await.unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::NoConnectorAvailable);
}

// ─────────────────────────────────────────────────────────────────────────────
// Deadlines
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn timed_out_connect_settles_later() {
    let (coordinator, adapters) = build_with(
        vec![eip155_config().with_connect_delay_ms(200)],
        CoordinatorConfig::default().with_call_timeout(Duration::from_millis(20)),
    );

    let err = coordinator.connect(Selection::any()).await.unwrap_err();

    assert_eq!(err.error_code(), FractlErrorCode::Timeout);
    assert_eq!(coordinator.state(), UnifiedStatus::Connecting);

    // Still in flight: a second attempt is refused.
    let err = coordinator.connect(Selection::any()).await.unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::ConnectionInProgress);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(coordinator.state(), UnifiedStatus::Connected);
    assert_eq!(coordinator.connections().len(), 1);
    assert_eq!(adapters[0].calls("connect"), 1);
}

#[tokio::test]
async fn deadline_not_hit() {
    let (coordinator, _) = build_with(
        vec![eip155_config()],
        CoordinatorConfig::default().with_call_timeout(Duration::from_secs(5)),
    );
    coordinator.connect(Selection::any()).await.unwrap();
    coordinator.disconnect(Selection::any()).await.unwrap();
    assert_eq!(coordinator.state(), UnifiedStatus::Disconnected);
}

// ─────────────────────────────────────────────────────────────────────────────
// Pass-through calls
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn watch_account_after_connect() {
    let (coordinator, adapters) = build(vec![eip155_config().with_name("0xabc", "alice.eth")]);
    let connection = coordinator.connect(Selection::any()).await.unwrap();

    let account = coordinator
        .watch_account(Some("eip155"), connection.primary_address().unwrap())
        .await
        .unwrap();

    let data = account.get();
    assert_eq!(data.address, "0xabc");
    assert_eq!(data.name.as_deref(), Some("alice.eth"));
    assert_eq!(data.chain_id.unwrap().reference, ChainReference::Number(1));
    assert_eq!(adapters[0].calls("watchAccount"), 1);
}

#[tokio::test]
async fn call_never_touches_connection_state() {
    let (coordinator, _) = build(vec![eip155_config().with_custom_method("signMessage")]);
    let (seen, _sub) = record_status(&coordinator);

    let output = coordinator
        .call(
            None,
            Action::Custom("signMessage".into()),
            Some(json!({"message": "gm"})),
        )
        .await
        .unwrap();

    assert_eq!(output.into_value().unwrap()["params"]["message"], "gm");
    assert!(coordinator.connections().is_empty());
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn call_with_string_action_args() {
    let (coordinator, _, cosmos) = two_namespaces();

    let output = coordinator
        .call(Some("cosmos"), "watchAccount".parse().unwrap(), Some(json!("cosmos1xyz")))
        .await
        .unwrap();

    assert_eq!(output.into_account().unwrap().get().address, "cosmos1xyz");
    assert_eq!(cosmos.calls("watchAccount"), 1);
}

#[tokio::test]
async fn call_unknown_namespace_wins_over_bad_args() {
    let (coordinator, _, _) = two_namespaces();
    let err = coordinator
        .call(Some("solana"), Action::WatchAccount, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::UnknownNamespace);

    let err = coordinator
        .call(Some("eip155"), Action::WatchAccount, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::InvalidParams);
}

#[tokio::test]
async fn call_unsupported_custom_action() {
    let (coordinator, _, _) = two_namespaces();
    let err = coordinator
        .call(None, Action::Custom("switchChain".into()), Some(json!(10)))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), FractlErrorCode::UnsupportedAction);
}

#[tokio::test]
async fn adapter_handle_exposed() {
    let (coordinator, _, _) = two_namespaces();
    let adapter = coordinator.adapter("cosmos").unwrap();
    assert_eq!(adapter.connectors_dyn()[0].id, "keplr");
    assert!(coordinator.adapter("solana").is_none());
}
