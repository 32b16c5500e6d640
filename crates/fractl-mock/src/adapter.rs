//! In-memory adapter with scriptable outcomes.
//!
//! Drives its own status store the way a real wallet adapter would:
//! `connecting` then `connected` on connect, `reconnecting` then
//! `connected` on reconnect, `disconnected` once its last session ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fractl_core::{Adapter, Store};
use fractl_protocol::{
    AccountData, Action, AdapterError, AdapterStatus, ChainId, ConnectResult, ConnectorDescriptor,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::sync::Notify;
use tracing::debug;

use crate::config::MockConfig;

pub struct MockAdapter {
    config: RwLock<MockConfig>,
    status: Store<AdapterStatus>,
    /// connector id → addresses of the live session
    sessions: RwLock<HashMap<String, Vec<String>>>,
    accounts: RwLock<HashMap<String, Store<AccountData>>>,
    calls: Mutex<HashMap<String, usize>>,
    paused: AtomicBool,
    resume: Notify,
}

impl MockAdapter {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: RwLock::new(config),
            status: Store::new(AdapterStatus::Disconnected),
            sessions: RwLock::new(HashMap::new()),
            accounts: RwLock::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            paused: AtomicBool::new(false),
            resume: Notify::new(),
        }
    }

    pub fn namespace(&self) -> String {
        self.config.read().namespace.clone()
    }

    /// Hold every subsequent connect/reconnect until [`MockAdapter::resume`].
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resume.notify_waiters();
    }

    /// Push a status change as if the wallet reported it.
    pub fn set_status(&self, status: AdapterStatus) {
        self.status.set(status);
    }

    /// Make subsequent connects and reconnects fail (or succeed again).
    pub fn set_connect_failure(&self, failure: Option<AdapterError>) {
        self.config.write().fail_connect = failure;
    }

    pub fn set_disconnect_failure(&self, failure: Option<AdapterError>) {
        self.config.write().fail_disconnect = failure;
    }

    /// Number of times `action` reached this adapter.
    pub fn calls(&self, action: &str) -> usize {
        self.calls.lock().get(action).copied().unwrap_or(0)
    }

    pub fn has_session(&self, connector_id: &str) -> bool {
        self.sessions.read().contains_key(connector_id)
    }

    fn record_call(&self, action: &str) {
        *self.calls.lock().entry(action.to_string()).or_default() += 1;
    }

    async fn wait_until_resumed(&self) {
        loop {
            // Register before checking the flag so a concurrent resume is
            // not missed.
            let notified = self.resume.notified();
            if !self.paused.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    fn check_offered(&self, connector: &ConnectorDescriptor) -> Result<(), AdapterError> {
        let offered = self
            .config
            .read()
            .connectors
            .iter()
            .any(|c| c.id == connector.id);
        if offered {
            Ok(())
        } else {
            Err(AdapterError::ConnectorNotFound(connector.id.clone()))
        }
    }

    /// Shared tail of connect and reconnect, after the in-progress status
    /// has been published.
    async fn open_session(
        &self,
        connector: &ConnectorDescriptor,
        restore: bool,
    ) -> Result<ConnectResult, AdapterError> {
        self.wait_until_resumed().await;

        let delay = self.config.read().connect_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let failure = self.config.read().fail_connect.clone();
        if let Some(err) = failure {
            self.settle_status();
            debug!("Mock connect failed for {}: {}", connector.id, err);
            return Err(err);
        }

        let (configured, chain) = {
            let config = self.config.read();
            (config.addresses.clone(), config.chain.clone())
        };
        let previous = if restore {
            self.sessions.read().get(&connector.id).cloned()
        } else {
            None
        };
        let addresses = match previous {
            Some(addresses) => addresses,
            None if configured.is_empty() => vec![random_address()],
            None => configured,
        };

        self.sessions
            .write()
            .insert(connector.id.clone(), addresses.clone());
        self.status.set(AdapterStatus::Connected);

        Ok(ConnectResult {
            addresses,
            chain_id: chain,
        })
    }

    /// Status after an attempt ends without a new session.
    fn settle_status(&self) {
        let status = if self.sessions.read().is_empty() {
            AdapterStatus::Disconnected
        } else {
            AdapterStatus::Connected
        };
        self.status.set(status);
    }
}

impl Adapter for MockAdapter {
    fn status(&self) -> Store<AdapterStatus> {
        self.status.clone()
    }

    fn connectors(&self) -> Vec<ConnectorDescriptor> {
        self.config.read().connectors.clone()
    }

    async fn connect(
        &self,
        connector: &ConnectorDescriptor,
    ) -> Result<ConnectResult, AdapterError> {
        self.record_call(Action::CONNECT);
        self.check_offered(connector)?;
        self.status.set(AdapterStatus::Connecting);
        self.open_session(connector, false).await
    }

    async fn disconnect(&self, connector: &ConnectorDescriptor) -> Result<(), AdapterError> {
        self.record_call(Action::DISCONNECT);

        let failure = self.config.read().fail_disconnect.clone();
        if let Some(err) = failure {
            return Err(err);
        }

        self.sessions.write().remove(&connector.id);
        self.settle_status();
        Ok(())
    }

    async fn reconnect(
        &self,
        connector: &ConnectorDescriptor,
    ) -> Result<ConnectResult, AdapterError> {
        self.record_call(Action::RECONNECT);
        self.check_offered(connector)?;
        self.status.set(AdapterStatus::Reconnecting);
        self.open_session(connector, true).await
    }

    fn watch_account(&self, address: &str) -> Result<Store<AccountData>, AdapterError> {
        self.record_call(Action::WATCH_ACCOUNT);

        if let Some(store) = self.accounts.read().get(address) {
            return Ok(store.clone());
        }

        let account = {
            let config = self.config.read();
            AccountData {
                chain_id: Some(ChainId::new(config.namespace.clone(), config.chain.clone())),
                name: config.names.get(address).cloned(),
                ..AccountData::new(address)
            }
        };
        let store = Store::new(account);
        self.accounts
            .write()
            .entry(address.to_string())
            .or_insert_with(|| store.clone());
        Ok(store)
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> Result<Value, AdapterError> {
        self.record_call(method);
        if !self.config.read().custom_methods.iter().any(|m| m == method) {
            return Err(AdapterError::Other(format!("Unhandled action: {method}")));
        }
        Ok(json!({ "method": method, "params": params }))
    }

    fn supports(&self, action: &Action) -> bool {
        let config = self.config.read();
        match action {
            Action::Reconnect => config.supports_reconnect,
            Action::Custom(method) => config.custom_methods.iter().any(|m| m == method),
            _ => true,
        }
    }
}

/// Random 20-byte hex address.
pub fn random_address() -> String {
    let bytes: [u8; 20] = rand::random();
    format!("0x{}", hex::encode(bytes))
}
