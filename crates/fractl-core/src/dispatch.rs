//! ActionDispatcher — resolves a namespace and forwards one action to its
//! adapter.

use std::sync::Arc;

use fractl_protocol::{AccountData, ActionRequest, ConnectResult, FractlError};
use serde_json::Value;
use tracing::debug;

use crate::registry::AdapterRegistry;
use crate::store::Store;

/// Adapter-defined result of a dispatched action.
#[derive(Debug)]
pub enum ActionOutput {
    Connected(ConnectResult),
    Disconnected,
    Account(Store<AccountData>),
    Custom(Value),
}

impl ActionOutput {
    pub fn into_connect_result(self) -> Option<ConnectResult> {
        match self {
            Self::Connected(result) => Some(result),
            _ => None,
        }
    }

    pub fn into_account(self) -> Option<Store<AccountData>> {
        match self {
            Self::Account(store) => Some(store),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Custom(value) => Some(value),
            _ => None,
        }
    }
}

/// Stateless forwarder. It performs no retries and never touches the
/// connection table; recording outcomes is the coordinator's job.
#[derive(Clone)]
pub struct ActionDispatcher {
    registry: Arc<AdapterRegistry>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    /// Forward `request` to the adapter for `namespace` (default adapter
    /// when `None`).
    ///
    /// Fails with `UnknownNamespace` on a registry miss, `UnsupportedAction`
    /// when the adapter does not implement the action, and `AdapterFailure`
    /// wrapping whatever the adapter returned.
    pub async fn dispatch(
        &self,
        namespace: Option<&str>,
        request: ActionRequest,
    ) -> Result<ActionOutput, FractlError> {
        let (namespace, adapter) = self.registry.resolve(namespace)?;
        let action = request.action();

        if !adapter.supports_dyn(&action) {
            return Err(FractlError::unsupported_action(namespace, action.as_str()));
        }

        debug!(
            "Calling {} in {} with args: {}",
            action,
            namespace,
            request.summary()
        );

        let fail = |e| FractlError::adapter_failure(namespace, action.as_str(), e);
        match request {
            ActionRequest::Connect(connector) => adapter
                .connect_dyn(&connector)
                .await
                .map(ActionOutput::Connected)
                .map_err(fail),
            ActionRequest::Disconnect(connector) => adapter
                .disconnect_dyn(&connector)
                .await
                .map(|()| ActionOutput::Disconnected)
                .map_err(fail),
            ActionRequest::Reconnect(connector) => adapter
                .reconnect_dyn(&connector)
                .await
                .map(ActionOutput::Connected)
                .map_err(fail),
            ActionRequest::WatchAccount(address) => adapter
                .watch_account_dyn(&address)
                .map(ActionOutput::Account)
                .map_err(fail),
            ActionRequest::Custom { method, params } => adapter
                .handle_dyn(&method, params)
                .await
                .map(ActionOutput::Custom)
                .map_err(fail),
        }
    }
}
