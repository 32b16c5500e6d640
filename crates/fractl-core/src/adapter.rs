//! Adapter contract — what the coordinator needs from a per-namespace
//! wallet connector implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fractl_protocol::{
    AccountData, Action, AdapterError, AdapterStatus, ConnectResult, ConnectorDescriptor,
};
use serde_json::Value;

use crate::store::Store;

/// Trait implemented by every namespace adapter.
///
/// The coordinator never constructs or destroys adapters. It subscribes to
/// `status()` and forwards calls; the adapter owns its own lifecycle.
pub trait Adapter: Send + Sync {
    /// Live status of this adapter.
    fn status(&self) -> Store<AdapterStatus>;

    /// Connectors this adapter offers, in display order.
    fn connectors(&self) -> Vec<ConnectorDescriptor>;

    fn connect(
        &self,
        connector: &ConnectorDescriptor,
    ) -> impl Future<Output = Result<ConnectResult, AdapterError>> + Send;

    fn disconnect(
        &self,
        connector: &ConnectorDescriptor,
    ) -> impl Future<Output = Result<(), AdapterError>> + Send;

    /// Restore a previously known session. Defaults to a fresh connect.
    fn reconnect(
        &self,
        connector: &ConnectorDescriptor,
    ) -> impl Future<Output = Result<ConnectResult, AdapterError>> + Send {
        self.connect(connector)
    }

    /// Live account details for one address.
    fn watch_account(&self, address: &str) -> Result<Store<AccountData>, AdapterError>;

    /// Handle an adapter-specific action.
    fn handle(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> impl Future<Output = Result<Value, AdapterError>> + Send {
        let _ = params;
        let method = method.to_string();
        async move { Err(AdapterError::Other(format!("Unhandled action: {method}"))) }
    }

    /// Whether this adapter implements `action`. Every built-in action is
    /// assumed; custom actions must be opted into.
    fn supports(&self, action: &Action) -> bool {
        action.is_builtin()
    }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe wrapper for the Adapter trait.
pub trait DynAdapter: Send + Sync {
    fn status_dyn(&self) -> Store<AdapterStatus>;
    fn connectors_dyn(&self) -> Vec<ConnectorDescriptor>;
    fn connect_dyn<'a>(
        &'a self,
        connector: &'a ConnectorDescriptor,
    ) -> BoxFuture<'a, Result<ConnectResult, AdapterError>>;
    fn disconnect_dyn<'a>(
        &'a self,
        connector: &'a ConnectorDescriptor,
    ) -> BoxFuture<'a, Result<(), AdapterError>>;
    fn reconnect_dyn<'a>(
        &'a self,
        connector: &'a ConnectorDescriptor,
    ) -> BoxFuture<'a, Result<ConnectResult, AdapterError>>;
    fn watch_account_dyn(&self, address: &str) -> Result<Store<AccountData>, AdapterError>;
    fn handle_dyn<'a>(
        &'a self,
        method: &'a str,
        params: Option<Value>,
    ) -> BoxFuture<'a, Result<Value, AdapterError>>;
    fn supports_dyn(&self, action: &Action) -> bool;
}

impl<T: Adapter> DynAdapter for T {
    fn status_dyn(&self) -> Store<AdapterStatus> {
        self.status()
    }
    fn connectors_dyn(&self) -> Vec<ConnectorDescriptor> {
        self.connectors()
    }
    fn connect_dyn<'a>(
        &'a self,
        connector: &'a ConnectorDescriptor,
    ) -> BoxFuture<'a, Result<ConnectResult, AdapterError>> {
        Box::pin(self.connect(connector))
    }
    fn disconnect_dyn<'a>(
        &'a self,
        connector: &'a ConnectorDescriptor,
    ) -> BoxFuture<'a, Result<(), AdapterError>> {
        Box::pin(self.disconnect(connector))
    }
    fn reconnect_dyn<'a>(
        &'a self,
        connector: &'a ConnectorDescriptor,
    ) -> BoxFuture<'a, Result<ConnectResult, AdapterError>> {
        Box::pin(self.reconnect(connector))
    }
    fn watch_account_dyn(&self, address: &str) -> Result<Store<AccountData>, AdapterError> {
        self.watch_account(address)
    }
    fn handle_dyn<'a>(
        &'a self,
        method: &'a str,
        params: Option<Value>,
    ) -> BoxFuture<'a, Result<Value, AdapterError>> {
        Box::pin(self.handle(method, params))
    }
    fn supports_dyn(&self, action: &Action) -> bool {
        self.supports(action)
    }
}

/// Shared handle to a type-erased adapter.
pub type AdapterRef = Arc<dyn DynAdapter>;

/// One namespace and the adapter that serves it, as supplied at
/// construction.
#[derive(Clone)]
pub struct NamespaceConfig {
    pub namespace: String,
    pub adapter: AdapterRef,
}

impl NamespaceConfig {
    pub fn new<A: Adapter + 'static>(namespace: impl Into<String>, adapter: A) -> Self {
        Self {
            namespace: namespace.into(),
            adapter: Arc::new(adapter),
        }
    }

    /// Use an adapter the caller keeps a handle to.
    pub fn shared<A: Adapter + 'static>(namespace: impl Into<String>, adapter: Arc<A>) -> Self {
        Self {
            namespace: namespace.into(),
            adapter,
        }
    }
}

impl std::fmt::Debug for NamespaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceConfig")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
