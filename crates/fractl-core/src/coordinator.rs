//! Coordinator — the public connect/disconnect/reconnect surface.
//!
//! Composes the adapter registry, the action dispatcher, the connection
//! table and the status aggregator. The unified status it exposes is the
//! reduction of every adapter's status plus the coordinator's own
//! contribution, which is `connecting` while an attempt is in flight and
//! `disconnected` otherwise. Records of a namespace are dropped when its
//! adapter reports `disconnected`.

use std::future::Future;
use std::sync::Arc;

use fractl_protocol::{
    AccountData, Action, ActionRequest, AdapterStatus, Connection, ConnectionKey,
    ConnectionRecord, ConnectorDescriptor, ConnectorOption, FractlError, UnifiedStatus,
};
use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapter::{AdapterRef, NamespaceConfig};
use crate::aggregator::StatusAggregator;
use crate::config::CoordinatorConfig;
use crate::connections::ConnectionTable;
use crate::dispatch::{ActionDispatcher, ActionOutput};
use crate::picker::ConnectorPicker;
use crate::registry::AdapterRegistry;
use crate::store::{Store, Subscription};

/// Label of the coordinator's own status source in diagnostics.
const LOCAL_SOURCE: &str = "coordinator";

/// Which namespace and connector a call targets. Both parts are optional:
/// a missing namespace means the first-registered one, a missing
/// connector means the first connector offered (connect/reconnect) or the
/// most recent connection (disconnect).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub namespace: Option<String>,
    pub connector: Option<ConnectorDescriptor>,
}

impl Selection {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            connector: None,
        }
    }

    pub fn connector(connector: ConnectorDescriptor) -> Self {
        Self {
            namespace: None,
            connector: Some(connector),
        }
    }

    pub fn with_connector(mut self, connector: ConnectorDescriptor) -> Self {
        self.connector = Some(connector);
        self
    }
}

impl From<ConnectorOption> for Selection {
    fn from(option: ConnectorOption) -> Self {
        Self {
            namespace: Some(option.namespace),
            connector: Some(option.connector),
        }
    }
}

/// Cross-namespace connection coordinator.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<AdapterRegistry>,
    dispatcher: ActionDispatcher,
    connections: Store<ConnectionTable>,
    /// The coordinator's own status source, fed into the aggregator.
    local: Store<AdapterStatus>,
    /// In-flight marker for connect/reconnect.
    in_flight: Mutex<bool>,
    /// Serializes compute-and-set of `local`. Reentrant because setting it
    /// runs listeners that may call back into the coordinator.
    local_sync: ReentrantMutex<()>,
    aggregator: StatusAggregator,
    config: CoordinatorConfig,
    /// Per-adapter status watchers that prune the connection table.
    _watchers: Vec<Subscription>,
}

/// Clears the in-flight marker when the attempt ends, however it ends
/// (settled, failed, or the awaiting future dropped).
struct AttemptGuard {
    inner: Arc<Inner>,
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        *self.inner.in_flight.lock() = false;
        self.inner.sync_local();
    }
}

struct Attempt {
    id: Uuid,
    action: Action,
    namespace: String,
    connector: ConnectorDescriptor,
}

impl Coordinator {
    /// Build a coordinator with the default configuration.
    ///
    /// Fails with `ConfigurationError` on an empty namespace list.
    pub fn new(namespaces: Vec<NamespaceConfig>) -> Result<Self, FractlError> {
        Self::with_config(namespaces, CoordinatorConfig::default())
    }

    pub fn with_config(
        namespaces: Vec<NamespaceConfig>,
        config: CoordinatorConfig,
    ) -> Result<Self, FractlError> {
        let registry = Arc::new(AdapterRegistry::new(namespaces)?);
        let local = Store::new(AdapterStatus::Disconnected);

        // Watchers subscribe ahead of the aggregator so the table is already
        // pruned when status listeners run.
        let connections = Store::new(ConnectionTable::new());
        let watchers = registry
            .list()
            .map(|(namespace, adapter)| watch_adapter(namespace, adapter, &connections))
            .collect();

        let mut sources: Vec<(String, Store<AdapterStatus>)> = registry
            .list()
            .map(|(namespace, adapter)| (namespace.to_string(), adapter.status_dyn()))
            .collect();
        sources.push((LOCAL_SOURCE.to_string(), local.clone()));
        let aggregator = StatusAggregator::new(sources);

        info!(
            "Coordinator initialized ({} namespaces, default: {})",
            registry.len(),
            registry.default_adapter().0
        );

        Ok(Self {
            inner: Arc::new(Inner {
                dispatcher: ActionDispatcher::new(registry.clone()),
                registry,
                connections,
                local,
                in_flight: Mutex::new(false),
                local_sync: ReentrantMutex::new(()),
                aggregator,
                config,
                _watchers: watchers,
            }),
        })
    }

    // ── Actions ───────────────────────────────────────────────────────────

    /// Connect through the selected connector and record the result.
    pub async fn connect(&self, selection: Selection) -> Result<Connection, FractlError> {
        self.establish(Action::Connect, selection).await
    }

    /// Restore a previously known session. Same resolution and outcome
    /// rules as [`Coordinator::connect`], but allowed while connected.
    pub async fn reconnect(&self, selection: Selection) -> Result<Connection, FractlError> {
        self.establish(Action::Reconnect, selection).await
    }

    /// Present the connector list through `picker`, then connect to the
    /// chosen option.
    pub async fn connect_with_picker<P: ConnectorPicker>(
        &self,
        picker: &P,
    ) -> Result<Connection, FractlError> {
        self.inner.check_can_start(&Action::Connect)?;

        let options = self.connectors();
        if options.is_empty() {
            return Err(FractlError::no_connector_available(
                &self.inner.registry.namespaces().join(", "),
            ));
        }

        let choice = picker.pick(&options).await?;
        self.connect(Selection::from(choice)).await
    }

    /// Disconnect the selected connector (or the current connection) and
    /// drop its record.
    ///
    /// Disconnecting something that is not recorded while the unified
    /// status is already `disconnected` is a no-op.
    pub async fn disconnect(&self, selection: Selection) -> Result<(), FractlError> {
        let Some((namespace, connector)) = self.inner.disconnect_target(&selection)? else {
            return Ok(());
        };

        let task = Inner::settle_disconnect(self.inner.clone(), namespace, connector);
        self.inner.run_with_deadline(Action::DISCONNECT, task).await
    }

    /// Pass-through to an adapter. Never touches the connection table or
    /// the coordinator's own status.
    pub async fn call(
        &self,
        namespace: Option<&str>,
        action: Action,
        args: Option<Value>,
    ) -> Result<ActionOutput, FractlError> {
        // Namespace errors take precedence over argument errors.
        self.inner.registry.resolve(namespace)?;
        let request = ActionRequest::from_params(action, args)?;
        self.inner.dispatcher.dispatch(namespace, request).await
    }

    /// Typed variant of [`Coordinator::call`].
    pub async fn call_request(
        &self,
        namespace: Option<&str>,
        request: ActionRequest,
    ) -> Result<ActionOutput, FractlError> {
        self.inner.dispatcher.dispatch(namespace, request).await
    }

    /// Live account details for `address` from the namespace's adapter.
    pub async fn watch_account(
        &self,
        namespace: Option<&str>,
        address: &str,
    ) -> Result<Store<AccountData>, FractlError> {
        let output = self
            .call_request(namespace, ActionRequest::WatchAccount(address.to_string()))
            .await?;
        output
            .into_account()
            .ok_or_else(|| FractlError::internal("watchAccount returned no account store"))
    }

    // ── Projections ───────────────────────────────────────────────────────

    pub fn state(&self) -> UnifiedStatus {
        self.inner.aggregator.status()
    }

    /// Every connector of every namespace, in registration order.
    pub fn connectors(&self) -> Vec<ConnectorOption> {
        self.inner
            .registry
            .list()
            .flat_map(|(namespace, adapter)| {
                adapter
                    .connectors_dyn()
                    .into_iter()
                    .map(move |connector| ConnectorOption {
                        namespace: namespace.to_string(),
                        connector,
                    })
            })
            .collect()
    }

    /// All recorded connections, oldest first.
    pub fn connections(&self) -> Vec<Connection> {
        self.inner.connections.with(ConnectionTable::list)
    }

    /// The most recently established connection.
    pub fn current_connection(&self) -> Option<Connection> {
        self.inner.connections.with(ConnectionTable::current)
    }

    /// The most recently established connection in one namespace.
    pub fn current_connection_in(&self, namespace: &str) -> Option<Connection> {
        self.inner.connections.with(|t| t.current_in(namespace))
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.inner.registry.namespaces()
    }

    pub fn adapter(&self, namespace: &str) -> Option<AdapterRef> {
        self.inner.registry.get(namespace).cloned()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Notifications ─────────────────────────────────────────────────────

    /// Called once per actual change of the unified status.
    pub fn subscribe_status(
        &self,
        listener: impl Fn(UnifiedStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner
            .aggregator
            .store()
            .subscribe(move |status| listener(*status))
    }

    /// Called with the full connection list after every table change.
    pub fn subscribe_connections(
        &self,
        listener: impl Fn(&[Connection]) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner
            .connections
            .subscribe(move |table| listener(table.list().as_slice()))
    }

    // ── Internal ──────────────────────────────────────────────────────────

    async fn establish(
        &self,
        action: Action,
        selection: Selection,
    ) -> Result<Connection, FractlError> {
        self.inner.check_can_start(&action)?;
        let (namespace, connector) = self.inner.select_connector(&selection)?;
        let guard = self.inner.begin_attempt(&action)?;

        let attempt = Attempt {
            id: Uuid::new_v4(),
            action: action.clone(),
            namespace,
            connector,
        };
        info!(
            attempt = %attempt.id,
            "{} {} via {}",
            attempt.action,
            attempt.namespace,
            attempt.connector.id
        );

        let task = Inner::settle_connect(self.inner.clone(), guard, attempt);
        self.inner.run_with_deadline(action.as_str(), task).await
    }
}

impl Inner {
    fn select_connector(
        &self,
        selection: &Selection,
    ) -> Result<(String, ConnectorDescriptor), FractlError> {
        let (namespace, adapter) = self.registry.resolve(selection.namespace.as_deref())?;
        let connector = match &selection.connector {
            Some(connector) => connector.clone(),
            None => adapter
                .connectors_dyn()
                .into_iter()
                .next()
                .ok_or_else(|| FractlError::no_connector_available(namespace))?,
        };
        Ok((namespace.to_string(), connector))
    }

    fn check_can_start(&self, action: &Action) -> Result<(), FractlError> {
        let in_flight = *self.in_flight.lock();
        self.check_guards(in_flight, action)
    }

    fn check_guards(&self, in_flight: bool, action: &Action) -> Result<(), FractlError> {
        if in_flight {
            return Err(FractlError::connection_in_progress());
        }
        match self.aggregator.status() {
            UnifiedStatus::Connecting => Err(FractlError::connection_in_progress()),
            UnifiedStatus::Connected if *action == Action::Connect => {
                Err(FractlError::already_connected())
            }
            _ => Ok(()),
        }
    }

    /// Re-checks the guards and marks the attempt in flight in one step.
    fn begin_attempt(self: &Arc<Self>, action: &Action) -> Result<AttemptGuard, FractlError> {
        {
            let mut in_flight = self.in_flight.lock();
            self.check_guards(*in_flight, action)?;
            *in_flight = true;
        }
        self.sync_local();
        Ok(AttemptGuard {
            inner: self.clone(),
        })
    }

    /// Recompute the coordinator's own status source. Only an attempt in
    /// flight contributes; being connected is up to the adapters.
    fn sync_local(&self) {
        let _sync = self.local_sync.lock();
        let status = if *self.in_flight.lock() {
            AdapterStatus::Connecting
        } else {
            AdapterStatus::Disconnected
        };
        self.local.set(status);
    }

    fn disconnect_target(
        &self,
        selection: &Selection,
    ) -> Result<Option<(String, ConnectorDescriptor)>, FractlError> {
        if let Some(namespace) = selection.namespace.as_deref() {
            self.registry.resolve(Some(namespace))?;
        }
        let namespace = selection.namespace.as_deref();

        let recorded = self.connections.with(|table| match &selection.connector {
            Some(connector) => table.find_by_connector(namespace, &connector.id),
            None => match namespace {
                Some(ns) => table.current_in(ns),
                None => table.current(),
            },
        });
        if let Some(connection) = recorded {
            return Ok(Some((connection.key.namespace, connection.connector)));
        }

        if self.aggregator.status() == UnifiedStatus::Disconnected {
            return Ok(None);
        }

        match &selection.connector {
            // Not recorded by us, but the adapter may still hold a session.
            Some(connector) => {
                let (ns, _) = self.registry.resolve(namespace)?;
                Ok(Some((ns.to_string(), connector.clone())))
            }
            None => Err(FractlError::no_active_connection()),
        }
    }

    async fn settle_connect(
        inner: Arc<Inner>,
        guard: AttemptGuard,
        attempt: Attempt,
    ) -> Result<Connection, FractlError> {
        let request = match attempt.action {
            Action::Reconnect => ActionRequest::Reconnect(attempt.connector.clone()),
            _ => ActionRequest::Connect(attempt.connector.clone()),
        };

        let output = match inner.dispatcher.dispatch(Some(&attempt.namespace), request).await {
            Ok(output) => output,
            Err(e) => {
                warn!(attempt = %attempt.id, "{} failed in {}: {}", attempt.action, attempt.namespace, e);
                drop(guard);
                return Err(e);
            }
        };
        let result = output.into_connect_result().ok_or_else(|| {
            FractlError::internal(format!("{} returned no connect result", attempt.action))
        })?;

        let key = ConnectionKey::new(&attempt.namespace, &attempt.connector.id);
        let record = ConnectionRecord::from_result(&attempt.namespace, result);
        let mut written = None;
        inner.connections.update(|table| {
            written = Some(table.insert(key, attempt.connector.clone(), record));
        });
        drop(guard);

        let connection = written.ok_or_else(|| FractlError::internal("connection not recorded"))?;
        info!(
            attempt = %attempt.id,
            "Connected {} ({} addresses on {})",
            connection.key,
            connection.record.addresses.len(),
            connection.record.chain_id
        );
        Ok(connection)
    }

    async fn settle_disconnect(
        inner: Arc<Inner>,
        namespace: String,
        connector: ConnectorDescriptor,
    ) -> Result<(), FractlError> {
        let request = ActionRequest::Disconnect(connector.clone());
        if let Err(e) = inner.dispatcher.dispatch(Some(&namespace), request).await {
            warn!("disconnect failed in {}: {}", namespace, e);
            return Err(e);
        }

        let key = ConnectionKey::new(&namespace, &connector.id);
        inner.connections.update(|table| {
            table.remove(&key);
        });
        info!("Disconnected {}", key);
        Ok(())
    }

    /// Await `task` inline, or on a spawned task under the configured
    /// deadline. A timed-out task keeps running and settles state later.
    async fn run_with_deadline<T, F>(&self, action: &str, task: F) -> Result<T, FractlError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, FractlError>> + Send + 'static,
    {
        let Some(limit) = self.config.call_timeout() else {
            return task.await;
        };

        let handle = tokio::spawn(task);
        match tokio::time::timeout(limit, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(FractlError::internal(format!("{action} task failed: {e}"))),
            Err(_) => {
                let after_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                warn!("{} did not settle within {}ms; leaving it to the adapter", action, after_ms);
                Err(FractlError::timeout(action, after_ms))
            }
        }
    }
}

/// Drop the namespace's records once its adapter reports `disconnected`,
/// whether or not the coordinator asked for it.
fn watch_adapter(
    namespace: &str,
    adapter: &AdapterRef,
    connections: &Store<ConnectionTable>,
) -> Subscription {
    let namespace = namespace.to_string();
    let connections = connections.clone();
    adapter.status_dyn().subscribe(move |status| {
        if *status != AdapterStatus::Disconnected {
            return;
        }
        let mut removed = 0;
        connections.update(|table| removed = table.remove_namespace(&namespace));
        if removed > 0 {
            debug!("{} reported disconnected; dropped {} connection(s)", namespace, removed);
        }
    })
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("namespaces", &self.inner.registry.namespaces())
            .field("state", &self.state())
            .field("connections", &self.inner.connections.with(ConnectionTable::len))
            .finish()
    }
}
