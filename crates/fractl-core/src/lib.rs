//! Fractl Core — cross-namespace wallet connection coordinator.
//!
//! Each chain namespace is served by an [`Adapter`] with its own
//! asynchronous lifecycle and status. The [`Coordinator`] folds those
//! statuses into one, dispatches connect/disconnect/reconnect to the right
//! adapter, and keeps the authoritative table of active connections.
//! State changes are published through [`Store`] subscriptions, so no
//! particular UI technology is assumed.

pub mod adapter;
pub mod aggregator;
pub mod config;
pub mod connections;
pub mod coordinator;
pub mod dispatch;
pub mod picker;
pub mod registry;
pub mod store;

pub use adapter::{Adapter, AdapterRef, DynAdapter, NamespaceConfig};
pub use aggregator::StatusAggregator;
pub use config::CoordinatorConfig;
pub use connections::ConnectionTable;
pub use coordinator::{Coordinator, Selection};
pub use dispatch::{ActionDispatcher, ActionOutput};
pub use picker::{ConnectorById, ConnectorPicker, FirstConnector};
pub use registry::AdapterRegistry;
pub use store::{Listener, Store, Subscription};
