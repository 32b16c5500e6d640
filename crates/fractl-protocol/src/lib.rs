//! Fractl — Protocol Types
//!
//! Data model for coordinating wallet connections across chain
//! namespaces. This crate is the single source of truth for connection
//! records, statuses, action names, notification names, and error codes.
//! It has no runtime: adapters and the coordinator live in `fractl-core`.

pub mod action;
pub mod error;
pub mod notifications;
pub mod status;
pub mod types;

pub use action::{Action, ActionRequest};
pub use error::{AdapterError, FractlError, FractlErrorCode};
pub use notifications::{FractlNotification, NotificationName, Notifications};
pub use status::{unify, AdapterStatus, UnifiedStatus};
pub use types::{
    AccountData, Balance, ChainId, ChainReference, ConnectResult, Connection, ConnectionKey,
    ConnectionRecord, ConnectorDescriptor, ConnectorOption,
};
