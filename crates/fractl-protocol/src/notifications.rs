//! Coordinator notification names and the JSON envelope hosts forward.
//!
//! Notifications are coordinator-to-observer messages with no response
//! expected.

use serde::{Deserialize, Serialize};

/// All coordinator notification names.
pub struct Notifications;

impl Notifications {
    // ── Status ──────────────────────────────────────────────────────────
    pub const STATUS_CHANGED: &'static str = "coordinator/statusChanged";

    // ── Connection table ────────────────────────────────────────────────
    pub const CONNECTIONS_CHANGED: &'static str = "coordinator/connectionsChanged";

    // ── Accounts ────────────────────────────────────────────────────────
    pub const ACCOUNT_CHANGED: &'static str = "account/changed";
}

/// Type alias for notification names.
pub type NotificationName = &'static str;

/// Notification envelope (no id, no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractlNotification {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl FractlNotification {
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}
