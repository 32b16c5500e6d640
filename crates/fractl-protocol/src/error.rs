//! Fractl error types and stable error codes.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Error codes for every failure the coordinator can surface.
///
/// `InvalidParams` and `InternalError` share the JSON-RPC 2.0 values so
/// hosts that forward errors over JSON-RPC need no translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractlErrorCode {
    // JSON-RPC 2.0 standard errors
    InvalidParams,
    InternalError,

    // Construction
    ConfigurationError,

    // Caller errors
    UnknownNamespace,
    UnsupportedAction,

    // Preconditions
    NoConnectorAvailable,
    NoActiveConnection,

    // State machine guards
    AlreadyConnected,
    ConnectionInProgress,

    // Adapter / boundary
    AdapterFailure,
    Timeout,
    SelectionRejected,

    // Custom code
    Custom(i32),
}

impl FractlErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ConfigurationError => -32010,
            Self::UnknownNamespace => -32011,
            Self::UnsupportedAction => -32012,
            Self::NoConnectorAvailable => -32013,
            Self::NoActiveConnection => -32014,
            Self::AlreadyConnected => -32015,
            Self::ConnectionInProgress => -32016,
            Self::AdapterFailure => -32017,
            Self::Timeout => -32018,
            Self::SelectionRejected => -32019,
            Self::Custom(c) => *c,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32010 => Self::ConfigurationError,
            -32011 => Self::UnknownNamespace,
            -32012 => Self::UnsupportedAction,
            -32013 => Self::NoConnectorAvailable,
            -32014 => Self::NoActiveConnection,
            -32015 => Self::AlreadyConnected,
            -32016 => Self::ConnectionInProgress,
            -32017 => Self::AdapterFailure,
            -32018 => Self::Timeout,
            -32019 => Self::SelectionRejected,
            c => Self::Custom(c),
        }
    }

    /// Whether a caller can reasonably retry after changing its input or
    /// waiting for the state machine to settle.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigurationError | Self::InternalError)
    }
}

/// Failure reported by an adapter's own connect/disconnect/reconnect work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum AdapterError {
    #[error("request rejected by user")]
    UserRejected,
    #[error("connector not found: {0}")]
    ConnectorNotFound(String),
    #[error("chain not supported: {0}")]
    UnsupportedChain(String),
    #[error("{0}")]
    Other(String),
}

/// Coordinator error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractlError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip)]
    source: Option<AdapterError>,
}

impl FractlError {
    pub fn new(code: FractlErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FractlErrorCode::ConfigurationError, message)
    }

    pub fn unknown_namespace(namespace: &str, available: &[String]) -> Self {
        Self::new(
            FractlErrorCode::UnknownNamespace,
            format!(
                "Namespace does not exist: {namespace}. Available namespaces: [{}]",
                available.join(", ")
            ),
        )
        .with_data(json!({ "namespace": namespace, "available": available }))
    }

    pub fn unsupported_action(namespace: &str, action: &str) -> Self {
        Self::new(
            FractlErrorCode::UnsupportedAction,
            format!("Adapter for {namespace} does not support action: {action}"),
        )
        .with_data(json!({ "namespace": namespace, "action": action }))
    }

    pub fn no_connector_available(namespace: &str) -> Self {
        Self::new(
            FractlErrorCode::NoConnectorAvailable,
            format!("No connector available in namespace {namespace}"),
        )
    }

    pub fn no_active_connection() -> Self {
        Self::new(FractlErrorCode::NoActiveConnection, "No active connection")
    }

    pub fn already_connected() -> Self {
        Self::new(FractlErrorCode::AlreadyConnected, "Already connected")
    }

    pub fn connection_in_progress() -> Self {
        Self::new(
            FractlErrorCode::ConnectionInProgress,
            "A connection attempt is already in progress",
        )
    }

    pub fn adapter_failure(namespace: &str, action: &str, error: AdapterError) -> Self {
        let mut err = Self::new(FractlErrorCode::AdapterFailure, error.to_string()).with_data(
            json!({ "namespace": namespace, "action": action }),
        );
        err.source = Some(error);
        err
    }

    pub fn timeout(action: &str, after_ms: u64) -> Self {
        Self::new(
            FractlErrorCode::Timeout,
            format!("{action} did not settle within {after_ms}ms"),
        )
        .with_data(json!({ "action": action, "afterMs": after_ms }))
    }

    pub fn selection_rejected(message: impl Into<String>) -> Self {
        Self::new(FractlErrorCode::SelectionRejected, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(FractlErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FractlErrorCode::InternalError, message)
    }

    pub fn error_code(&self) -> FractlErrorCode {
        FractlErrorCode::from_code(self.code)
    }

    /// The namespaces a caller may retry with, for `UnknownNamespace` errors.
    pub fn available_namespaces(&self) -> Option<Vec<String>> {
        let available = self.data.as_ref()?.get("available")?.as_array()?;
        available
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// The adapter's own error, for `AdapterFailure` errors.
    pub fn adapter_error(&self) -> Option<&AdapterError> {
        self.source.as_ref()
    }
}

impl PartialEq for FractlError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message && self.data == other.data
    }
}

impl std::fmt::Display for FractlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fractl Error [{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for FractlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}
