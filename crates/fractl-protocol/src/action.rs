//! Adapter action names and their parsed argument forms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::FractlError;
use crate::types::ConnectorDescriptor;

/// An action the dispatcher can forward to an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Connect,
    Disconnect,
    Reconnect,
    WatchAccount,
    Custom(String),
}

impl Action {
    pub const CONNECT: &'static str = "connect";
    pub const DISCONNECT: &'static str = "disconnect";
    pub const RECONNECT: &'static str = "reconnect";
    pub const WATCH_ACCOUNT: &'static str = "watchAccount";

    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => Self::CONNECT,
            Self::Disconnect => Self::DISCONNECT,
            Self::Reconnect => Self::RECONNECT,
            Self::WatchAccount => Self::WATCH_ACCOUNT,
            Self::Custom(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl FromStr for Action {
    type Err = FractlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            Self::CONNECT => Self::Connect,
            Self::DISCONNECT => Self::Disconnect,
            Self::RECONNECT => Self::Reconnect,
            Self::WATCH_ACCOUNT => Self::WatchAccount,
            "" => return Err(FractlError::invalid_params("Action name must not be empty")),
            other => Self::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An action together with its typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    Connect(ConnectorDescriptor),
    Disconnect(ConnectorDescriptor),
    Reconnect(ConnectorDescriptor),
    WatchAccount(String),
    Custom { method: String, params: Option<Value> },
}

impl ActionRequest {
    /// Build a request from an action name and untyped JSON arguments.
    ///
    /// Connector actions accept a descriptor object or a bare connector id;
    /// `watchAccount` accepts an address string or `{ "address": ... }`.
    pub fn from_params(action: Action, params: Option<Value>) -> Result<Self, FractlError> {
        match action {
            Action::Connect => Ok(Self::Connect(parse_connector(params)?)),
            Action::Disconnect => Ok(Self::Disconnect(parse_connector(params)?)),
            Action::Reconnect => Ok(Self::Reconnect(parse_connector(params)?)),
            Action::WatchAccount => Ok(Self::WatchAccount(parse_address(params)?)),
            Action::Custom(method) => Ok(Self::Custom { method, params }),
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Self::Connect(_) => Action::Connect,
            Self::Disconnect(_) => Action::Disconnect,
            Self::Reconnect(_) => Action::Reconnect,
            Self::WatchAccount(_) => Action::WatchAccount,
            Self::Custom { method, .. } => Action::Custom(method.clone()),
        }
    }

    /// Short argument rendering for diagnostics. Structured params are
    /// never dumped.
    pub fn summary(&self) -> String {
        match self {
            Self::Connect(c) | Self::Disconnect(c) | Self::Reconnect(c) => c.id.clone(),
            Self::WatchAccount(address) => address.clone(),
            Self::Custom { params, .. } => match params {
                None => "none".into(),
                Some(Value::Object(_)) | Some(Value::Array(_)) => "[object]".into(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            },
        }
    }
}

fn parse_connector(params: Option<Value>) -> Result<ConnectorDescriptor, FractlError> {
    match params {
        Some(Value::String(id)) if !id.is_empty() => Ok(ConnectorDescriptor::new(id.clone(), id)),
        Some(v @ Value::Object(_)) => serde_json::from_value(v)
            .map_err(|e| FractlError::invalid_params(format!("Invalid connector: {e}"))),
        Some(_) => Err(FractlError::invalid_params(
            "Connector must be a descriptor object or a connector id",
        )),
        None => Err(FractlError::invalid_params("Connector required")),
    }
}

fn parse_address(params: Option<Value>) -> Result<String, FractlError> {
    let address = match params {
        Some(Value::String(address)) => address,
        Some(Value::Object(map)) => match map.get("address") {
            Some(Value::String(address)) => address.clone(),
            _ => return Err(FractlError::invalid_params("Missing address")),
        },
        _ => return Err(FractlError::invalid_params("Address required")),
    };
    if address.is_empty() {
        return Err(FractlError::invalid_params("Address must not be empty"));
    }
    Ok(address)
}
