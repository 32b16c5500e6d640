//! Connection data model shared by the coordinator and its adapters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FractlError;

/// Chain reference within a namespace, either a string or an integer
/// (`1` for Ethereum mainnet, `"cosmoshub-4"` for the Cosmos hub).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainReference {
    Number(u64),
    String(String),
}

impl fmt::Display for ChainReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ChainReference {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for ChainReference {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// Fully-qualified chain id. Displays and parses as CAIP-2 text
/// (`eip155:1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId {
    pub namespace: String,
    pub reference: ChainReference,
}

impl ChainId {
    pub fn new(namespace: impl Into<String>, reference: impl Into<ChainReference>) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl FromStr for ChainId {
    type Err = FractlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, reference) = s
            .split_once(':')
            .ok_or_else(|| FractlError::invalid_params(format!("Invalid chain id: {s}")))?;
        if namespace.is_empty() || reference.is_empty() {
            return Err(FractlError::invalid_params(format!("Invalid chain id: {s}")));
        }
        let reference = match reference.parse::<u64>() {
            Ok(n) => ChainReference::Number(n),
            Err(_) => ChainReference::String(reference.to_string()),
        };
        Ok(Self {
            namespace: namespace.to_string(),
            reference,
        })
    }
}

/// A selectable wallet connector within one namespace.
///
/// The coordinator treats it as opaque beyond `id`, which is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ConnectorDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// One entry of the flattened connector list: a connector and the
/// namespace that offers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorOption {
    pub namespace: String,
    pub connector: ConnectorDescriptor,
}

/// What an adapter yields from a successful connect or reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResult {
    pub addresses: Vec<String>,
    pub chain_id: ChainReference,
}

/// Key of the connection table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionKey {
    pub namespace: String,
    pub connector_id: String,
}

impl ConnectionKey {
    pub fn new(namespace: impl Into<String>, connector_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            connector_id: connector_id.into(),
        }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.connector_id)
    }
}

/// The fact that a connector yielded a set of addresses on a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub addresses: Vec<String>,
    pub chain_id: ChainId,
}

impl ConnectionRecord {
    pub fn from_result(namespace: &str, result: ConnectResult) -> Self {
        Self {
            addresses: result.addresses,
            chain_id: ChainId {
                namespace: namespace.to_string(),
                reference: result.chain_id,
            },
        }
    }
}

/// Projection of one connection table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub key: ConnectionKey,
    pub connector: ConnectorDescriptor,
    pub record: ConnectionRecord,
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }

    /// First address of the record, if the adapter returned any.
    pub fn primary_address(&self) -> Option<&str> {
        self.record.addresses.first().map(String::as_str)
    }
}

/// Native balance as reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Integer amount in the smallest unit, as a decimal string.
    pub value: String,
    pub decimals: u8,
    pub symbol: String,
}

/// Account details published by an adapter's `watchAccount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Balance>,
}

impl AccountData {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            chain_id: None,
            name: None,
            avatar: None,
            balance: None,
        }
    }
}
