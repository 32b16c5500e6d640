//! Mock namespace configuration and the demo config file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fractl_core::{Coordinator, CoordinatorConfig, NamespaceConfig};
use fractl_protocol::{AdapterError, ChainReference, ConnectorDescriptor, FractlError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapter::MockAdapter;

/// Behavior of one mock namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockConfig {
    pub namespace: String,
    #[serde(default = "default_connectors")]
    pub connectors: Vec<ConnectorDescriptor>,
    /// Addresses returned on connect. Empty means one random address.
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default = "default_chain")]
    pub chain: ChainReference,
    #[serde(default)]
    pub connect_delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_connect: Option<AdapterError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_disconnect: Option<AdapterError>,
    /// Custom action names this adapter answers.
    #[serde(default)]
    pub custom_methods: Vec<String>,
    #[serde(default = "default_true")]
    pub supports_reconnect: bool,
    /// address → display name published by `watchAccount`
    #[serde(default)]
    pub names: HashMap<String, String>,
}

fn default_connectors() -> Vec<ConnectorDescriptor> {
    vec![ConnectorDescriptor::new("injected", "Injected")]
}

fn default_chain() -> ChainReference {
    ChainReference::Number(1)
}

fn default_true() -> bool {
    true
}

impl MockConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            connectors: default_connectors(),
            addresses: Vec::new(),
            chain: default_chain(),
            connect_delay_ms: 0,
            fail_connect: None,
            fail_disconnect: None,
            custom_methods: Vec::new(),
            supports_reconnect: true,
            names: HashMap::new(),
        }
    }

    pub fn with_connectors(mut self, connectors: Vec<ConnectorDescriptor>) -> Self {
        self.connectors = connectors;
        self
    }

    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_chain(mut self, chain: impl Into<ChainReference>) -> Self {
        self.chain = chain.into();
        self
    }

    pub fn with_connect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.connect_delay_ms = delay_ms;
        self
    }

    pub fn failing_connect(mut self, error: AdapterError) -> Self {
        self.fail_connect = Some(error);
        self
    }

    pub fn with_custom_method(mut self, method: impl Into<String>) -> Self {
        self.custom_methods.push(method.into());
        self
    }

    pub fn without_reconnect(mut self) -> Self {
        self.supports_reconnect = false;
        self
    }

    pub fn with_name(mut self, address: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(address.into(), name.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Coordinator settings plus the mock namespaces to run it over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoConfig {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub namespaces: Vec<MockConfig>,
}

impl DemoConfig {
    /// Two namespaces, `eip155` then `cosmos`.
    pub fn sample() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            namespaces: vec![
                MockConfig::new("eip155").with_connectors(vec![
                    ConnectorDescriptor::new("injected", "Browser Wallet"),
                    ConnectorDescriptor::new("walletConnect", "WalletConnect"),
                ]),
                MockConfig::new("cosmos")
                    .with_connectors(vec![ConnectorDescriptor::new("keplr", "Keplr")])
                    .with_chain("cosmoshub-4"),
            ],
        }
    }

    /// Load a JSON (or JSONC) config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let stripped = strip_jsonc_comments(&content);
        let config = serde_json::from_str(&stripped).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Build one mock adapter per namespace and a coordinator over them.
    /// The adapters are returned too so callers can script them.
    pub fn build(&self) -> Result<(Coordinator, Vec<Arc<MockAdapter>>), FractlError> {
        let adapters: Vec<Arc<MockAdapter>> = self
            .namespaces
            .iter()
            .map(|ns| Arc::new(MockAdapter::new(ns.clone())))
            .collect();
        let namespaces = self
            .namespaces
            .iter()
            .zip(&adapters)
            .map(|(ns, adapter)| NamespaceConfig::shared(ns.namespace.clone(), adapter.clone()))
            .collect();
        let coordinator = Coordinator::with_config(namespaces, self.coordinator.clone())?;
        Ok((coordinator, adapters))
    }
}

/// Strip C-style comments from JSONC content.
fn strip_jsonc_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            result.push(ch);
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match (ch, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                result.push(ch);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => result.push(ch),
        }
    }

    result
}
