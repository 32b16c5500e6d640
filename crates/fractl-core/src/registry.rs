//! AdapterRegistry — one adapter per namespace, fixed at construction.

use std::collections::HashSet;

use fractl_protocol::FractlError;
use tracing::info;

use crate::adapter::{AdapterRef, NamespaceConfig};

/// Ordered, immutable namespace → adapter table.
///
/// Construction order is significant: the first namespace is the default
/// used whenever a caller does not name one.
pub struct AdapterRegistry {
    entries: Vec<(String, AdapterRef)>,
}

impl AdapterRegistry {
    /// Build the registry. Fails on an empty list, an empty namespace
    /// string, or a namespace listed twice.
    pub fn new(namespaces: Vec<NamespaceConfig>) -> Result<Self, FractlError> {
        if namespaces.is_empty() {
            return Err(FractlError::configuration("No namespaces provided"));
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(namespaces.len());
        for NamespaceConfig { namespace, adapter } in namespaces {
            if namespace.is_empty() {
                return Err(FractlError::configuration("Namespace must not be empty"));
            }
            if !seen.insert(namespace.clone()) {
                return Err(FractlError::configuration(format!(
                    "Namespace registered twice: {namespace}"
                )));
            }
            info!("Registering adapter: {}", namespace);
            entries.push((namespace, adapter));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, namespace: &str) -> Option<&AdapterRef> {
        self.entries
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, adapter)| adapter)
    }

    /// The first-registered namespace and its adapter.
    pub fn default_adapter(&self) -> (&str, &AdapterRef) {
        // Non-empty by construction.
        let (namespace, adapter) = &self.entries[0];
        (namespace, adapter)
    }

    /// Resolve an optional namespace. `None` means the default adapter;
    /// a miss fails with `UnknownNamespace` listing the valid namespaces.
    pub fn resolve(&self, namespace: Option<&str>) -> Result<(&str, &AdapterRef), FractlError> {
        match namespace {
            None => Ok(self.default_adapter()),
            Some(ns) => self
                .entries
                .iter()
                .find(|(name, _)| name == ns)
                .map(|(name, adapter)| (name.as_str(), adapter))
                .ok_or_else(|| FractlError::unknown_namespace(ns, &self.namespaces())),
        }
    }

    pub fn list(&self) -> impl Iterator<Item = (&str, &AdapterRef)> {
        self.entries.iter().map(|(ns, adapter)| (ns.as_str(), adapter))
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.entries.iter().map(|(ns, _)| ns.clone()).collect()
    }

    /// Never zero: construction rejects an empty namespace list.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
