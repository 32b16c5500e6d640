//! ConnectionTable — authoritative record of who is connected to what.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fractl_protocol::{Connection, ConnectionKey, ConnectionRecord, ConnectorDescriptor};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    connector: ConnectorDescriptor,
    record: ConnectionRecord,
    connected_at: DateTime<Utc>,
    /// Monotonic write order; the highest is the current connection.
    sequence: u64,
}

impl Entry {
    fn to_connection(&self, key: &ConnectionKey) -> Connection {
        Connection {
            key: key.clone(),
            connector: self.connector.clone(),
            record: self.record.clone(),
            connected_at: self.connected_at,
        }
    }
}

/// Connection records keyed by (namespace, connector id).
///
/// Only the coordinator writes this table, and only after an adapter call
/// has settled successfully.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    entries: HashMap<ConnectionKey, Entry>,
    next_sequence: u64,
}

impl PartialEq for ConnectionTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the record for `key`; it becomes the current
    /// connection.
    pub fn insert(
        &mut self,
        key: ConnectionKey,
        connector: ConnectorDescriptor,
        record: ConnectionRecord,
    ) -> Connection {
        self.next_sequence += 1;
        let entry = Entry {
            connector,
            record,
            connected_at: Utc::now(),
            sequence: self.next_sequence,
        };
        let connection = entry.to_connection(&key);
        self.entries.insert(key, entry);
        connection
    }

    pub fn remove(&mut self, key: &ConnectionKey) -> Option<Connection> {
        self.entries.remove(key).map(|entry| entry.to_connection(key))
    }

    /// Drop every record in `namespace`. Returns how many were removed.
    pub fn remove_namespace(&mut self, namespace: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.namespace != namespace);
        before - self.entries.len()
    }

    pub fn get(&self, key: &ConnectionKey) -> Option<Connection> {
        self.entries.get(key).map(|entry| entry.to_connection(key))
    }

    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Most recently written connection.
    pub fn current(&self) -> Option<Connection> {
        self.latest(|_| true)
    }

    /// Most recently written connection within one namespace.
    pub fn current_in(&self, namespace: &str) -> Option<Connection> {
        self.latest(|key| key.namespace == namespace)
    }

    /// Most recent connection made through `connector_id`, optionally
    /// restricted to one namespace.
    pub fn find_by_connector(
        &self,
        namespace: Option<&str>,
        connector_id: &str,
    ) -> Option<Connection> {
        self.latest(|key| {
            key.connector_id == connector_id && namespace.is_none_or(|ns| key.namespace == ns)
        })
    }

    /// All connections, oldest first.
    pub fn list(&self) -> Vec<Connection> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.sequence);
        entries
            .into_iter()
            .map(|(key, entry)| entry.to_connection(key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn latest(&self, filter: impl Fn(&ConnectionKey) -> bool) -> Option<Connection> {
        self.entries
            .iter()
            .filter(|(key, _)| filter(key))
            .max_by_key(|(_, entry)| entry.sequence)
            .map(|(key, entry)| entry.to_connection(key))
    }
}
