//! Connector picker: the external selection surface.
//!
//! The coordinator presents the flattened connector list and awaits one
//! choice. Hosts implement this with whatever UI they have; a rejection
//! is surfaced to the caller of `connect_with_picker` unchanged.

use std::future::Future;

use fractl_protocol::{ConnectorOption, FractlError};

pub trait ConnectorPicker: Send + Sync {
    fn pick(
        &self,
        options: &[ConnectorOption],
    ) -> impl Future<Output = Result<ConnectorOption, FractlError>> + Send;
}

/// Picks the first option offered. Useful for headless hosts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstConnector;

impl ConnectorPicker for FirstConnector {
    async fn pick(&self, options: &[ConnectorOption]) -> Result<ConnectorOption, FractlError> {
        options
            .first()
            .cloned()
            .ok_or_else(|| FractlError::selection_rejected("No connector to pick"))
    }
}

/// Picks the first option whose connector id matches.
#[derive(Debug, Clone)]
pub struct ConnectorById(pub String);

impl ConnectorPicker for ConnectorById {
    async fn pick(&self, options: &[ConnectorOption]) -> Result<ConnectorOption, FractlError> {
        options
            .iter()
            .find(|option| option.connector.id == self.0)
            .cloned()
            .ok_or_else(|| {
                FractlError::selection_rejected(format!("Connector not offered: {}", self.0))
            })
    }
}
