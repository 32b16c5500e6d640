//! Per-adapter and unified connection status.

use serde::{Deserialize, Serialize};

/// Status reported by one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterStatus {
    #[default]
    Disconnected,
    Connecting,
    Reconnecting,
    Connected,
}

impl AdapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Reconnecting => "reconnecting",
            Self::Connected => "connected",
        }
    }
}

/// Coordinator-wide status.
///
/// Variants are declared in ascending priority, so the derived `Ord`
/// is the priority order used by [`unify`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UnifiedStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl UnifiedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl From<AdapterStatus> for UnifiedStatus {
    fn from(status: AdapterStatus) -> Self {
        match status {
            AdapterStatus::Disconnected => Self::Disconnected,
            AdapterStatus::Connecting | AdapterStatus::Reconnecting => Self::Connecting,
            AdapterStatus::Connected => Self::Connected,
        }
    }
}

impl std::fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for UnifiedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce any number of adapter statuses to one unified status.
///
/// `Disconnected` is the bottom of the order and therefore the identity
/// of `max`, so the result does not depend on iteration order and an
/// empty input is `Disconnected`.
pub fn unify<I>(statuses: I) -> UnifiedStatus
where
    I: IntoIterator<Item = AdapterStatus>,
{
    statuses
        .into_iter()
        .map(UnifiedStatus::from)
        .fold(UnifiedStatus::Disconnected, Ord::max)
}
