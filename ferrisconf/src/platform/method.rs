//! Retrieval strategy selection.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::host::Host;

/// How a running configuration is obtained from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    /// Send the platform's show command over an interactive CLI transport.
    #[default]
    Cli,

    /// Ask a structured API transport for its `config` getter.
    Api,
}

impl fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalMethod::Cli => write!(f, "cli"),
            RetrievalMethod::Api => write!(f, "api"),
        }
    }
}

/// Per-platform retrieval method table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MethodTable {
    /// Method for platforms without an entry.
    pub default: RetrievalMethod,

    /// Explicit platform entries.
    pub platforms: IndexMap<String, RetrievalMethod>,
}

impl MethodTable {
    /// Create a table where every platform uses `default`.
    pub fn new(default: RetrievalMethod) -> Self {
        Self {
            default,
            platforms: IndexMap::new(),
        }
    }

    /// Route `platform` to `method`.
    pub fn with_platform(mut self, platform: impl Into<String>, method: RetrievalMethod) -> Self {
        self.platforms.insert(platform.into(), method);
        self
    }

    /// Select the method for `host`: host override, then platform entry,
    /// then the table default.
    pub fn select(&self, host: &Host) -> RetrievalMethod {
        host.retrieval
            .or_else(|| self.platforms.get(&host.platform).copied())
            .unwrap_or(self.default)
    }

    /// Check whether any route leads to `method`.
    pub fn uses(&self, method: RetrievalMethod) -> bool {
        self.default == method || self.platforms.values().any(|m| *m == method)
    }
}
