//! Platform to "show configuration" command mapping.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::FatalError;

/// Key of the fallback entry.
pub const DEFAULT_PLATFORM: &str = "default";

/// Immutable mapping from platform identifier to the command that prints
/// the running configuration.
///
/// A `default` entry is always present; [`resolve`](Self::resolve) falls back
/// to it for unknown platforms.
///
/// # Example
///
/// ```rust
/// use ferrisconf::platform::PlatformCommandTable;
///
/// let table = PlatformCommandTable::default();
/// assert_eq!(table.resolve("juniper_junos"), "show configuration | display set");
/// assert_eq!(table.resolve("unknown_os"), "show run");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct PlatformCommandTable {
    default: String,
    commands: IndexMap<String, String>,
}

impl PlatformCommandTable {
    /// Create a table containing only the fallback command.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            commands: IndexMap::new(),
        }
    }

    /// Add or replace a platform entry.
    ///
    /// Passing [`DEFAULT_PLATFORM`] replaces the fallback command.
    pub fn with_command(mut self, platform: impl Into<String>, command: impl Into<String>) -> Self {
        let platform = platform.into();
        if platform == DEFAULT_PLATFORM {
            self.default = command.into();
        } else {
            self.commands.insert(platform, command.into());
        }
        self
    }

    /// Command for `platform`, or the fallback command.
    pub fn resolve(&self, platform: &str) -> &str {
        self.commands
            .get(platform)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// The fallback command.
    pub fn default_command(&self) -> &str {
        &self.default
    }

    /// Platforms with an explicit entry, in insertion order.
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

impl Default for PlatformCommandTable {
    fn default() -> Self {
        Self::new("show run")
            .with_command("cisco_nxos", "show run")
            .with_command("cisco_ios", "show run")
            .with_command("cisco_xr", "show run")
            .with_command("juniper_junos", "show configuration | display set")
            .with_command("arista_eos", "show run")
    }
}

impl TryFrom<IndexMap<String, String>> for PlatformCommandTable {
    type Error = FatalError;

    fn try_from(mut commands: IndexMap<String, String>) -> Result<Self, Self::Error> {
        let default = commands
            .shift_remove(DEFAULT_PLATFORM)
            .ok_or(FatalError::MissingDefaultCommand)?;
        Ok(Self { default, commands })
    }
}
