//! Transport collaborators.
//!
//! The pipeline never speaks a device protocol itself. It hands a [`Host`]
//! to one of two seams and classifies whatever [`TransportError`] comes
//! back:
//!
//! - [`CommandTransport`] runs a CLI command and returns its raw output.
//!   [`SshTransport`] is the built-in implementation.
//! - [`ConfigGetter`] asks a structured API for the device configuration.

pub mod config;
mod ssh;

pub use config::{HostKeyVerification, SshConfig};
pub use ssh::SshTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::host::Host;

/// Configuration returned by a structured getter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Running configuration.
    pub running: String,

    /// Startup configuration, if the device reports one.
    #[serde(default)]
    pub startup: Option<String>,

    /// Candidate configuration, if the device reports one.
    #[serde(default)]
    pub candidate: Option<String>,
}

impl DeviceConfig {
    /// Create a config holding only the running configuration.
    pub fn running(running: impl Into<String>) -> Self {
        Self {
            running: running.into(),
            ..Default::default()
        }
    }
}

/// Transport that executes CLI commands.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Run `command` on `host` and return its raw output.
    async fn send_command(&self, host: &Host, command: &str) -> Result<String, TransportError>;
}

/// Transport exposing a structured configuration getter.
#[async_trait]
pub trait ConfigGetter: Send + Sync {
    /// Fetch the device configuration.
    async fn get_config(&self, host: &Host) -> Result<DeviceConfig, TransportError>;
}
