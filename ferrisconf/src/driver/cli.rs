//! Command-based retrieval.

use std::path::Path;
use std::sync::Arc;

use super::{DriverContext, RetrievedConfig};
use crate::error::{HostError, Result};
use crate::host::Host;
use crate::platform::PlatformCommandTable;
use crate::sanitize::SanitizationRules;
use crate::transport::CommandTransport;

/// Marker devices echo when their parser rejects a command (seen on Cisco).
pub const INVALID_INPUT_MARKER: &str = "ERROR: % Invalid input detected at";

/// Retrieves the running configuration by running the platform's show command.
#[derive(Clone)]
pub struct CliDriver {
    transport: Arc<dyn CommandTransport>,
    commands: Arc<PlatformCommandTable>,
    context: DriverContext,
}

impl CliDriver {
    /// Create a CLI driver.
    pub fn new(
        transport: Arc<dyn CommandTransport>,
        commands: Arc<PlatformCommandTable>,
        context: DriverContext,
    ) -> Self {
        Self {
            transport,
            commands,
            context,
        }
    }

    /// Command table used to pick the show command.
    pub fn commands(&self) -> &PlatformCommandTable {
        &self.commands
    }

    /// Retrieve, sanitize and persist the running configuration of `host`.
    pub async fn get_config(
        &self,
        host: &Host,
        backup_path: &Path,
        rules: &SanitizationRules,
    ) -> Result<RetrievedConfig> {
        self.context.debug(&format!(
            "Executing get_config for {} on {}",
            host.name, host.platform
        ));

        let sanitizer = self.context.compile(host, rules)?;
        let command = self.commands.resolve(&host.platform);

        let raw = self
            .transport
            .send_command(host, command)
            .await
            .map_err(|e| self.context.fail(host, HostError::from(e)))?;

        if raw.contains(INVALID_INPUT_MARKER) {
            return Err(self.context.fail(
                host,
                HostError::InvalidCommand {
                    marker: INVALID_INPUT_MARKER.to_string(),
                },
            ));
        }

        self.context.finish(host, raw, backup_path, &sanitizer).await
    }
}
