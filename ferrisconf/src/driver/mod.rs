//! Retrieval drivers.
//!
//! A driver obtains a device's running configuration, sanitizes it, and
//! writes it to the backup path. Two strategies exist, as a closed set:
//!
//! - [`CliDriver`] sends the platform's show command through a
//!   [`CommandTransport`](crate::transport::CommandTransport) and owns the
//!   "device rejected the command" failure.
//! - [`ApiDriver`] calls a [`ConfigGetter`](crate::transport::ConfigGetter).
//!
//! [`RetrievalDriver`] wraps both behind one `get_config` entry point.

mod api;
mod cli;

pub use api::ApiDriver;
pub use cli::{CliDriver, INVALID_INPUT_MARKER};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::host::Host;
use crate::platform::RetrievalMethod;
use crate::report::{Reporter, fail};
use crate::sanitize::{SanitizationRules, Sanitizer};
use crate::storage::{Storage, persist};

/// Result of a successful retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedConfig {
    /// Configuration as returned by the device.
    pub raw: String,

    /// Configuration after removal and substitution, as written to disk.
    pub sanitized: String,

    /// Where the sanitized configuration was written.
    pub path: PathBuf,
}

/// A retrieval strategy.
#[derive(Clone)]
pub enum RetrievalDriver {
    /// Command-based retrieval.
    Cli(CliDriver),

    /// Structured-getter retrieval.
    Api(ApiDriver),
}

impl RetrievalDriver {
    /// Method this driver implements.
    pub fn method(&self) -> RetrievalMethod {
        match self {
            RetrievalDriver::Cli(_) => RetrievalMethod::Cli,
            RetrievalDriver::Api(_) => RetrievalMethod::Api,
        }
    }

    /// Retrieve, sanitize and persist the running configuration of `host`.
    pub async fn get_config(
        &self,
        host: &Host,
        backup_path: &Path,
        rules: &SanitizationRules,
    ) -> Result<RetrievedConfig> {
        match self {
            RetrievalDriver::Cli(driver) => driver.get_config(host, backup_path, rules).await,
            RetrievalDriver::Api(driver) => driver.get_config(host, backup_path, rules).await,
        }
    }
}

impl From<CliDriver> for RetrievalDriver {
    fn from(driver: CliDriver) -> Self {
        RetrievalDriver::Cli(driver)
    }
}

impl From<ApiDriver> for RetrievalDriver {
    fn from(driver: ApiDriver) -> Self {
        RetrievalDriver::Api(driver)
    }
}

/// Collaborators shared by every driver variant.
#[derive(Clone)]
pub struct DriverContext {
    storage: Arc<dyn Storage>,
    reporter: Arc<dyn Reporter>,
}

impl DriverContext {
    /// Create a context.
    pub fn new(storage: Arc<dyn Storage>, reporter: Arc<dyn Reporter>) -> Self {
        Self { storage, reporter }
    }

    fn debug(&self, message: &str) {
        self.reporter.log_debug(message);
    }

    fn fail(&self, host: &Host, err: impl Into<Error>) -> Error {
        fail(self.reporter.as_ref(), &host.name, err)
    }

    /// Compile `rules`, reporting a malformed rule as fatal.
    fn compile(&self, host: &Host, rules: &SanitizationRules) -> Result<Sanitizer> {
        rules.compile().map_err(|e| self.fail(host, e))
    }

    /// Sanitize `raw` and write it to `backup_path`.
    async fn finish(
        &self,
        host: &Host,
        raw: String,
        backup_path: &Path,
        sanitizer: &Sanitizer,
    ) -> Result<RetrievedConfig> {
        let mut running = raw.clone();

        if sanitizer.has_removals() {
            self.debug("Removing lines from configuration based on `remove_lines` definition");
            running = sanitizer.remove(&running);
        }

        if sanitizer.has_substitutions() {
            self.debug("Substitute lines from configuration based on `substitute_lines` definition");
            running = sanitizer.substitute(&running);
        }

        persist(self.storage.as_ref(), backup_path, &running)
            .await
            .map_err(|e| self.fail(host, e))?;

        Ok(RetrievedConfig {
            raw,
            sanitized: running,
            path: backup_path.to_path_buf(),
        })
    }
}
