//! Structured-getter retrieval.

use std::path::Path;
use std::sync::Arc;

use super::{DriverContext, RetrievedConfig};
use crate::error::{HostError, Result};
use crate::host::Host;
use crate::sanitize::SanitizationRules;
use crate::transport::ConfigGetter;

/// Retrieves the running configuration through a structured `config` getter.
#[derive(Clone)]
pub struct ApiDriver {
    transport: Arc<dyn ConfigGetter>,
    context: DriverContext,
}

impl ApiDriver {
    /// Create an API driver.
    pub fn new(transport: Arc<dyn ConfigGetter>, context: DriverContext) -> Self {
        Self { transport, context }
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

        let config = self
            .transport
            .get_config(host)
            .await
            .map_err(|e| self.context.fail(host, HostError::from(e)))?;

        self.context
            .finish(host, config.running, backup_path, &sanitizer)
            .await
    }
}
