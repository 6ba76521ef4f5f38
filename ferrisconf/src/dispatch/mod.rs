//! Dispatch facade.
//!
//! [`Dispatcher`] is the single entry point for per-host operations. It
//! picks the retrieval driver for each host, runs it, and returns one
//! [`Result`] shape for every operation. Failures have already been reported
//! by the time the caller sees them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use ferrisconf::{Dispatcher, Host, SanitizationRules, SubstitutionRule};
//!
//! # async fn example() -> Result<(), ferrisconf::Error> {
//! let dispatcher = Dispatcher::builder().build()?;
//!
//! let host = Host::new("r1", "192.168.1.1", "cisco_ios")
//!     .with_username("admin")
//!     .with_password("secret");
//! let rules = SanitizationRules::new()
//!     .substitute(SubstitutionRule::new(r"username \S+ secret 5 (\S+)", "<redacted>"));
//!
//! dispatcher.check_connectivity(&host).await?;
//! let backup = dispatcher
//!     .get_config(&host, Path::new("backups/r1.cfg"), &rules)
//!     .await?;
//! println!("{}", backup.sanitized);
//! # Ok(())
//! # }
//! ```

mod batch;
mod builder;

pub use batch::{BatchReport, BatchSummary, HostOutcome};
pub use builder::DispatcherBuilder;

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::compliance::{ComplianceEvaluator, ComplianceResult, Feature};
use crate::driver::{RetrievalDriver, RetrievedConfig};
use crate::error::{FatalError, Result};
use crate::host::Host;
use crate::platform::{MethodTable, RetrievalMethod};
use crate::precheck::Prechecker;
use crate::render::{ConfigRenderer, RenderedConfig};
use crate::report::{Reporter, fail};
use crate::sanitize::SanitizationRules;

/// Per-host entry point for every pipeline operation.
///
/// Cheap to clone and safe to share between concurrent host tasks: it holds
/// only immutable tables and shared collaborators.
#[derive(Clone)]
pub struct Dispatcher {
    prechecker: Prechecker,
    drivers: IndexMap<RetrievalMethod, RetrievalDriver>,
    methods: Arc<MethodTable>,
    renderer: ConfigRenderer,
    compliance: Option<ComplianceEvaluator>,
    reporter: Arc<dyn Reporter>,
}

impl Dispatcher {
    /// Start building a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Reporter every failure is sent to.
    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Retrieval method that would be used for `host`.
    pub fn method_for(&self, host: &Host) -> RetrievalMethod {
        self.methods.select(host)
    }

    /// Check that `host` is reachable and has credentials.
    pub async fn check_connectivity(&self, host: &Host) -> Result<()> {
        self.prechecker.check(host).await
    }

    /// Retrieve, sanitize and back up the running configuration of `host`.
    pub async fn get_config(
        &self,
        host: &Host,
        backup_path: &Path,
        rules: &SanitizationRules,
    ) -> Result<RetrievedConfig> {
        let method = self.method_for(host);
        let driver = self.drivers.get(&method).ok_or_else(|| {
            fail(
                self.reporter.as_ref(),
                &host.name,
                FatalError::NotConfigured {
                    component: format!("{} transport", method),
                },
            )
        })?;

        driver.get_config(host, backup_path, rules).await
    }

    /// Render the intended configuration of `host` to `output_path`.
    pub async fn generate_config(
        &self,
        host: &Host,
        template: &str,
        template_root: &Path,
        output_path: &Path,
    ) -> Result<RenderedConfig> {
        self.renderer
            .generate_config(host, template, template_root, output_path)
            .await
    }

    /// Compare the backup and intended artifacts of `host`.
    pub async fn compliance_config(
        &self,
        host: &Host,
        features: &[Feature],
        backup_path: &Path,
        intended_path: &Path,
    ) -> Result<ComplianceResult> {
        let evaluator = self.compliance.as_ref().ok_or_else(|| {
            fail(
                self.reporter.as_ref(),
                &host.name,
                FatalError::NotConfigured {
                    component: "compliance engine".to_string(),
                },
            )
        })?;

        evaluator
            .evaluate(host, features, backup_path, intended_path, &host.platform)
            .await
    }
}
