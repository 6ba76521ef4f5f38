//! # Ferrisconf
//!
//! Async configuration backup, generation and compliance pipeline for
//! network devices.
//!
//! Ferrisconf drives the per-device steps of a configuration management
//! workflow: check that a device is reachable, pull its running
//! configuration over SSH (or a structured API), scrub secrets and noise
//! from it, render the intended configuration from a template, and compare
//! the two feature by feature.
//!
//! ## Features
//!
//! - Async per-host operations on tokio, with bounded multi-host batches
//! - SSH retrieval via russh with known_hosts verification
//! - Platform-keyed retrieval commands with a default fallback
//! - Regex-based line removal and secret substitution
//! - Handlebars templating with strict variable checking
//! - One failure shape for every operation: per-host or fatal
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use ferrisconf::{Dispatcher, Host, SanitizationRules};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrisconf::Error> {
//!     let dispatcher = Dispatcher::builder().build()?;
//!
//!     let host = Host::new("core1", "192.168.1.1", "cisco_ios")
//!         .with_username("admin")
//!         .with_password("secret");
//!     let rules = SanitizationRules::new().remove("^ntp clock-period");
//!
//!     dispatcher.check_connectivity(&host).await?;
//!     let backup = dispatcher
//!         .get_config(&host, Path::new("backups/core1.cfg"), &rules)
//!         .await?;
//!     println!("{}", backup.sanitized);
//!     Ok(())
//! }
//! ```

pub mod compliance;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod host;
pub mod platform;
pub mod precheck;
pub mod render;
pub mod report;
pub mod sanitize;
pub mod storage;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use compliance::{ComplianceEngine, ComplianceResult, Feature, FeatureCompliance};
pub use dispatch::{BatchReport, BatchSummary, Dispatcher, DispatcherBuilder, HostOutcome};
pub use driver::RetrievedConfig;
pub use error::{Error, FatalError, HostError, Result};
pub use host::Host;
pub use platform::{MethodTable, PlatformCommandTable, RetrievalMethod};
pub use precheck::PrecheckConfig;
pub use render::{HandlebarsRenderer, RenderedConfig, TemplateRenderer};
pub use report::{LogReporter, Reporter};
pub use sanitize::{SanitizationRules, SubstitutionRule};
pub use transport::{CommandTransport, ConfigGetter, DeviceConfig, SshConfig, SshTransport};
