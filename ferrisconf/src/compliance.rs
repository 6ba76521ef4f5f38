//! Compliance evaluation.
//!
//! Reads a backup and an intended configuration from storage and hands them,
//! with the declared features, to a [`ComplianceEngine`]. The engine's result
//! is passed through untouched. Every failure here is fatal: a missing
//! artifact or a comparison fault is not something retrying one host fixes.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ComparisonError, Error, FatalError, Result};
use crate::host::Host;
use crate::report::{Reporter, fail};
use crate::storage::Storage;

/// A named, independently comparable slice of configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name (e.g. "ntp", "acl").
    pub name: String,

    /// Whether line order matters.
    #[serde(default)]
    pub ordered: bool,

    /// Top-level line prefixes that belong to this feature.
    #[serde(default)]
    pub section: Vec<String>,
}

impl Feature {
    /// Create an unordered feature.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordered: false,
            section: Vec::new(),
        }
    }

    /// Add a section prefix.
    pub fn with_section(mut self, prefix: impl Into<String>) -> Self {
        self.section.push(prefix.into());
        self
    }

    /// Require ordered comparison.
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }
}

/// Comparison outcome for one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCompliance {
    /// Backup and intended lines match, ignoring order.
    pub compliant: bool,

    /// Backup and intended lines match in order.
    pub ordered_compliant: bool,

    /// Intended lines absent from the backup.
    pub missing: String,

    /// Backup lines absent from the intended configuration.
    pub extra: String,

    /// Backup lines belonging to the feature.
    pub actual: String,

    /// Intended lines belonging to the feature.
    pub intended: String,

    /// The engine could not parse one of the configurations.
    pub cannot_parse: bool,
}

/// Per-feature results, in feature order.
pub type ComplianceResult = IndexMap<String, FeatureCompliance>;

/// Comparison collaborator.
pub trait ComplianceEngine: Send + Sync {
    /// Compare `backup` against `intended` for each feature.
    fn compare(
        &self,
        features: &[Feature],
        backup: &str,
        intended: &str,
        platform: &str,
    ) -> std::result::Result<ComplianceResult, ComparisonError>;
}

/// Checks preconditions and delegates to a [`ComplianceEngine`].
#[derive(Clone)]
pub struct ComplianceEvaluator {
    engine: Arc<dyn ComplianceEngine>,
    storage: Arc<dyn Storage>,
    reporter: Arc<dyn Reporter>,
}

impl ComplianceEvaluator {
    /// Create an evaluator.
    pub fn new(
        engine: Arc<dyn ComplianceEngine>,
        storage: Arc<dyn Storage>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            engine,
            storage,
            reporter,
        }
    }

    /// Compare the artifacts at `backup_path` and `intended_path`.
    pub async fn evaluate(
        &self,
        host: &Host,
        features: &[Feature],
        backup_path: &Path,
        intended_path: &Path,
        platform: &str,
    ) -> Result<ComplianceResult> {
        if !self.exists(host, backup_path).await? {
            return Err(self.fail(host, FatalError::BackupMissing(backup_path.to_path_buf())));
        }

        if !self.exists(host, intended_path).await? {
            return Err(self.fail(host, FatalError::IntendedMissing(intended_path.to_path_buf())));
        }

        let backup = self.read(host, backup_path).await?;
        let intended = self.read(host, intended_path).await?;

        let engine = self.engine.clone();
        let features = features.to_vec();
        let platform = platform.to_string();
        tokio::task::spawn_blocking(move || engine.compare(&features, &backup, &intended, &platform))
            .await
            .map_err(|e| self.fail(host, FatalError::Comparison(e.to_string())))?
            .map_err(|e| self.fail(host, FatalError::Comparison(e.to_string())))
    }

    async fn exists(&self, host: &Host, path: &Path) -> Result<bool> {
        self.storage.exists(path).await.map_err(|source| {
            self.fail(
                host,
                FatalError::Io {
                    path: path.to_path_buf(),
                    source,
                },
            )
        })
    }

    async fn read(&self, host: &Host, path: &Path) -> Result<String> {
        self.storage.read_to_string(path).await.map_err(|source| {
            self.fail(
                host,
                FatalError::Io {
                    path: path.to_path_buf(),
                    source,
                },
            )
        })
    }

    fn fail(&self, host: &Host, err: impl Into<Error>) -> Error {
        fail(self.reporter.as_ref(), &host.name, err)
    }
}
