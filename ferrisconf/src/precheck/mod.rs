//! Connectivity prechecks.
//!
//! A cheap gate run before an expensive retrieval: the host must have a
//! usable address, an open management port, and both credentials. The
//! first failing step is reported and returned as a [`HostError`].

mod net;

pub use net::{PortProbe, Resolver, SystemResolver, TcpProbe};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{HostError, Result};
use crate::host::Host;
use crate::report::{Reporter, fail};

/// Precheck settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrecheckConfig {
    /// Management port probed when the host has no override (default: 22).
    pub port: u16,

    /// Probe timeout, in seconds when deserialized (default: 3 s).
    #[serde(deserialize_with = "deserialize_secs")]
    pub timeout: Duration,
}

impl Default for PrecheckConfig {
    fn default() -> Self {
        Self {
            port: 22,
            timeout: Duration::from_secs(3),
        }
    }
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

/// Runs connectivity and credential checks against a host.
#[derive(Clone)]
pub struct Prechecker {
    config: PrecheckConfig,
    resolver: Arc<dyn Resolver>,
    probe: Arc<dyn PortProbe>,
    reporter: Arc<dyn Reporter>,
}

impl Prechecker {
    /// Create a prechecker.
    pub fn new(
        config: PrecheckConfig,
        resolver: Arc<dyn Resolver>,
        probe: Arc<dyn PortProbe>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            resolver,
            probe,
            reporter,
        }
    }

    /// Precheck settings.
    pub fn config(&self) -> &PrecheckConfig {
        &self.config
    }

    /// Check `host`, stopping at the first failure.
    pub async fn check(&self, host: &Host) -> Result<()> {
        self.reporter.log_debug(&format!(
            "Executing check_connectivity for {} on {}",
            host.name, host.platform
        ));

        let address = match self.resolver.literal_address(&host.hostname) {
            Some(address) => address,
            None => self.resolver.resolve(&host.hostname).await.map_err(|_| {
                self.fail(
                    host,
                    HostError::Unresolvable {
                        hostname: host.hostname.clone(),
                    },
                )
            })?,
        };

        let port = host.port.unwrap_or(self.config.port);
        if !self.probe.probe(address, port, self.config.timeout).await {
            return Err(self.fail(host, HostError::Unreachable { address, port }));
        }

        if host.username.is_empty() {
            return Err(self.fail(host, HostError::MissingUsername));
        }

        if host.password().is_none_or(str::is_empty) {
            return Err(self.fail(host, HostError::MissingPassword));
        }

        Ok(())
    }

    fn fail(&self, host: &Host, err: HostError) -> crate::Error {
        fail(self.reporter.as_ref(), &host.name, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingReporter, StaticProbe, StaticResolver};

    fn prechecker(
        resolver: StaticResolver,
        probe: StaticProbe,
    ) -> (Prechecker, Arc<RecordingReporter>, Arc<StaticProbe>) {
        let reporter = Arc::new(RecordingReporter::default());
        let probe = Arc::new(probe);
        let checker = Prechecker::new(
            PrecheckConfig::default(),
            Arc::new(resolver),
            probe.clone(),
            reporter.clone(),
        );
        (checker, reporter, probe)
    }

    fn host(hostname: &str) -> Host {
        Host::new("r1", hostname, "cisco_ios")
            .with_username("admin")
            .with_password("admin")
    }

    #[tokio::test]
    async fn test_literal_address_passes() {
        let (checker, reporter, probe) =
            prechecker(StaticResolver::default(), StaticProbe::open());

        checker.check(&host("10.0.0.1")).await.unwrap();

        assert!(reporter.failures().is_empty());
        assert_eq!(
            probe.calls(),
            vec![("10.0.0.1".parse().unwrap(), 22, Duration::from_secs(3))]
        );
    }

    #[tokio::test]
    async fn test_resolved_hostname_is_probed() {
        let resolver = StaticResolver::default().with("r1.lab", "192.0.2.10");
        let (checker, _, probe) = prechecker(resolver, StaticProbe::open());

        checker.check(&host("r1.lab").with_port(830)).await.unwrap();
        assert_eq!(probe.calls()[0].0, "192.0.2.10".parse::<std::net::IpAddr>().unwrap());
        assert_eq!(probe.calls()[0].1, 830);
    }

    #[tokio::test]
    async fn test_unresolvable_hostname() {
        let (checker, reporter, probe) =
            prechecker(StaticResolver::default(), StaticProbe::open());

        let err = checker.check(&host("nowhere.invalid")).await.unwrap_err();

        assert!(matches!(err.as_host(), Some(HostError::Unresolvable { .. })));
        assert!(err.to_string().contains("not an IP or resolvable."));
        assert!(probe.calls().is_empty());
        assert_eq!(reporter.failures().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_port() {
        let (checker, reporter, _) = prechecker(StaticResolver::default(), StaticProbe::closed());

        let err = checker.check(&host("10.0.0.1")).await.unwrap_err();

        assert_eq!(err.tag(), "UnreachableError");
        let failures = reporter.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].1.contains("10.0.0.1"));
        assert!(failures[0].1.contains("22"));
    }

    #[tokio::test]
    async fn test_missing_username() {
        let (checker, _, _) = prechecker(StaticResolver::default(), StaticProbe::open());
        let host = Host::new("r1", "10.0.0.1", "cisco_ios").with_password("admin");

        let err = checker.check(&host).await.unwrap_err();
        assert!(matches!(err.as_host(), Some(HostError::MissingUsername)));
    }

    #[tokio::test]
    async fn test_empty_password() {
        let (checker, reporter, _) = prechecker(StaticResolver::default(), StaticProbe::open());
        let host = Host::new("r1", "10.0.0.1", "cisco_ios")
            .with_username("admin")
            .with_password("");

        let err = checker.check(&host).await.unwrap_err();
        assert!(matches!(err.as_host(), Some(HostError::MissingPassword)));
        assert!(err.to_string().contains("password"));
        assert_eq!(reporter.failures()[0].0, "r1");
    }

    #[test]
    fn test_config_deserialize() {
        let config: PrecheckConfig = serde_json::from_str(r#"{"timeout": 1.5}"#).unwrap();
        assert_eq!(config.port, 22);
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }
}
