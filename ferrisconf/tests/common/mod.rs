//! Shared collaborators for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ferrisconf::compliance::{ComplianceEngine, ComplianceResult, Feature, FeatureCompliance};
use ferrisconf::error::{ComparisonError, TransportError};
use ferrisconf::precheck::{PortProbe, Resolver};
use ferrisconf::transport::{CommandTransport, ConfigGetter, DeviceConfig};
use ferrisconf::{Host, Reporter};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Reporter that keeps every message.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    failures: Arc<Mutex<Vec<(String, String)>>>,
    debug: Arc<Mutex<Vec<String>>>,
}

impl MemoryReporter {
    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().unwrap().clone()
    }

    pub fn debug_messages(&self) -> Vec<String> {
        self.debug.lock().unwrap().clone()
    }
}

impl Reporter for MemoryReporter {
    fn log_failure(&self, subject: &str, message: &str) {
        log::error!("{}: {}", subject, message);
        self.failures
            .lock()
            .unwrap()
            .push((subject.to_string(), message.to_string()));
    }

    fn log_debug(&self, message: &str) {
        log::debug!("{}", message);
        self.debug.lock().unwrap().push(message.to_string());
    }
}

/// CLI transport serving canned output per platform command.
#[derive(Debug, Clone, Default)]
pub struct FakeCli {
    outputs: Arc<HashMap<String, Result<String, TransportError>>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeCli {
    pub fn new(outputs: impl IntoIterator<Item = (&'static str, Result<String, TransportError>)>) -> Self {
        Self {
            outputs: Arc::new(
                outputs
                    .into_iter()
                    .map(|(command, output)| (command.to_string(), output))
                    .collect(),
            ),
            sent: Arc::default(),
        }
    }

    /// `(host name, command)` pairs, in call order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandTransport for FakeCli {
    async fn send_command(&self, host: &Host, command: &str) -> Result<String, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((host.name.clone(), command.to_string()));
        self.outputs
            .get(command)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Other(format!("unexpected command `{}`", command))))
    }
}

/// Structured getter returning the same running configuration for every host.
#[derive(Debug, Clone)]
pub struct FakeApi {
    running: String,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeApi {
    pub fn new(running: &str) -> Self {
        Self {
            running: running.to_string(),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigGetter for FakeApi {
    async fn get_config(&self, host: &Host) -> Result<DeviceConfig, TransportError> {
        self.calls.lock().unwrap().push(host.name.clone());
        Ok(DeviceConfig::running(self.running.clone()))
    }
}

/// Resolver answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct TableResolver(pub HashMap<String, IpAddr>);

#[async_trait]
impl Resolver for TableResolver {
    async fn resolve(&self, hostname: &str) -> io::Result<IpAddr> {
        self.0
            .get(hostname)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, hostname.to_string()))
    }
}

/// Probe reporting every port open except those listed.
#[derive(Debug, Clone, Default)]
pub struct FakeProbe {
    closed: Arc<Vec<IpAddr>>,
}

impl FakeProbe {
    pub fn closed(addresses: &[&str]) -> Self {
        Self {
            closed: Arc::new(addresses.iter().map(|a| a.parse().unwrap()).collect()),
        }
    }
}

#[async_trait]
impl PortProbe for FakeProbe {
    async fn probe(&self, address: IpAddr, _port: u16, _timeout: Duration) -> bool {
        !self.closed.contains(&address)
    }
}

/// Line-set comparison over each feature's section prefixes.
#[derive(Debug, Clone, Default)]
pub struct LineSetEngine {
    calls: Arc<Mutex<usize>>,
}

impl LineSetEngine {
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ComplianceEngine for LineSetEngine {
    fn compare(
        &self,
        features: &[Feature],
        backup: &str,
        intended: &str,
        _platform: &str,
    ) -> Result<ComplianceResult, ComparisonError> {
        *self.calls.lock().unwrap() += 1;

        let select = |text: &str, feature: &Feature| -> Vec<String> {
            text.lines()
                .filter(|line| feature.section.iter().any(|prefix| line.starts_with(prefix.as_str())))
                .map(str::to_string)
                .collect()
        };

        Ok(features
            .iter()
            .map(|feature| {
                let actual = select(backup, feature);
                let wanted = select(intended, feature);
                let missing: Vec<_> = wanted.iter().filter(|l| !actual.contains(l)).cloned().collect();
                let extra: Vec<_> = actual.iter().filter(|l| !wanted.contains(l)).cloned().collect();
                let compliant = missing.is_empty() && extra.is_empty();
                (
                    feature.name.clone(),
                    FeatureCompliance {
                        compliant,
                        ordered_compliant: compliant && actual == wanted,
                        missing: missing.join("\n"),
                        extra: extra.join("\n"),
                        actual: actual.join("\n"),
                        intended: wanted.join("\n"),
                        cannot_parse: false,
                    },
                )
            })
            .collect())
    }
}
