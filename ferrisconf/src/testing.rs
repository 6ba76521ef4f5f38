//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::compliance::{ComplianceEngine, ComplianceResult, Feature, FeatureCompliance};
use crate::error::{ComparisonError, TemplateError, TransportError};
use crate::host::Host;
use crate::precheck::{PortProbe, Resolver};
use crate::render::TemplateRenderer;
use crate::report::Reporter;
use crate::storage::Storage;
use crate::transport::{CommandTransport, ConfigGetter, DeviceConfig};

#[derive(Debug, Default)]
pub struct RecordingReporter {
    failures: Mutex<Vec<(String, String)>>,
    debug: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().unwrap().clone()
    }

    pub fn debug_messages(&self) -> Vec<String> {
        self.debug.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn log_failure(&self, subject: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((subject.to_string(), message.to_string()));
    }

    fn log_debug(&self, message: &str) {
        self.debug.lock().unwrap().push(message.to_string());
    }
}

#[derive(Debug, Default)]
pub struct StaticResolver {
    names: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn with(mut self, name: &str, address: &str) -> Self {
        self.names.insert(name.to_string(), address.parse().unwrap());
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, hostname: &str) -> io::Result<IpAddr> {
        self.names
            .get(hostname)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, hostname.to_string()))
    }
}

#[derive(Debug)]
pub struct StaticProbe {
    open: bool,
    calls: Mutex<Vec<(IpAddr, u16, Duration)>>,
}

impl StaticProbe {
    pub fn open() -> Self {
        Self {
            open: true,
            calls: Mutex::default(),
        }
    }

    pub fn closed() -> Self {
        Self {
            open: false,
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<(IpAddr, u16, Duration)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortProbe for StaticProbe {
    async fn probe(&self, address: IpAddr, port: u16, timeout: Duration) -> bool {
        self.calls.lock().unwrap().push((address, port, timeout));
        self.open
    }
}

/// Returns the same response to every command and records what was sent.
#[derive(Debug)]
pub struct ScriptedTransport {
    response: Result<String, TransportError>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn ok(output: &str) -> Self {
        Self {
            response: Ok(output.to_string()),
            commands: Mutex::default(),
        }
    }

    pub fn err(err: TransportError) -> Self {
        Self {
            response: Err(err),
            commands: Mutex::default(),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandTransport for ScriptedTransport {
    async fn send_command(&self, _host: &Host, command: &str) -> Result<String, TransportError> {
        self.commands.lock().unwrap().push(command.to_string());
        self.response.clone()
    }
}

#[derive(Debug)]
pub struct ScriptedGetter {
    response: Result<DeviceConfig, TransportError>,
    calls: AtomicUsize,
}

impl ScriptedGetter {
    pub fn ok(running: &str) -> Self {
        Self {
            response: Ok(DeviceConfig::running(running)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(err: TransportError) -> Self {
        Self {
            response: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigGetter for ScriptedGetter {
    async fn get_config(&self, _host: &Host) -> Result<DeviceConfig, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Renderer returning a fixed result and recording its inputs.
#[derive(Debug)]
pub struct StubRenderer {
    response: Result<String, TemplateError>,
    calls: Mutex<Vec<(String, PathBuf, Value)>>,
}

impl StubRenderer {
    pub fn ok(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: Mutex::default(),
        }
    }

    pub fn err(err: TemplateError) -> Self {
        Self {
            response: Err(err),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, PathBuf, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl TemplateRenderer for StubRenderer {
    fn render(&self, template: &str, root: &Path, context: &Value) -> Result<String, TemplateError> {
        self.calls
            .lock()
            .unwrap()
            .push((template.to_string(), root.to_path_buf(), context.clone()));
        self.response.clone()
    }
}

/// Comparison engine that counts calls and marks every feature compliant
/// when backup and intended text are equal.
#[derive(Debug, Default)]
pub struct SpyEngine {
    calls: AtomicUsize,
    fail_with: Option<String>,
}

impl SpyEngine {
    pub fn failing(message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ComplianceEngine for SpyEngine {
    fn compare(
        &self,
        features: &[Feature],
        backup: &str,
        intended: &str,
        _platform: &str,
    ) -> Result<ComplianceResult, ComparisonError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.fail_with {
            return Err(ComparisonError::new(message.clone()));
        }

        Ok(features
            .iter()
            .map(|feature| {
                let compliant = backup == intended;
                (
                    feature.name.clone(),
                    FeatureCompliance {
                        compliant,
                        ordered_compliant: compliant,
                        actual: backup.to_string(),
                        intended: intended.to_string(),
                        ..Default::default()
                    },
                )
            })
            .collect())
    }
}

/// Storage whose every call fails with `PermissionDenied`.
#[derive(Debug, Default)]
pub struct DeniedStorage;

impl DeniedStorage {
    fn denied(path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, path.display().to_string())
    }
}

#[async_trait]
impl Storage for DeniedStorage {
    async fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        Err(Self::denied(path))
    }

    async fn write_file(&self, path: &Path, _contents: &str) -> io::Result<()> {
        Err(Self::denied(path))
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        Err(Self::denied(path))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        Err(Self::denied(path))
    }
}
