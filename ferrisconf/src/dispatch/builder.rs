//! Builder for the dispatch facade.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;

use super::Dispatcher;
use crate::compliance::{ComplianceEngine, ComplianceEvaluator};
use crate::driver::{ApiDriver, CliDriver, DriverContext, RetrievalDriver};
use crate::error::{FatalError, Result};
use crate::platform::{MethodTable, PlatformCommandTable, RetrievalMethod};
use crate::precheck::{PortProbe, PrecheckConfig, Prechecker, Resolver, SystemResolver, TcpProbe};
use crate::render::{ConfigRenderer, HandlebarsRenderer, TemplateRenderer};
use crate::report::{LogReporter, Reporter, fail};
use crate::storage::{FsStorage, Storage};
use crate::transport::{CommandTransport, ConfigGetter, SshTransport};

/// Reporting subject for failures raised while building.
const BUILD_SUBJECT: &str = "dispatcher";

/// Builder for [`Dispatcher`].
///
/// Every collaborator has a default except the structured-getter transport
/// and the compliance engine:
///
/// | collaborator | default |
/// |--------------|---------|
/// | CLI transport | [`SshTransport`] |
/// | renderer | [`HandlebarsRenderer`] |
/// | resolver / probe | [`SystemResolver`] / [`TcpProbe`] |
/// | storage | [`FsStorage`] (owner-only files) |
/// | reporter | [`LogReporter`] |
pub struct DispatcherBuilder {
    commands: PlatformCommandTable,
    methods: MethodTable,
    precheck: PrecheckConfig,
    cli_transport: Option<Arc<dyn CommandTransport>>,
    api_transport: Option<Arc<dyn ConfigGetter>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    compliance: Option<Arc<dyn ComplianceEngine>>,
    resolver: Option<Arc<dyn Resolver>>,
    probe: Option<Arc<dyn PortProbe>>,
    storage: Option<Arc<dyn Storage>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    /// Create a builder with the built-in command table.
    pub fn new() -> Self {
        Self {
            commands: PlatformCommandTable::default(),
            methods: MethodTable::default(),
            precheck: PrecheckConfig::default(),
            cli_transport: None,
            api_transport: None,
            renderer: None,
            compliance: None,
            resolver: None,
            probe: None,
            storage: None,
            reporter: None,
        }
    }

    /// Replace the platform command table.
    pub fn commands(mut self, commands: PlatformCommandTable) -> Self {
        self.commands = commands;
        self
    }

    /// Replace the retrieval method table.
    pub fn methods(mut self, methods: MethodTable) -> Self {
        self.methods = methods;
        self
    }

    /// Route `platform` to `method`.
    pub fn method_for(mut self, platform: impl Into<String>, method: RetrievalMethod) -> Self {
        self.methods = self.methods.with_platform(platform, method);
        self
    }

    /// Replace the precheck settings.
    pub fn precheck(mut self, precheck: PrecheckConfig) -> Self {
        self.precheck = precheck;
        self
    }

    /// Set the management port probed by prechecks (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.precheck.port = port;
        self
    }

    /// Set the precheck probe timeout (default: 3 s).
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.precheck.timeout = timeout;
        self
    }

    /// Set the CLI transport.
    pub fn cli_transport(mut self, transport: impl CommandTransport + 'static) -> Self {
        self.cli_transport = Some(Arc::new(transport));
        self
    }

    /// Set the structured-getter transport, enabling API retrieval.
    pub fn api_transport(mut self, transport: impl ConfigGetter + 'static) -> Self {
        self.api_transport = Some(Arc::new(transport));
        self
    }

    /// Set the templating collaborator.
    pub fn renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Set the comparison collaborator, enabling compliance checks.
    pub fn compliance_engine(mut self, engine: impl ComplianceEngine + 'static) -> Self {
        self.compliance = Some(Arc::new(engine));
        self
    }

    /// Set the address resolver.
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Set the port probe.
    pub fn port_probe(mut self, probe: impl PortProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Set artifact storage.
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Set the reporter.
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Build the dispatcher.
    ///
    /// Fails if the method table routes platforms to API retrieval but no
    /// structured-getter transport was supplied. The failure is reported
    /// under the subject `"dispatcher"`.
    pub fn build(self) -> Result<Dispatcher> {
        let reporter = self.reporter.unwrap_or_else(|| Arc::new(LogReporter));

        if self.methods.uses(RetrievalMethod::Api) && self.api_transport.is_none() {
            return Err(fail(
                reporter.as_ref(),
                BUILD_SUBJECT,
                FatalError::NotConfigured {
                    component: format!("{} transport", RetrievalMethod::Api),
                },
            ));
        }

        let storage = self.storage.unwrap_or_else(|| Arc::new(FsStorage::new()));
        let context = DriverContext::new(storage.clone(), reporter.clone());

        let cli_transport = self
            .cli_transport
            .unwrap_or_else(|| Arc::new(SshTransport::default()));

        let mut drivers = IndexMap::new();
        drivers.insert(
            RetrievalMethod::Cli,
            RetrievalDriver::Cli(CliDriver::new(
                cli_transport,
                Arc::new(self.commands),
                context.clone(),
            )),
        );
        if let Some(transport) = self.api_transport {
            drivers.insert(
                RetrievalMethod::Api,
                RetrievalDriver::Api(ApiDriver::new(transport, context)),
            );
        }

        let prechecker = Prechecker::new(
            self.precheck,
            self.resolver.unwrap_or_else(|| Arc::new(SystemResolver)),
            self.probe.unwrap_or_else(|| Arc::new(TcpProbe)),
            reporter.clone(),
        );

        let renderer = ConfigRenderer::new(
            self.renderer
                .unwrap_or_else(|| Arc::new(HandlebarsRenderer::default())),
            storage.clone(),
            reporter.clone(),
        );

        let compliance = self
            .compliance
            .map(|engine| ComplianceEvaluator::new(engine, storage, reporter.clone()));

        Ok(Dispatcher {
            prechecker,
            drivers,
            methods: Arc::new(self.methods),
            renderer,
            compliance,
            reporter,
        })
    }
}
