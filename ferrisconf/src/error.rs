//! Error types for ferrisconf.
//!
//! Every pipeline operation returns [`Result`], whose error side is the
//! two-level taxonomy below:
//!
//! - [`HostError`] - an expected, host-scoped failure (bad credentials,
//!   unreachable device, rejected command, broken template). Callers usually
//!   skip the host and continue the batch.
//! - [`FatalError`] - an environment or precondition defect (missing artifact,
//!   malformed sanitization rule, comparison engine fault). Retrying without
//!   remediation will not help.
//!
//! Collaborator errors ([`TransportError`], [`TemplateError`],
//! [`ComparisonError`]) never escape a component; they are classified into
//! one of the two above first.

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferrisconf operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Failure scoped to a single host.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Environment or precondition defect.
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl Error {
    /// Returns `true` if this is a host-scoped failure.
    pub fn is_host_failure(&self) -> bool {
        matches!(self, Error::Host(_))
    }

    /// Returns `true` if this is a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal(_))
    }

    /// Short tag identifying the failure class, for reports.
    pub fn tag(&self) -> &'static str {
        match self {
            Error::Host(e) => e.tag(),
            Error::Fatal(e) => e.tag(),
        }
    }

    /// The host failure, if any.
    pub fn as_host(&self) -> Option<&HostError> {
        match self {
            Error::Host(e) => Some(e),
            Error::Fatal(_) => None,
        }
    }
}

/// Host-scoped failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Hostname is neither a literal address nor resolvable.
    #[error("`{hostname}` is not an IP or resolvable.")]
    Unresolvable { hostname: String },

    /// TCP probe of the management port failed.
    #[error("Attempting to connect to IP: {address} and port: {port} failed.")]
    Unreachable { address: IpAddr, port: u16 },

    /// Host has no username.
    #[error("There was no username defined, preemptively failed.")]
    MissingUsername,

    /// Host has no password.
    #[error("There was no password defined, preemptively failed.")]
    MissingPassword,

    /// Transport rejected the credentials.
    #[error("Failed with an authentication issue: `{0}`")]
    Auth(String),

    /// Transport timed out.
    #[error("Failed with a timeout issue: `{0}`")]
    Timeout(String),

    /// Any other transport failure.
    #[error("Failed with an unknown issue: `{0}`")]
    Unknown(String),

    /// Device parser rejected the command.
    #[error("Discovered `{marker}` in the output")]
    InvalidCommand { marker: String },

    /// Template referenced a variable missing from the host context.
    #[error("There was an undefined variable error: ``{0}``")]
    UndefinedVariable(String),

    /// Template failed to parse.
    #[error("There was a template syntax error: ``{0}``")]
    TemplateSyntax(String),

    /// Template file could not be found.
    #[error("There was an issue finding the template: ``{0}``")]
    TemplateNotFound(String),

    /// Generic templating failure.
    #[error("There was a general template error: ``{0}``")]
    Template(String),
}

impl HostError {
    /// Short tag identifying the failure class.
    pub fn tag(&self) -> &'static str {
        match self {
            HostError::Unresolvable { .. } => "UnresolvableError",
            HostError::Unreachable { .. } => "UnreachableError",
            HostError::MissingUsername => "MissingUsernameError",
            HostError::MissingPassword => "MissingPasswordError",
            HostError::Auth(_) => "AuthError",
            HostError::Timeout(_) => "TimeoutError",
            HostError::Unknown(_) => "UnknownError",
            HostError::InvalidCommand { .. } => "InvalidCommandError",
            HostError::UndefinedVariable(_) => "UndefinedVariableError",
            HostError::TemplateSyntax(_) => "TemplateSyntaxError",
            HostError::TemplateNotFound(_) => "TemplateNotFoundError",
            HostError::Template(_) => "TemplateError",
        }
    }
}

/// Environment and precondition defects.
#[derive(Error, Debug)]
pub enum FatalError {
    /// A sanitization rule could not be compiled.
    #[error("Invalid sanitization rule `{pattern}`: {reason}")]
    InvalidRule { pattern: String, reason: String },

    /// The platform command table has no `default` entry.
    #[error("Platform command table has no `default` entry")]
    MissingDefaultCommand,

    /// Backup artifact missing.
    #[error("Backup file Not Found at location: `{}`", .0.display())]
    BackupMissing(PathBuf),

    /// Intended artifact missing.
    #[error("Intended config file NOT Found at location: `{}`", .0.display())]
    IntendedMissing(PathBuf),

    /// Comparison engine failed.
    #[error("UNKNOWN Failure of: {0}")]
    Comparison(String),

    /// Templating collaborator failed outside the template error vocabulary.
    #[error("Renderer failed: {0}")]
    Renderer(String),

    /// A required collaborator was not configured.
    #[error("No {component} configured")]
    NotConfigured { component: String },

    /// A per-host task was aborted before producing an outcome.
    #[error("Task aborted: {0}")]
    Aborted(String),

    /// Artifact I/O failed.
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FatalError {
    /// Short tag identifying the failure class.
    pub fn tag(&self) -> &'static str {
        match self {
            FatalError::InvalidRule { .. } => "InvalidRuleError",
            FatalError::MissingDefaultCommand => "MissingDefaultCommandError",
            FatalError::BackupMissing(_) => "BackupMissingError",
            FatalError::IntendedMissing(_) => "IntendedMissingError",
            FatalError::Comparison(_) => "ComparisonError",
            FatalError::Renderer(_) => "RendererError",
            FatalError::NotConfigured { .. } => "NotConfiguredError",
            FatalError::Aborted(_) => "AbortedError",
            FatalError::Io { .. } => "IoError",
        }
    }
}

/// Errors raised by transport collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    Authentication { user: String },

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(String),

    /// Host key not present in known_hosts (strict mode)
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Anything else the transport reports
    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for HostError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Authentication { .. } => HostError::Auth(err.to_string()),
            TransportError::Timeout(_) => HostError::Timeout(err.to_string()),
            other => HostError::Unknown(other.to_string()),
        }
    }
}

/// Errors raised by templating collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Undefined variable referenced by the template.
    #[error("{0}")]
    UndefinedVariable(String),

    /// Template syntax error.
    #[error("{0}")]
    Syntax(String),

    /// Template file not found.
    #[error("{0}")]
    NotFound(String),

    /// Any other templating error.
    #[error("{0}")]
    Template(String),

    /// Failure outside the templating vocabulary (I/O, internal faults).
    #[error("{0}")]
    Other(String),
}

/// Error raised by a comparison collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ComparisonError(pub String);

impl ComparisonError {
    /// Create a comparison error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type alias using ferrisconf's Error.
pub type Result<T> = std::result::Result<T, Error>;
