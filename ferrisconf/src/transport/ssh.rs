//! SSH command transport using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, warn};
use russh::ChannelMsg;
use russh::client::{self, Handle};
use russh::keys::PublicKey;

use super::CommandTransport;
use super::config::{HostKeyVerification, SshConfig};
use crate::error::TransportError;
use crate::host::Host;

/// Runs commands over an SSH `exec` channel.
///
/// Each call opens its own session, authenticates with the host's username
/// and password, executes one command, and disconnects. No state is kept
/// between calls, so one transport can serve many hosts concurrently.
#[derive(Debug, Clone, Default)]
pub struct SshTransport {
    config: SshConfig,
}

impl SshTransport {
    /// Create a transport with the given settings.
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Transport settings.
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Connect to the host and authenticate.
    async fn connect(&self, host: &Host) -> Result<Handle<SshHandler>, TransportError> {
        let port = host.port.unwrap_or(self.config.port);
        // Bounded by the caller's timeouts rather than russh's inactivity timer.
        let ssh_config = Arc::new(client::Config::default());

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: host.hostname.clone(),
            port,
            host_key_verification: self.config.host_key_verification.clone(),
            known_hosts_path: self.config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        let mut session = client::connect(ssh_config, (host.hostname.as_str(), port), handler)
            .await
            .map_err(|e| {
                // Prefer the detailed host-key error over russh's generic one.
                host_key_error
                    .lock()
                    .ok()
                    .and_then(|mut slot| slot.take())
                    .unwrap_or_else(|| TransportError::ConnectionFailed {
                        host: host.hostname.clone(),
                        port,
                        message: e.to_string(),
                    })
            })?;

        let auth = session
            .authenticate_password(host.username.as_str(), host.password().unwrap_or_default())
            .await
            .map_err(|e| TransportError::Ssh(e.to_string()))?;

        if !auth.success() {
            return Err(TransportError::Authentication {
                user: host.username.clone(),
            });
        }

        Ok(session)
    }

    /// Execute `command` and collect stdout and stderr until the channel closes.
    async fn exec(session: &Handle<SshHandler>, command: &str) -> Result<String, TransportError> {
        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| TransportError::Ssh(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| TransportError::Ssh(e.to_string()))?;

        let mut output = Vec::new();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, .. } => output.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => {
                    debug!("`{}` exited with status {}", command, exit_status);
                }
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

#[async_trait]
impl CommandTransport for SshTransport {
    async fn send_command(&self, host: &Host, command: &str) -> Result<String, TransportError> {
        let timeout = self.config.timeout;

        let session = tokio::time::timeout(timeout, self.connect(host))
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;

        let output = tokio::time::timeout(timeout, Self::exec(&session, command))
            .await
            .map_err(|_| TransportError::Timeout(timeout));

        if let Err(e) = session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
        {
            debug!("Disconnect from {} failed: {}", host.hostname, e);
        }

        output?
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Detailed host-key error surfaced by `connect()`.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// `Ok(true)` if known and matching, `Ok(false)` if unknown.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> Result<bool, TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::Other(format!("known_hosts: {}", e))),
        }
    }

    fn learn_host_key(&self, pubkey: &PublicKey) {
        let result = match self.known_hosts_path {
            Some(ref path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };

        if let Err(e) = result {
            warn!("Failed to save host key for {}: {}", self.host, e);
        }
    }

    fn reject(&self, err: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(err);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let accepted = match self.host_key_verification {
            HostKeyVerification::Disabled => true,
            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    self.learn_host_key(server_public_key);
                    true
                }
                Err(e) => self.reject(e),
            },
            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };
        Ok(accepted)
    }
}
