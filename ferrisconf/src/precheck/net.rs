//! Address resolution and port probing collaborators.

use std::io;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

/// Resolves host addresses.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Parse `hostname` as a literal IP address.
    fn literal_address(&self, hostname: &str) -> Option<IpAddr> {
        hostname.parse().ok()
    }

    /// Resolve `hostname` to an address.
    async fn resolve(&self, hostname: &str) -> io::Result<IpAddr>;
}

/// Checks whether a TCP port accepts connections.
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// `true` if `address:port` accepted a connection within `timeout`.
    async fn probe(&self, address: IpAddr, port: u16, timeout: Duration) -> bool;
}

/// Resolver backed by the system resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> io::Result<IpAddr> {
        tokio::net::lookup_host((hostname, 0))
            .await?
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses for {}", hostname),
                )
            })
    }
}

/// Probe that opens and immediately drops a TCP connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

#[async_trait]
impl PortProbe for TcpProbe {
    async fn probe(&self, address: IpAddr, port: u16, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect((address, port))).await,
            Ok(Ok(_))
        )
    }
}
