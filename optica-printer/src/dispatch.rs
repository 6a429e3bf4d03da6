//! Connection descriptor routing
//!
//! A printer's connection descriptor is either a spooler share path
//! (`\\HOST\Queue`, `//host/queue`) or a raw socket address (`host`,
//! `host:port`, `[v6]:port`).

use crate::document::ComposedDocument;
use crate::error::{DeliveryError, DeliveryResult};
use crate::printer::{DEFAULT_TIMEOUT, NetworkPrinter, Printer, SharePrinter};
use crate::spooler::{ShareTransport, default_spooler};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Standard raw printing port (JetDirect)
pub const DEFAULT_PORT: u16 = 9100;

/// Transport selected for a connection descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Spooler queue addressed by a share path
    Share { path: String },
    /// Raw TCP socket
    Socket { host: String, port: u16 },
}

impl Target {
    /// Classify a connection descriptor
    pub fn parse(connection_path: &str) -> DeliveryResult<Self> {
        let descriptor = connection_path.trim();
        if descriptor.is_empty() {
            return Err(DeliveryError::transport("Empty connection path"));
        }

        if descriptor.starts_with(r"\\") || descriptor.starts_with("//") {
            return Ok(Self::Share {
                path: descriptor.to_string(),
            });
        }

        let (host, port) = split_host_port(descriptor)?;
        Ok(Self::Socket { host, port })
    }
}

fn parse_port(port: &str, descriptor: &str) -> DeliveryResult<u16> {
    port.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| DeliveryError::transport(format!("Invalid port in address: {}", descriptor)))
}

fn split_host_port(descriptor: &str) -> DeliveryResult<(String, u16)> {
    let (host, port) = if let Some(rest) = descriptor.strip_prefix('[') {
        // [v6]:port or [v6]
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| DeliveryError::transport(format!("Invalid address: {}", descriptor)))?;
        let port = match tail.strip_prefix(':') {
            Some(p) => parse_port(p, descriptor)?,
            None if tail.is_empty() => DEFAULT_PORT,
            None => {
                return Err(DeliveryError::transport(format!(
                    "Invalid address: {}",
                    descriptor
                )));
            }
        };
        (host, port)
    } else {
        match descriptor.split_once(':') {
            // Bare IPv6 literal, no port
            Some((_, rest)) if rest.contains(':') => (descriptor, DEFAULT_PORT),
            Some((host, port)) => (host, parse_port(port, descriptor)?),
            None => (descriptor, DEFAULT_PORT),
        }
    };

    if host.is_empty() {
        return Err(DeliveryError::transport(format!(
            "Missing host in address: {}",
            descriptor
        )));
    }

    Ok((host.to_string(), port))
}

/// Routes payloads to the transport named by a connection descriptor
///
/// Holds no per-job state: every delivery opens its own connection or
/// spooler job, so one dispatcher can serve any number of concurrent calls.
#[derive(Clone)]
pub struct Dispatcher {
    spooler: Arc<dyn ShareTransport>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(spooler: Arc<dyn ShareTransport>) -> Self {
        Self {
            spooler,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the bound applied to every delivery
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver a raw payload to the printer behind `connection_path`
    #[instrument(
        skip(self, payload),
        fields(connection = connection_path, data_len = payload.len())
    )]
    pub async fn deliver(&self, connection_path: &str, payload: &[u8]) -> DeliveryResult<()> {
        let result = match Target::parse(connection_path)? {
            Target::Share { path } => {
                info!(transport = "share", "Dispatching print job");
                SharePrinter::new(path, Arc::clone(&self.spooler))
                    .with_timeout(self.timeout)
                    .print(payload)
                    .await
            }
            Target::Socket { host, port } => {
                info!(transport = "socket", host = %host, port, "Dispatching print job");
                NetworkPrinter::new(host, port)
                    .with_timeout(self.timeout)
                    .print(payload)
                    .await
            }
        };

        if let Err(e) = &result {
            error!(error = %e, "Print job delivery failed");
        }
        result
    }

    /// Deliver a composed document
    pub async fn deliver_document(
        &self,
        connection_path: &str,
        document: &ComposedDocument,
    ) -> DeliveryResult<()> {
        self.deliver(connection_path, &document.to_bytes()).await
    }

    /// Best-effort reachability check, never a delivery guard
    #[instrument(skip(self))]
    pub async fn probe(&self, connection_path: &str) -> bool {
        match Target::parse(connection_path) {
            Ok(Target::Share { path }) => {
                SharePrinter::new(path, Arc::clone(&self.spooler))
                    .is_online()
                    .await
            }
            Ok(Target::Socket { host, port }) => NetworkPrinter::new(host, port).is_online().await,
            Err(_) => false,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(default_spooler())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
