//! Configuration for fcgi-client
//!
//! Connection settings with sensible defaults.

use std::fmt;
use std::str::FromStr;

use crate::error::{FcgiError, Result};
use crate::protocol::Role;

/// Settings for one client connection
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Application server address: `host:port` for TCP, a socket path for Unix
    pub address: String,

    /// Stream transport used to reach the address
    pub transport: Transport,

    // -------------------------------------------------------------------------
    // Request Configuration
    // -------------------------------------------------------------------------
    /// Role requested in every BeginRequest
    pub role: Role,

    /// Ask the application server to keep the connection open after a request
    pub keep_conn: bool,

    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// TCP connect timeout (milliseconds, 0 = operating system default)
    pub connect_timeout_ms: u64,

    /// Read timeout (milliseconds, 0 = block until the server answers)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm on TCP connections
    pub nodelay: bool,
}

/// Stream transport kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Tcp,

    /// Unix domain socket (Unix platforms only)
    Unix,
}

impl FromStr for Transport {
    type Err = FcgiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Transport::Tcp),
            "unix" => Ok(Transport::Unix),
            other => Err(FcgiError::Config(format!("unknown transport: {}", other))),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => f.write_str("tcp"),
            Transport::Unix => f.write_str("unix"),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:9000".to_string(),
            transport: Transport::Tcp,
            role: Role::Responder,
            keep_conn: true,
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            nodelay: true,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check the settings before dialing.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(FcgiError::Config("address must not be empty".to_string()));
        }

        if self.transport == Transport::Unix && !cfg!(unix) {
            return Err(FcgiError::Config(
                "unix transport is not available on this platform".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the application server address
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the transport kind
    pub fn transport(mut self, transport: Transport) -> Self {
        self.config.transport = transport;
        self
    }

    /// Set the role requested in BeginRequest records
    pub fn role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    /// Set the keep-connection flag
    pub fn keep_conn(mut self, keep: bool) -> Self {
        self.config.keep_conn = keep;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
