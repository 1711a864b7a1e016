//! Node configuration
//!
//! All settings a node needs to run: where the listener binds, how often
//! the dispatch loop fires, and the safety limits on inbound connections.

use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default TCP port for chat messages (unprivileged).
pub const DEFAULT_PORT: u16 = 12141;

/// Default cadence of the dispatch loop.
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_millis(250);

/// Default upper bound on a single inbound message (256 KiB).
///
/// The wire format has no framing, so without a cap a peer that never
/// closes its write side could grow one buffer without limit.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 256 * 1024;

/// Default per-read idle timeout for inbound connections.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default cap on concurrently handled inbound connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Complete node configuration
///
/// Instances start from `Default` and are adjusted with the chainable
/// `with_*` setters; `ChatNodeBuilder::build` validates before use.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Address the inbound listener binds to.
    ///
    /// The unspecified address (the default) listens on all interfaces.
    pub bind_address: IpAddr,

    /// TCP port for inbound and outbound messages.
    ///
    /// Port 0 asks the OS for a free port (useful in tests).
    pub port: u16,

    /// How often the dispatch loop drains the inbound queue.
    pub dispatch_interval: Duration,

    /// Upper bound on the size of one inbound message.
    pub max_message_bytes: usize,

    /// How long a single read on an inbound connection may stall before
    /// the handler gives up on the peer.
    pub idle_timeout: Duration,

    /// Maximum number of inbound connections handled concurrently.
    pub max_connections: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ChatConfig {
    /// Set the listener bind address.
    pub fn with_bind_address(mut self, address: IpAddr) -> Self {
        self.bind_address = address;
        self
    }

    /// Set the TCP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the dispatch loop cadence.
    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    /// Set the per-message size cap.
    pub fn with_max_message_bytes(mut self, bytes: usize) -> Self {
        self.max_message_bytes = bytes;
        self
    }

    /// Set the per-read idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the concurrent-connection cap.
    pub fn with_max_connections(mut self, count: usize) -> Self {
        self.max_connections = count;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any value is unusable:
    /// - `dispatch_interval` must be non-zero
    /// - `max_message_bytes` must be greater than 0
    /// - `max_connections` must be greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.dispatch_interval.is_zero() {
            return Err(Error::Config {
                reason: "dispatch_interval must be non-zero".to_string(),
            });
        }
        if self.max_message_bytes == 0 {
            return Err(Error::Config {
                reason: "max_message_bytes must be greater than 0".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(Error::Config {
                reason: "max_connections must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
