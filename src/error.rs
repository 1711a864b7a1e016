//! Error types for lanchat

use crate::events::ConversationId;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for lanchat operations
#[derive(Error, Debug)]
pub enum Error {
    /// The listener could not acquire its address and port. Fatal at startup.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Address the listener tried to bind
        address: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An outbound connection could not be established.
    #[error("peer {address} is unreachable: {source}")]
    Connect {
        /// Address of the peer that refused or timed out
        address: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An outbound connection was established but writing the message failed.
    #[error("send to {address} failed: {source}")]
    Send {
        /// Address of the peer the write was going to
        address: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The conversation is not (or is no longer) live.
    #[error("no live conversation {id}")]
    UnknownConversation {
        /// Identifier the caller supplied
        id: ConversationId,
    },

    /// The address-book file could not be read, written, or parsed.
    #[error("address book {path}: {reason}")]
    Directory {
        /// Path of the offending file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Configuration or lifecycle misuse.
    #[error("invalid configuration: {reason}")]
    Config {
        /// Which check failed
        reason: String,
    },

    /// I/O errors with no more specific variant.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the remote peer could not be reached.
    ///
    /// The UI renders these as an inline conversation notice rather than a
    /// failure of the application itself.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Connect { .. } | Error::Send { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_classification() {
        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let error = Error::Connect {
            address: "10.0.0.99:12141".parse().unwrap(),
            source: refused,
        };
        assert!(error.is_unreachable());

        let error = Error::Config {
            reason: "max_connections".to_string(),
        };
        assert!(!error.is_unreachable());
    }

    #[test]
    fn test_display_carries_address() {
        let error = Error::Connect {
            address: "10.0.0.99:12141".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert!(error.to_string().contains("10.0.0.99:12141"));
    }
}
