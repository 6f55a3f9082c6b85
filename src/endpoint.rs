//! Backend endpoint selection.
//!
//! Local development pages talk to the backend on port 8080 over plain
//! `ws://`; every other host is reached through the TLS-terminating proxy
//! over `wss://` on the default port.

use std::fmt;

use crate::error::ClientError;

/// Path of the backend's query socket.
pub const DATA_PATH: &str = "/data";

/// Port the backend listens on during local development.
pub const LOCAL_PORT: u16 = 8080;

/// Hostnames treated as local development hosts.
const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "127.0.0.1."];

/// Returns `true` if `hostname` names the local development machine.
#[must_use]
pub fn is_local_host(hostname: &str) -> bool {
    LOCAL_HOSTS.contains(&hostname)
}

/// A validated WebSocket URL for the backend query socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    /// Derives the endpoint from the page hostname.
    ///
    /// `localhost` and `127.0.0.1` map to `ws://{host}:8080/data`, anything
    /// else maps to `wss://{host}/data`.
    #[must_use]
    pub fn for_hostname(hostname: &str) -> Self {
        let hostname = hostname.trim();
        if is_local_host(hostname) {
            Self(format!("ws://{hostname}:{LOCAL_PORT}{DATA_PATH}"))
        } else {
            Self(format!("wss://{hostname}{DATA_PATH}"))
        }
    }

    /// Accepts an explicit endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] if the URL does not start
    /// with `ws://` or `wss://`, or has nothing after the scheme.
    pub fn parse(url: &str) -> Result<Self, ClientError> {
        let url = url.trim();
        let rest = url
            .strip_prefix("wss://")
            .or_else(|| url.strip_prefix("ws://"))
            .ok_or_else(|| ClientError::InvalidEndpoint(format!("{url}: expected ws:// or wss://")))?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ClientError::InvalidEndpoint(format!("{url}: missing host")));
        }
        Ok(Self(url.to_string()))
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the endpoint uses TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.0.starts_with("wss://")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
