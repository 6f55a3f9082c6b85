//! Client error types.
//!
//! [`ClientError`] is the central error type for the query client. A
//! non-200 response from the backend is *not* an error: it is rendered as a
//! placeholder image or raw JSON dump. Everything that stops a submission
//! before rendering completes ends up here.

use tokio_tungstenite::tungstenite;

/// Errors raised while configuring the client, talking to the backend, or
/// mutating the page document.
///
/// # Error Kinds
///
/// | Kind                | Raised by                         |
/// |---------------------|-----------------------------------|
/// | `config`            | [`crate::config::ClientConfig`]   |
/// | `invalid_endpoint`  | [`crate::endpoint::Endpoint`]     |
/// | `connect`           | socket open                       |
/// | `transport`         | send / receive on an open socket  |
/// | `closed`            | socket closed before the reply    |
/// | `timeout`           | optional response timeout elapsed |
/// | `malformed_response`| reply is not the expected JSON    |
/// | `invalid_image`     | `image_bytes` is not base64       |
/// | `missing_element`   | document contract violated        |
/// | `serialize`         | request could not be encoded      |
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration value is present but unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Endpoint URL does not use a WebSocket scheme.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Opening the WebSocket failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// Endpoint the client tried to reach.
        endpoint: String,
        /// Underlying WebSocket error.
        #[source]
        source: tungstenite::Error,
    },

    /// Sending or receiving on an open socket failed.
    #[error("websocket transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// The server closed the socket without sending a reply.
    #[error("socket closed before a response arrived")]
    ClosedBeforeResponse,

    /// No reply arrived within the configured response timeout.
    #[error("no response within {ms} ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        ms: u64,
    },

    /// The reply is not valid JSON or lacks the fields its action needs.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// `image_bytes` could not be decoded as base64.
    #[error("invalid image payload: {0}")]
    InvalidImage(#[from] base64::DecodeError),

    /// A required element is absent from the document.
    #[error("element not found: #{0}")]
    MissingElement(String),

    /// The request could not be serialized.
    #[error("request serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns a stable, machine-readable name for this variant.
    ///
    /// Used as the `error` field of structured log events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::InvalidEndpoint(_) => "invalid_endpoint",
            Self::Connect { .. } => "connect",
            Self::Transport(_) => "transport",
            Self::ClosedBeforeResponse => "closed",
            Self::Timeout { .. } => "timeout",
            Self::MalformedResponse(_) => "malformed_response",
            Self::InvalidImage(_) => "invalid_image",
            Self::MissingElement(_) => "missing_element",
            Self::Serialize(_) => "serialize",
        }
    }

    /// Returns `true` for failures of the socket itself, as opposed to
    /// failures while interpreting or rendering a reply.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Transport(_) | Self::ClosedBeforeResponse | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable() {
        assert_eq!(ClientError::ClosedBeforeResponse.kind(), "closed");
        assert_eq!(
            ClientError::MissingElement("colorgram-abc".to_string()).kind(),
            "missing_element"
        );
        assert_eq!(ClientError::Timeout { ms: 3000 }.kind(), "timeout");
    }

    #[test]
    fn transport_classification() {
        assert!(ClientError::ClosedBeforeResponse.is_transport());
        assert!(ClientError::Timeout { ms: 1000 }.is_transport());
        assert!(!ClientError::MalformedResponse("x".to_string()).is_transport());
        assert!(!ClientError::Config("x".to_string()).is_transport());
    }

    #[test]
    fn missing_element_message_names_the_id() {
        let err = ClientError::MissingElement("details-1a2b3".to_string());
        assert_eq!(err.to_string(), "element not found: #details-1a2b3");
    }
}
