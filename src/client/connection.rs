//! One socket, one request, one reply.
//!
//! [`QueryConnection`] owns the socket for a single submission. It is never
//! pooled or reused; [`QueryConnection::close`] consumes it.

use std::fmt;
use std::sync::Once;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::endpoint::Endpoint;
use crate::error::ClientError;
use crate::protocol::QueryResponse;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

static CRYPTO_PROVIDER: Once = Once::new();

/// Installs the `ring` provider as the process-wide rustls default unless
/// one is already installed.
fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("rustls crypto provider already installed");
        }
    });
}

/// An open socket to the backend's `/data` endpoint.
pub struct QueryConnection {
    endpoint: Endpoint,
    socket: Socket,
}

impl fmt::Debug for QueryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryConnection")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl QueryConnection {
    /// Opens a socket to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] if the TCP, TLS or WebSocket
    /// handshake fails.
    pub async fn open(endpoint: &Endpoint) -> Result<Self, ClientError> {
        if endpoint.is_secure() {
            install_crypto_provider();
        }
        let (socket, _response) =
            connect_async(endpoint.as_str())
                .await
                .map_err(|source| ClientError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
        tracing::debug!(endpoint = %endpoint, "websocket open");
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Returns the endpoint this socket is connected to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sends an encoded request as a single text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the frame cannot be written.
    pub async fn send(&mut self, payload: &str) -> Result<(), ClientError> {
        self.socket.send(Message::text(payload.to_string())).await?;
        Ok(())
    }

    /// Waits for the first JSON frame.
    ///
    /// Control frames are skipped. `timeout` of `None` waits forever.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ClosedBeforeResponse`] if the peer closes
    /// first, [`ClientError::Timeout`] if `timeout` elapses,
    /// [`ClientError::Transport`] on socket failure and
    /// [`ClientError::MalformedResponse`] if the frame is not JSON.
    pub async fn receive(&mut self, timeout: Option<Duration>) -> Result<QueryResponse, ClientError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.next_reply())
                .await
                .map_err(|_| ClientError::Timeout {
                    ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => self.next_reply().await,
        }
    }

    async fn next_reply(&mut self) -> Result<QueryResponse, ClientError> {
        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => return QueryResponse::parse(text.as_str()),
                Some(Ok(Message::Binary(bytes))) => {
                    let text = std::str::from_utf8(&bytes).map_err(|e| {
                        ClientError::MalformedResponse(format!("binary frame is not UTF-8: {e}"))
                    })?;
                    return QueryResponse::parse(text);
                }
                Some(Ok(Message::Close(_))) | None => return Err(ClientError::ClosedBeforeResponse),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(ClientError::Transport(e)),
            }
        }
    }

    /// Closes the socket. Close failures are logged, not returned.
    pub async fn close(mut self) {
        if let Err(e) = self.socket.close(None).await {
            tracing::debug!(endpoint = %self.endpoint, error = %e, "websocket close failed");
        }
        tracing::debug!(endpoint = %self.endpoint, "websocket closing");
    }
}
