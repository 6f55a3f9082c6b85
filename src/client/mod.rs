//! Query client: one parameterized request/response handler for every
//! action.
//!
//! [`QueryClient::submit_query`] reads a form out of the document, opens a
//! fresh socket, sends one request, awaits one reply, renders it and closes
//! the socket. Submissions share nothing but the document they are handed,
//! so two submissions against the same form are neither deduplicated nor
//! ordered.

pub mod connection;
pub mod form;
pub mod state;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::ClientConfig;
use crate::dom::Document;
use crate::endpoint::Endpoint;
use crate::error::ClientError;
use crate::protocol::{QueryRequest, QueryResponse};
use crate::render::{RenderOutcome, Renderer};

pub use connection::QueryConnection;
pub use form::FormBinding;
pub use state::{Lifecycle, QueryState};

/// Record of a completed submission.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Request that was sent.
    pub request: QueryRequest,
    /// Reply that was rendered.
    pub response: QueryResponse,
    /// Rendering branch taken.
    pub outcome: RenderOutcome,
    /// States visited, `idle` first and `closed` last.
    pub history: Vec<QueryState>,
    /// When the submission started.
    pub started_at: DateTime<Utc>,
    /// When the socket was closed.
    pub finished_at: DateTime<Utc>,
}

impl Submission {
    /// Returns the wall-clock duration of the submission in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Submits forms to the backend and renders the replies.
#[derive(Debug, Clone)]
pub struct QueryClient {
    endpoint: Endpoint,
    response_timeout: Option<Duration>,
    renderer: Renderer,
}

impl QueryClient {
    /// Creates a client that waits forever for replies.
    #[must_use]
    pub const fn new(endpoint: Endpoint, renderer: Renderer) -> Self {
        Self {
            endpoint,
            response_timeout: None,
            renderer,
        }
    }

    /// Creates a client from the configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            response_timeout: config.response_timeout(),
            renderer: Renderer::from_config(config),
        }
    }

    /// Gives up on a reply after `timeout`.
    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Returns the endpoint every submission connects to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the renderer.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Runs one submission of `form` against `document`.
    ///
    /// Shows `loading-{use_id}` (when present) before connecting; it is
    /// hidden again only by a successful render, so a submission that
    /// fails in transport leaves it visible.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingElement`] if a bound input or the
    /// target element is absent, [`ClientError::Serialize`] if the request
    /// cannot be encoded, a transport variant if the socket fails or
    /// closes before replying, [`ClientError::MalformedResponse`] /
    /// [`ClientError::InvalidImage`] if a 200 reply cannot be rendered.
    pub async fn submit_query(
        &self,
        document: &mut Document,
        form: &FormBinding,
    ) -> Result<Submission, ClientError> {
        let started_at = Utc::now();
        let mut lifecycle = Lifecycle::new();
        let request = form.build_request(document)?;
        let payload = request.to_json()?;

        if let Some(spinner) = document.get_element_by_id(&form.tag("loading")) {
            document.show(spinner);
        }

        lifecycle.advance(QueryState::Connecting);
        let mut connection = QueryConnection::open(&self.endpoint)
            .await
            .inspect_err(|e| log_failure(form, &lifecycle, e))?;

        tracing::info!(
            action = %form.action(),
            use_id = form.use_id(),
            endpoint = %self.endpoint,
            request = %payload,
            "sending query"
        );
        if let Err(e) = connection.send(&payload).await {
            log_failure(form, &lifecycle, &e);
            connection.close().await;
            return Err(e);
        }
        lifecycle.advance(QueryState::AwaitingResponse);

        let response = match connection.receive(self.response_timeout).await {
            Ok(response) => response,
            Err(e) => {
                log_failure(form, &lifecycle, &e);
                connection.close().await;
                return Err(e);
            }
        };
        tracing::info!(
            use_id = form.use_id(),
            status = ?response.status(),
            reply = %response.log_summary(),
            "reply received"
        );

        let outcome = match self.renderer.render(document, form, &response) {
            Ok(outcome) => outcome,
            Err(e) => {
                log_failure(form, &lifecycle, &e);
                connection.close().await;
                return Err(e);
            }
        };
        lifecycle.advance(match outcome {
            RenderOutcome::Rendered => QueryState::Rendered,
            RenderOutcome::ErrorRendered => QueryState::ErrorRendered,
        });

        connection.close().await;
        lifecycle.advance(QueryState::Closed);

        let submission = Submission {
            request,
            response,
            outcome,
            history: lifecycle.history().to_vec(),
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            action = %form.action(),
            use_id = form.use_id(),
            outcome = ?submission.outcome,
            elapsed_ms = submission.elapsed_ms(),
            "query complete"
        );
        Ok(submission)
    }
}

fn log_failure(form: &FormBinding, lifecycle: &Lifecycle, error: &ClientError) {
    if error.is_transport() {
        tracing::warn!(
            action = %form.action(),
            use_id = form.use_id(),
            state = %lifecycle.state(),
            error = error.kind(),
            "query failed: {error}"
        );
    } else {
        tracing::error!(
            action = %form.action(),
            use_id = form.use_id(),
            state = %lifecycle.state(),
            error = error.kind(),
            "reply could not be rendered: {error}"
        );
    }
}
