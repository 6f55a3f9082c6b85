//! Rendering of replies into the page document.
//!
//! [`Renderer::render`] is the single entry point; it branches on the
//! form's [`Action`] and on the reply status. A non-200 reply is rendered
//! as a placeholder image (`get`) or a raw JSON dump (list actions) and
//! reported as [`RenderOutcome::ErrorRendered`].

pub mod colorgram;
pub mod experiments;
pub mod gallery;

use serde::Serialize;

use crate::client::FormBinding;
use crate::config::ClientConfig;
use crate::dom::{Document, NodeId};
use crate::error::ClientError;
use crate::protocol::{Action, Doc, QueryResponse};

pub use gallery::{column_count, dedup_items};

/// Which terminal branch rendering took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderOutcome {
    /// A 200 reply was rendered.
    Rendered,
    /// A non-200 reply was rendered as a placeholder or raw dump.
    ErrorRendered,
}

/// Renders replies for every action.
#[derive(Debug, Clone)]
pub struct Renderer {
    fallback_image_url: String,
    items_per_column: usize,
}

impl Renderer {
    /// Creates a renderer. A column height of `0` is treated as `1`.
    #[must_use]
    pub fn new(fallback_image_url: impl Into<String>, items_per_column: usize) -> Self {
        Self {
            fallback_image_url: fallback_image_url.into(),
            items_per_column: items_per_column.max(1),
        }
    }

    /// Creates a renderer from the client configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.fallback_image_url.clone(), config.items_per_column)
    }

    /// Returns the placeholder image URL.
    #[must_use]
    pub fn fallback_image_url(&self) -> &str {
        &self.fallback_image_url
    }

    /// Returns the gallery column height.
    #[must_use]
    pub const fn items_per_column(&self) -> usize {
        self.items_per_column
    }

    /// Renders `response` into `document` for the form that sent it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingElement`] if the form's target element
    /// is absent, [`ClientError::MalformedResponse`] if a 200 reply lacks
    /// its payload, and [`ClientError::InvalidImage`] if a colorgram is not
    /// valid base64.
    pub fn render(
        &self,
        document: &mut Document,
        form: &FormBinding,
        response: &QueryResponse,
    ) -> Result<RenderOutcome, ClientError> {
        let outcome = match form.action() {
            Action::Get => {
                colorgram::render_colorgram(document, form, response, &self.fallback_image_url)?
            }
            Action::ListImageUrls => {
                gallery::render_gallery(document, form, response, self.items_per_column)?
            }
            Action::ListExperiments => experiments::render_experiments(document, form, response)?,
        };

        if outcome == RenderOutcome::Rendered
            && let Some(spinner) = document.get_element_by_id(&form.tag("loading"))
        {
            document.hide(spinner);
        }

        tracing::debug!(
            action = %form.action(),
            use_id = form.use_id(),
            outcome = ?outcome,
            "reply rendered"
        );
        Ok(outcome)
    }
}

/// Replaces the children of `details` with one `p.meta` line per metadata
/// field of `doc`.
pub(crate) fn fill_details(document: &mut Document, details: NodeId, doc: &Doc) {
    document.clear_children(details);
    if let Some(id) = &doc.id {
        let line = document.append_new(details, "p");
        document.add_class(line, "doc-id");
        document.set_text(line, id);
    }
    for (name, value) in doc.metadata() {
        let line = document.append_new(details, "p");
        document.add_class(line, "meta");
        document.set_attribute(line, "data-field", &name);
        document.set_text(line, &format!("{name}: {value}"));
    }
}

/// Appends the reply body, pretty-printed, as a `pre.raw-response` under
/// `container`.
pub(crate) fn dump_raw(document: &mut Document, container: NodeId, response: &QueryResponse) {
    let pre = document.append_new(container, "pre");
    document.add_class(pre, "raw-response");
    document.set_text(pre, &response.pretty());
}
