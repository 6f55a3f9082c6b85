//! `list_experiments` replies: options of the experiment picker.

use super::{RenderOutcome, dump_raw};
use crate::client::FormBinding;
use crate::dom::Document;
use crate::error::ClientError;
use crate::protocol::QueryResponse;

/// Fills the select `{img_target}-{use_id}` with one option per experiment.
///
/// A non-200 reply empties the select and dumps the body into the sibling
/// container `raw-{use_id}`.
///
/// # Errors
///
/// Returns [`ClientError::MissingElement`] if the select or the `raw-`
/// container is absent and
/// [`ClientError::MalformedResponse`] if a 200 reply has no
/// `experiments` list.
pub fn render_experiments(
    document: &mut Document,
    form: &FormBinding,
    response: &QueryResponse,
) -> Result<RenderOutcome, ClientError> {
    let select = document.tagged(form.img_target(), form.use_id())?;
    let raw = document.tagged("raw", form.use_id())?;
    document.clear_children(raw);

    if !response.is_success() {
        document.clear_children(select);
        dump_raw(document, raw, response);
        return Ok(RenderOutcome::ErrorRendered);
    }

    let mut experiments = response.experiments()?;
    experiments.sort();
    experiments.dedup();

    document.clear_children(select);
    for name in &experiments {
        let option = document.append_new(select, "option");
        document.set_attribute(option, "value", name);
        document.set_text(option, name);
    }
    Ok(RenderOutcome::Rendered)
}
