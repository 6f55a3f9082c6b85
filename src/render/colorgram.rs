//! `get` replies: one colorgram into the form's image element.

use super::{RenderOutcome, fill_details};
use crate::client::FormBinding;
use crate::dom::Document;
use crate::error::ClientError;
use crate::protocol::QueryResponse;

/// Renders a `get` reply.
///
/// On success the image `{img_target}-{use_id}` shows the decoded
/// colorgram, the `selector-{use_id}` form is hidden and
/// `details-{use_id}` lists the doc metadata (both only when present). On
/// any other status the image shows `fallback_image_url` and nothing else
/// changes.
///
/// # Errors
///
/// Returns [`ClientError::MissingElement`] if the image element is absent,
/// [`ClientError::MalformedResponse`] if a 200 reply has no `found`, and
/// [`ClientError::InvalidImage`] if `image_bytes` is not base64.
pub fn render_colorgram(
    document: &mut Document,
    form: &FormBinding,
    response: &QueryResponse,
    fallback_image_url: &str,
) -> Result<RenderOutcome, ClientError> {
    let img = document.tagged(form.img_target(), form.use_id())?;

    if !response.is_success() {
        tracing::info!(
            use_id = form.use_id(),
            status = ?response.status(),
            message = response.message().unwrap_or_default(),
            "no colorgram, showing placeholder"
        );
        document.set_attribute(img, "src", fallback_image_url);
        return Ok(RenderOutcome::ErrorRendered);
    }

    let found = response.found()?;
    let src = found.data_url()?;
    document.set_attribute(img, "src", &src);
    document.show(img);

    if let Some(selector) = document.get_element_by_id(&form.tag("selector")) {
        document.hide(selector);
    }
    if let (Some(details), Some(doc)) = (
        document.get_element_by_id(&form.tag("details")),
        found.doc.as_ref(),
    ) {
        fill_details(document, details, doc);
        document.show(details);
    }

    Ok(RenderOutcome::Rendered)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::page;
    use crate::protocol::Action;
    use serde_json::json;

    const FALLBACK: &str = "https://placeholder.example/not-found.jpg";

    fn reply(value: &serde_json::Value) -> QueryResponse {
        let Ok(response) = QueryResponse::parse(&value.to_string()) else {
            panic!("reply should parse");
        };
        response
    }

    fn src_of(document: &Document, element_id: &str) -> Option<String> {
        let node = document.get_element_by_id(element_id)?;
        document.attribute(node, "src").map(str::to_string)
    }

    #[test]
    fn success_sets_data_url_and_hides_selector() {
        let mut document = page::search_form("a1");
        let form = FormBinding::colorgram("a1");
        let response = reply(&json!({
            "status": 200,
            "found": {
                "image_bytes": "iVBORw0KGgo=",
                "doc": {"_id": "x1", "_source": {"query": "utopia", "downloads": ["u"]}}
            }
        }));

        let outcome = render_colorgram(&mut document, &form, &response, FALLBACK);
        assert!(matches!(outcome, Ok(RenderOutcome::Rendered)));
        assert_eq!(
            src_of(&document, "colorgram-a1").as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
        let Some(selector) = document.get_element_by_id("selector-a1") else {
            panic!("scaffold has selector");
        };
        assert!(document.is_hidden(selector));
        let Some(details) = document.get_element_by_id("details-a1") else {
            panic!("scaffold has details");
        };
        assert_eq!(document.children(details).len(), 2);
    }

    #[test]
    fn failure_uses_fallback_regardless_of_shape() {
        for body in [
            json!({"status": 404, "message": "no colorgram for search term"}),
            json!({"status": 500, "found": {"image_bytes": "iVBORw0KGgo="}}),
            json!({"found": 3}),
            json!([1, 2, 3]),
        ] {
            let mut document = page::search_form("a1");
            let form = FormBinding::colorgram("a1");
            let outcome = render_colorgram(&mut document, &form, &reply(&body), FALLBACK);
            assert!(matches!(outcome, Ok(RenderOutcome::ErrorRendered)));
            assert_eq!(src_of(&document, "colorgram-a1").as_deref(), Some(FALLBACK));
            let Some(selector) = document.get_element_by_id("selector-a1") else {
                panic!("scaffold has selector");
            };
            assert!(!document.is_hidden(selector));
        }
    }

    #[test]
    fn missing_image_element_is_an_error() {
        let mut document = Document::new();
        let form = FormBinding::new(Action::Get, ["get"], "colorgram", "zz");
        let response = reply(&json!({"status": 404}));
        assert!(matches!(
            render_colorgram(&mut document, &form, &response, FALLBACK),
            Err(ClientError::MissingElement(id)) if id == "colorgram-zz"
        ));
    }

    #[test]
    fn invalid_base64_is_reported() {
        let mut document = page::search_form("a1");
        let form = FormBinding::colorgram("a1");
        let response = reply(&json!({"status": 200, "found": {"image_bytes": "%%%"}}));
        assert!(matches!(
            render_colorgram(&mut document, &form, &response, FALLBACK),
            Err(ClientError::InvalidImage(_))
        ));
    }
}
