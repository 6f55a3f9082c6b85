//! `list_image_urls` replies: a paginated column layout of results.
//!
//! Each result is rendered as
//!
//! ```text
//! div.result#result-{rid}            hover → show/hide details-{rid}
//!   img.result-image#image-{rid}     click → focus zoom-{use_id}
//!   div.details#details-{rid}        hidden
//!   button#downloads-toggle-{rid}    click → toggle downloads-{rid}
//!   ul.downloads#downloads-{rid}     hidden
//! ```
//!
//! where `rid` is a fresh [`ResultId`].

use std::collections::HashSet;

use super::{RenderOutcome, dump_raw, fill_details};
use crate::client::FormBinding;
use crate::dom::{Document, EventKind, Listener, NodeId, ResultId, UiAction};
use crate::error::ClientError;
use crate::protocol::{ImageItem, QueryResponse};

/// Number of columns needed for `items` results at `per_column` per
/// column. A column height of `0` is treated as `1`.
#[must_use]
pub const fn column_count(items: usize, per_column: usize) -> usize {
    let per_column = if per_column == 0 { 1 } else { per_column };
    items.div_ceil(per_column)
}

/// Drops items whose URL was already seen, keeping first occurrences in
/// order.
#[must_use]
pub fn dedup_items(items: Vec<ImageItem>) -> Vec<ImageItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.url().to_string()))
        .collect()
}

/// Renders a `list_image_urls` reply into the gallery
/// `{img_target}-{use_id}`, replacing whatever it held before.
///
/// # Errors
///
/// Returns [`ClientError::MissingElement`] if the gallery is absent and
/// [`ClientError::MalformedResponse`] if a 200 reply has no usable
/// `image_urls`.
pub fn render_gallery(
    document: &mut Document,
    form: &FormBinding,
    response: &QueryResponse,
    per_column: usize,
) -> Result<RenderOutcome, ClientError> {
    let gallery = document.tagged(form.img_target(), form.use_id())?;

    if !response.is_success() {
        document.clear_children(gallery);
        dump_raw(document, gallery, response);
        return Ok(RenderOutcome::ErrorRendered);
    }

    let received = response.image_urls()?;
    let total = received.len();
    let items = dedup_items(received);
    document.clear_children(gallery);

    let zoom = form.tag("zoom");
    for (index, chunk) in items.chunks(per_column.max(1)).enumerate() {
        let column = document.append_new(gallery, "div");
        document.add_class(column, "column");
        document.set_attribute(column, "data-column", &index.to_string());
        for item in chunk {
            render_item(document, column, item, &zoom);
        }
    }

    tracing::info!(
        use_id = form.use_id(),
        received = total,
        rendered = items.len(),
        columns = column_count(items.len(), per_column),
        "gallery rendered"
    );
    Ok(RenderOutcome::Rendered)
}

fn render_item(document: &mut Document, column: NodeId, item: &ImageItem, zoom: &str) {
    let rid = ResultId::generate_unique(|candidate| {
        document.get_element_by_id(&candidate.tag("result")).is_none()
    });
    let details_id = rid.tag("details");
    let downloads_id = rid.tag("downloads");

    let wrapper = document.append_new(column, "div");
    document.set_id(wrapper, &rid.tag("result"));
    document.add_class(wrapper, "result");
    document.add_listener(
        wrapper,
        Listener::new(
            EventKind::MouseEnter,
            UiAction::Show {
                target: details_id.clone(),
            },
        ),
    );
    document.add_listener(
        wrapper,
        Listener::new(
            EventKind::MouseLeave,
            UiAction::Hide {
                target: details_id.clone(),
            },
        ),
    );

    let img = document.append_new(wrapper, "img");
    document.set_id(img, &rid.tag("image"));
    document.add_class(img, "result-image");
    document.set_attribute(img, "src", item.url());
    document.set_attribute(img, "loading", "lazy");
    document.add_listener(
        img,
        Listener::new(
            EventKind::Click,
            UiAction::Focus {
                target: zoom.to_string(),
                src: item.url().to_string(),
            },
        ),
    );

    let details = document.append_new(wrapper, "div");
    document.set_id(details, &details_id);
    document.add_class(details, "details");
    if let Some(doc) = item.doc() {
        fill_details(document, details, doc);
    }
    document.hide(details);

    let downloads: Vec<String> = item.doc().map(|d| d.downloads()).unwrap_or_default();
    if !downloads.is_empty() {
        let toggle = document.append_new(wrapper, "button");
        document.set_id(toggle, &rid.tag("downloads-toggle"));
        document.add_class(toggle, "downloads-toggle");
        document.set_text(toggle, &format!("raw images ({})", downloads.len()));
        document.add_listener(
            toggle,
            Listener::new(
                EventKind::Click,
                UiAction::Toggle {
                    target: downloads_id.clone(),
                },
            ),
        );

        let list = document.append_new(wrapper, "ul");
        document.set_id(list, &downloads_id);
        document.add_class(list, "downloads");
        for url in &downloads {
            let entry = document.append_new(list, "li");
            let link = document.append_new(entry, "a");
            document.set_attribute(link, "href", url);
            document.set_text(link, url);
        }
        document.hide(list);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::page;
    use serde_json::{Value, json};

    fn reply(value: &Value) -> QueryResponse {
        let Ok(response) = QueryResponse::parse(&value.to_string()) else {
            panic!("reply should parse");
        };
        response
    }

    fn urls(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!(format!("https://img.example/{i}.png")))
            .collect()
    }

    fn gallery_of(document: &Document) -> NodeId {
        let Some(gallery) = document.get_element_by_id("gallery-g1") else {
            panic!("scaffold has gallery");
        };
        gallery
    }

    fn count_images(document: &Document, gallery: NodeId) -> usize {
        document
            .children(gallery)
            .iter()
            .map(|column| document.children(*column).len())
            .sum()
    }

    #[test]
    fn column_count_wraps_every_six() {
        assert_eq!(column_count(0, 6), 0);
        assert_eq!(column_count(1, 6), 1);
        assert_eq!(column_count(6, 6), 1);
        assert_eq!(column_count(7, 6), 2);
        assert_eq!(column_count(13, 6), 3);
        assert_eq!(column_count(3, 0), 3);
    }

    #[test]
    fn columns_match_item_count() {
        for n in [0, 1, 5, 6, 7, 12, 13, 20] {
            let mut document = page::gallery_page("g1", &["query"]);
            let form = FormBinding::gallery("g1", ["query"]);
            let response = reply(&json!({"status": 200, "image_urls": urls(n)}));
            let outcome = render_gallery(&mut document, &form, &response, 6);
            assert!(matches!(outcome, Ok(RenderOutcome::Rendered)));
            let gallery = gallery_of(&document);
            assert_eq!(document.children(gallery).len(), column_count(n, 6));
            assert_eq!(count_images(&document, gallery), n);
        }
    }

    #[test]
    fn duplicate_urls_render_once() {
        let mut document = page::gallery_page("g1", &["query"]);
        let form = FormBinding::gallery("g1", ["query"]);
        let response = reply(&json!({
            "status": 200,
            "image_urls": [
                "https://img.example/a.png",
                "https://img.example/b.png",
                {"url": "https://img.example/a.png"},
                "https://img.example/b.png",
            ]
        }));
        assert!(render_gallery(&mut document, &form, &response, 6).is_ok());
        let gallery = gallery_of(&document);
        assert_eq!(count_images(&document, gallery), 2);
    }

    #[test]
    fn rerender_replaces_previous_results() {
        let mut document = page::gallery_page("g1", &["query"]);
        let form = FormBinding::gallery("g1", ["query"]);
        let first = reply(&json!({"status": 200, "image_urls": urls(9)}));
        let second = reply(&json!({"status": 200, "image_urls": urls(2)}));
        assert!(render_gallery(&mut document, &form, &first, 6).is_ok());
        assert!(render_gallery(&mut document, &form, &second, 6).is_ok());
        let gallery = gallery_of(&document);
        assert_eq!(document.children(gallery).len(), 1);
        assert_eq!(count_images(&document, gallery), 2);
    }

    #[test]
    fn failure_dumps_raw_body() {
        let mut document = page::gallery_page("g1", &["query"]);
        let form = FormBinding::gallery("g1", ["query"]);
        let response = reply(&json!({"status": 404, "message": "no action found for list_image_urls"}));
        let outcome = render_gallery(&mut document, &form, &response, 6);
        assert!(matches!(outcome, Ok(RenderOutcome::ErrorRendered)));
        let gallery = gallery_of(&document);
        let Some(pre) = document.children(gallery).first().copied() else {
            panic!("raw dump expected");
        };
        assert!(document.has_class(pre, "raw-response"));
        assert!(
            document
                .text(pre)
                .is_some_and(|t| t.contains("no action found"))
        );
    }

    #[test]
    fn listeners_reveal_details_zoom_and_downloads() {
        let mut document = page::gallery_page("g1", &["query"]);
        let form = FormBinding::gallery("g1", ["query"]);
        let response = reply(&json!({
            "status": 200,
            "image_urls": [{
                "url": "https://img.example/a.png",
                "doc": {"_source": {
                    "query": "utopia",
                    "downloads": ["https://raw.example/1.jpg", "https://raw.example/2.jpg"]
                }}
            }]
        }));
        assert!(render_gallery(&mut document, &form, &response, 6).is_ok());

        let gallery = gallery_of(&document);
        let Some(column) = document.children(gallery).first().copied() else {
            panic!("one column");
        };
        let Some(wrapper) = document.children(column).first().copied() else {
            panic!("one result");
        };
        let Some(rid) = document
            .node(wrapper)
            .and_then(|n| n.id())
            .and_then(|id| id.strip_prefix("result-"))
            .map(str::to_string)
        else {
            panic!("result id");
        };
        assert_eq!(rid.len(), 5);

        let Ok(details) = document.require(&format!("details-{rid}")) else {
            panic!("details node");
        };
        assert!(document.is_hidden(details));
        assert!(matches!(document.dispatch(wrapper, EventKind::MouseEnter), Ok(1)));
        assert!(!document.is_hidden(details));
        assert!(matches!(document.dispatch(wrapper, EventKind::MouseLeave), Ok(1)));
        assert!(document.is_hidden(details));

        let Ok(image) = document.require(&format!("image-{rid}")) else {
            panic!("image node");
        };
        assert!(matches!(document.dispatch(image, EventKind::Click), Ok(1)));
        let Ok(zoom) = document.require("zoom-g1") else {
            panic!("zoom node");
        };
        assert_eq!(document.attribute(zoom, "src"), Some("https://img.example/a.png"));
        assert!(!document.is_hidden(zoom));

        let Ok(toggle) = document.require(&format!("downloads-toggle-{rid}")) else {
            panic!("toggle node");
        };
        let Ok(downloads) = document.require(&format!("downloads-{rid}")) else {
            panic!("downloads node");
        };
        assert_eq!(document.children(downloads).len(), 2);
        assert!(document.is_hidden(downloads));
        assert!(document.dispatch(toggle, EventKind::Click).is_ok());
        assert!(!document.is_hidden(downloads));
        assert!(document.dispatch(toggle, EventKind::Click).is_ok());
        assert!(document.is_hidden(downloads));
    }
}
