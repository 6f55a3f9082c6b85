//! Document scaffolds satisfying the element contract of each form.
//!
//! Every element of a form instance carries the `-{use_id}` suffix so
//! several instances can share one document.

use crate::dom::{Document, NodeId};

fn labelled_input(document: &mut Document, parent: NodeId, field: &str, use_id: &str) -> NodeId {
    let label = document.append_new(parent, "label");
    document.set_attribute(label, "for", &format!("{field}-{use_id}"));
    document.set_text(label, field);
    let input = document.append_new(parent, "input");
    document.set_id(input, &format!("{field}-{use_id}"));
    document.set_attribute(input, "name", field);
    document.set_attribute(input, "type", "text");
    input
}

fn spinner(document: &mut Document, parent: NodeId, use_id: &str) {
    let loading = document.append_new(parent, "div");
    document.set_id(loading, &format!("loading-{use_id}"));
    document.add_class(loading, "spinner");
    document.hide(loading);
}

/// The colorgram lookup form.
///
/// Contains `selector-{use_id}` (with the `get-` and `experiment-`
/// inputs and the `submit-` button), `loading-`, `colorgram-` and
/// `details-`.
#[must_use]
pub fn search_form(use_id: &str) -> Document {
    let mut document = Document::new();
    append_search_form(&mut document, use_id);
    document
}

/// Appends a colorgram lookup form instance to an existing document.
pub fn append_search_form(document: &mut Document, use_id: &str) {
    let section = document.append_new(document.body(), "section");
    document.add_class(section, "query");

    let selector = document.append_new(section, "form");
    document.set_id(selector, &format!("selector-{use_id}"));
    labelled_input(document, selector, "get", use_id);
    labelled_input(document, selector, "experiment", use_id);
    let submit = document.append_new(selector, "button");
    document.set_id(submit, &format!("submit-{use_id}"));
    document.add_class(submit, "ws-submit");
    document.set_text(submit, "get colorgram");

    spinner(document, section, use_id);

    let img = document.append_new(section, "img");
    document.set_id(img, &format!("colorgram-{use_id}"));
    document.add_class(img, "colorgram");

    let details = document.append_new(section, "div");
    document.set_id(details, &format!("details-{use_id}"));
    document.add_class(details, "details");
    document.hide(details);
}

/// The grid search page: one input per filter field, `loading-`,
/// `gallery-` and a hidden `zoom-` image.
#[must_use]
pub fn gallery_page(use_id: &str, filter_fields: &[&str]) -> Document {
    let mut document = Document::new();
    let section = document.append_new(document.body(), "section");
    document.add_class(section, "search");

    let form = document.append_new(section, "form");
    document.set_id(form, &format!("filters-{use_id}"));
    for field in filter_fields {
        labelled_input(&mut document, form, field, use_id);
    }

    spinner(&mut document, section, use_id);

    let zoom = document.append_new(section, "img");
    document.set_id(zoom, &format!("zoom-{use_id}"));
    document.add_class(zoom, "zoom");
    document.hide(zoom);

    let gallery = document.append_new(section, "div");
    document.set_id(gallery, &format!("gallery-{use_id}"));
    document.add_class(gallery, "gallery");
    document
}

/// The experiment picker: `loading-`, an `experiments-` select and a
/// `raw-` container for failed replies.
#[must_use]
pub fn experiment_picker(use_id: &str) -> Document {
    let mut document = Document::new();
    let body = document.body();
    spinner(&mut document, body, use_id);
    let select = document.append_new(body, "select");
    document.set_id(select, &format!("experiments-{use_id}"));
    let raw = document.append_new(body, "div");
    document.set_id(raw, &format!("raw-{use_id}"));
    document
}

/// Sets the value of each `{field}-{use_id}` input that exists.
///
/// Returns the number of inputs filled.
pub fn fill(document: &mut Document, use_id: &str, values: &[(&str, &str)]) -> usize {
    let mut filled = 0;
    for (field, value) in values {
        if let Some(input) = document.get_element_by_id(&format!("{field}-{use_id}")) {
            document.set_value(input, value);
            filled += 1;
        }
    }
    filled
}
