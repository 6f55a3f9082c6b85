//! Binding between a form instance in the document and the request it
//! produces.

use crate::dom::Document;
use crate::error::ClientError;
use crate::protocol::{Action, QueryRequest};

/// Prefix of submit button ids; the rest of the id is the form's `use_id`.
pub const SUBMIT_PREFIX: &str = "submit-";

/// Describes one form instance: which action it triggers, which inputs
/// feed the request, and which element receives the result.
///
/// Every element of the instance is addressed as `{root}-{use_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBinding {
    action: Action,
    values_from: Vec<String>,
    img_target: String,
    use_id: String,
    single_value: Option<bool>,
}

impl FormBinding {
    /// Creates a binding.
    #[must_use]
    pub fn new<I, S>(
        action: Action,
        values_from: I,
        img_target: impl Into<String>,
        use_id: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action,
            values_from: values_from.into_iter().map(Into::into).collect(),
            img_target: img_target.into(),
            use_id: use_id.into(),
            single_value: None,
        }
    }

    /// The colorgram lookup form: `get` with `get`/`experiment` inputs,
    /// rendered into `colorgram-{use_id}`.
    #[must_use]
    pub fn colorgram(use_id: impl Into<String>) -> Self {
        Self::new(Action::Get, ["get", "experiment"], "colorgram", use_id)
    }

    /// The colorgram form owning the submit button `submit-{use_id}`.
    #[must_use]
    pub fn for_submit_button(button_id: &str) -> Self {
        let use_id = button_id.strip_prefix(SUBMIT_PREFIX).unwrap_or(button_id);
        Self::colorgram(use_id)
    }

    /// The grid search form: `list_image_urls` filtered by `filter_fields`,
    /// rendered into `gallery-{use_id}`.
    #[must_use]
    pub fn gallery<I, S>(use_id: impl Into<String>, filter_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Action::ListImageUrls, filter_fields, "gallery", use_id)
    }

    /// The experiment picker: `list_experiments`, rendered into
    /// `experiments-{use_id}`.
    #[must_use]
    pub fn experiments(use_id: impl Into<String>) -> Self {
        Self::new(
            Action::ListExperiments,
            std::iter::empty::<String>(),
            "experiments",
            use_id,
        )
    }

    /// Sends `single_value` with `get` requests.
    #[must_use]
    pub const fn with_single_value(mut self, single_value: bool) -> Self {
        self.single_value = Some(single_value);
        self
    }

    /// Returns the bound action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Returns the names of the inputs that feed the request.
    #[must_use]
    pub fn values_from(&self) -> &[String] {
        &self.values_from
    }

    /// Returns the root name of the result element.
    #[must_use]
    pub fn img_target(&self) -> &str {
        &self.img_target
    }

    /// Returns the suffix shared by the instance's elements.
    #[must_use]
    pub fn use_id(&self) -> &str {
        &self.use_id
    }

    /// Returns `{root}-{use_id}`.
    #[must_use]
    pub fn tag(&self, root: &str) -> String {
        format!("{root}-{}", self.use_id)
    }

    /// Reads the bound inputs and builds a fresh request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingElement`] if a bound input
    /// `{field}-{use_id}` is absent.
    pub fn build_request(&self, document: &Document) -> Result<QueryRequest, ClientError> {
        let mut fields = Vec::with_capacity(self.values_from.len());
        for field in &self.values_from {
            let input = document.tagged(field, &self.use_id)?;
            fields.push((field.clone(), document.value(input).to_string()));
        }
        let request = QueryRequest::from_fields(self.action, fields);
        Ok(match (self.action, self.single_value) {
            (Action::Get, Some(single_value)) => request.with_single_value(single_value),
            _ => request,
        })
    }
}
