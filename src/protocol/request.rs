//! Client → server query requests.

use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Backend action named by the `action` field of every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Single colorgram lookup for one query term in one experiment.
    Get,
    /// Grid search over stored images, narrowed by filter terms.
    ListImageUrls,
    /// Names of all experiments known to the backend.
    ListExperiments,
}

impl Action {
    /// Returns the wire name of this action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::ListImageUrls => "list_image_urls",
            Self::ListExperiments => "list_experiments",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "get" => Ok(Self::Get),
            "list_image_urls" => Ok(Self::ListImageUrls),
            "list_experiments" => Ok(Self::ListExperiments),
            other => Err(ClientError::Config(format!("unknown action: {other}"))),
        }
    }
}

/// One `{"term": {field: value}}` clause of a `list_image_urls` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    /// Indexed field name.
    pub field: String,
    /// Exact value the field must hold.
    pub value: String,
}

impl Serialize for FilterTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut inner = serde_json::Map::with_capacity(1);
        inner.insert(
            self.field.clone(),
            serde_json::Value::String(self.value.clone()),
        );
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("term", &inner)?;
        map.end()
    }
}

/// A single query sent over a fresh socket.
///
/// Serializes as a flat JSON object with `action` first, followed by the
/// form fields in the order they were added. Built fresh per submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    action: Action,
    fields: Vec<(String, String)>,
    single_value: Option<bool>,
    filter: Vec<FilterTerm>,
}

impl QueryRequest {
    /// Creates an empty request for `action`.
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            fields: Vec::new(),
            single_value: None,
            filter: Vec::new(),
        }
    }

    /// Builds a request from `(field, raw value)` pairs read off a form.
    ///
    /// Values are trimmed. For [`Action::Get`] the pairs become top-level
    /// fields; for [`Action::ListImageUrls`] each non-empty pair becomes a
    /// filter term; [`Action::ListExperiments`] carries no fields.
    #[must_use]
    pub fn from_fields<I, K, V>(action: Action, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut request = Self::new(action);
        for (name, value) in fields {
            request = match action {
                Action::Get => request.with_field(name, value.as_ref()),
                Action::ListImageUrls => request.with_filter_term(name, value.as_ref()),
                Action::ListExperiments => request,
            };
        }
        request
    }

    /// Sets a top-level field, trimming the value. Re-setting a field keeps
    /// its original position.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: &str) -> Self {
        let name = name.into();
        let value = value.trim().to_string();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
        self
    }

    /// Sets the `single_value` flag of a `get` request.
    #[must_use]
    pub const fn with_single_value(mut self, single_value: bool) -> Self {
        self.single_value = Some(single_value);
        self
    }

    /// Appends a filter term. Empty values are skipped.
    #[must_use]
    pub fn with_filter_term(mut self, field: impl Into<String>, value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() {
            self.filter.push(FilterTerm {
                field: field.into(),
                value: value.to_string(),
            });
        }
        self
    }

    /// Returns the request action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Returns the value of a top-level field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the filter terms in insertion order.
    #[must_use]
    pub fn filter(&self) -> &[FilterTerm] {
        &self.filter
    }

    /// Encodes the request as JSON text for a single WebSocket frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Serialize`] if encoding fails.
    pub fn to_json(&self) -> Result<String, ClientError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for QueryRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("action", &self.action)?;
        for (name, value) in &self.fields {
            if name == "action" {
                continue;
            }
            map.serialize_entry(name, value)?;
        }
        if let Some(single_value) = self.single_value {
            map.serialize_entry("single_value", &single_value)?;
        }
        if self.action == Action::ListImageUrls {
            map.serialize_entry("filter", &self.filter)?;
        }
        map.end()
    }
}
