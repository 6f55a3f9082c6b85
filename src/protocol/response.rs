//! Server → client replies.
//!
//! Replies are parsed leniently: only `status` is inspected up front, and
//! the typed payload accessors are meant to be called on success. A non-200
//! reply may have any shape; it is kept as raw JSON so it can be echoed.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Status code the backend uses for success.
pub const STATUS_OK: i64 = 200;

/// A parsed reply frame.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    status: Option<i64>,
    body: Value,
    raw: String,
}

impl QueryResponse {
    /// Parses a reply frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedResponse`] if `text` is not JSON.
    pub fn parse(text: &str) -> Result<Self, ClientError> {
        let body: Value = serde_json::from_str(text)
            .map_err(|e| ClientError::MalformedResponse(format!("invalid JSON: {e}")))?;
        let status = body.get("status").and_then(Value::as_i64);
        Ok(Self {
            status,
            body,
            raw: text.to_string(),
        })
    }

    /// Returns the reply status, if the body carried an integer `status`.
    #[must_use]
    pub const fn status(&self) -> Option<i64> {
        self.status
    }

    /// Returns `true` when `status == 200`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Some(STATUS_OK)
    }

    /// Returns the reply text exactly as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed JSON body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the body's `message`, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Returns the body pretty-printed, for raw dumps of failed replies.
    #[must_use]
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| self.raw.clone())
    }

    /// Decodes the `found` payload of a `get` reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedResponse`] if `found` is absent or
    /// lacks `image_bytes`.
    pub fn found(&self) -> Result<Found, ClientError> {
        self.typed_field("found")
    }

    /// Decodes the `image_urls` payload of a `list_image_urls` reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedResponse`] if `image_urls` is absent
    /// or is not a list of URLs / image records.
    pub fn image_urls(&self) -> Result<Vec<ImageItem>, ClientError> {
        self.typed_field("image_urls")
    }

    /// Decodes the `experiments` payload of a `list_experiments` reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MalformedResponse`] if `experiments` is absent
    /// or is not a list of strings.
    pub fn experiments(&self) -> Result<Vec<String>, ClientError> {
        self.typed_field("experiments")
    }

    /// Returns the body with bulky payloads elided, for log lines.
    ///
    /// `found.image_bytes` is replaced by its length and every
    /// `_source.downloads` list is dropped.
    #[must_use]
    pub fn log_summary(&self) -> Value {
        let mut summary = self.body.clone();
        if let Some(found) = summary.get_mut("found").and_then(Value::as_object_mut) {
            if let Some(bytes) = found.get("image_bytes").and_then(Value::as_str) {
                let elided = format!("<{} base64 chars>", bytes.len());
                found.insert("image_bytes".to_string(), Value::String(elided));
            }
            if let Some(source) = found
                .get_mut("doc")
                .and_then(|doc| doc.get_mut("_source"))
                .and_then(Value::as_object_mut)
            {
                source.remove("downloads");
            }
        }
        summary
    }

    fn typed_field<T: DeserializeOwned>(&self, key: &str) -> Result<T, ClientError> {
        let value = self
            .body
            .get(key)
            .ok_or_else(|| ClientError::MalformedResponse(format!("missing `{key}`")))?;
        T::deserialize(value)
            .map_err(|e| ClientError::MalformedResponse(format!("invalid `{key}`: {e}")))
    }
}

/// Payload of a successful `get` reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Found {
    /// Base64-encoded PNG colorgram.
    pub image_bytes: String,
    /// Search-index record the colorgram was built from. Dropped when it
    /// is not an object.
    #[serde(default, deserialize_with = "lenient_doc")]
    pub doc: Option<Doc>,
}

impl Found {
    /// Decodes the colorgram PNG.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidImage`] if `image_bytes` is not valid
    /// standard base64.
    pub fn decode_png(&self) -> Result<Vec<u8>, ClientError> {
        Ok(STANDARD.decode(self.image_bytes.trim())?)
    }

    /// Returns `data:image/png;base64,<image_bytes>` after checking the
    /// payload decodes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidImage`] if `image_bytes` is not valid
    /// standard base64.
    pub fn data_url(&self) -> Result<String, ClientError> {
        self.decode_png()?;
        Ok(format!("data:image/png;base64,{}", self.image_bytes.trim()))
    }
}

/// A search-index hit describing one result.
///
/// Only display metadata lives here, so ill-typed `_id` / `_source` values
/// are read as absent rather than failing the reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Doc {
    /// Index document id.
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    /// Indexed fields.
    #[serde(rename = "_source", default, deserialize_with = "lenient_source")]
    pub source: Map<String, Value>,
}

fn lenient_doc<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Doc>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(Doc::deserialize(&value).ok())
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => Some(id),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_source<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(source) => source,
        _ => Map::new(),
    })
}

impl Doc {
    /// Returns the scalar `_source` fields as `(name, value)` pairs sorted
    /// by name, excluding `downloads`.
    #[must_use]
    pub fn metadata(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .source
            .iter()
            .filter(|(name, _)| name.as_str() != "downloads")
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Array(items) if items.iter().all(Value::is_string) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                    _ => return None,
                };
                Some((name.clone(), text))
            })
            .collect();
        pairs.sort();
        pairs
    }

    /// Returns the raw-image download URLs listed under
    /// `_source.downloads`.
    ///
    /// Entries may be plain URLs or objects with a `url` field.
    #[must_use]
    pub fn downloads(&self) -> Vec<String> {
        let Some(Value::Array(entries)) = self.source.get("downloads") else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(url) => Some(url.clone()),
                Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }
}

/// One entry of a `list_image_urls` reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageItem {
    /// A bare image URL.
    Url(String),
    /// An image URL with its index record.
    Record {
        /// Image URL.
        #[serde(alias = "image_url")]
        url: String,
        /// Index record for the image.
        #[serde(default, deserialize_with = "lenient_doc")]
        doc: Option<Doc>,
    },
}

impl ImageItem {
    /// Returns the image URL.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Record { url, .. } => url,
        }
    }

    /// Returns the index record, if the server sent one.
    #[must_use]
    pub const fn doc(&self) -> Option<&Doc> {
        match self {
            Self::Url(_) => None,
            Self::Record { doc, .. } => doc.as_ref(),
        }
    }
}
