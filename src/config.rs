//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Command-line flags of the binary
//! override the endpoint-related keys.

use std::time::Duration;

use crate::endpoint::Endpoint;
use crate::error::ClientError;

/// Placeholder shown when a `get` lookup does not return a colorgram.
pub const DEFAULT_FALLBACK_IMAGE_URL: &str =
    "https://www.publicdomainpictures.net/pictures/280000/velka/not-found-image-15383864787lu.jpg";

/// Number of gallery items stacked in one column before wrapping.
pub const DEFAULT_ITEMS_PER_COLUMN: usize = 6;

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hostname the page is served from; selects the endpoint.
    pub hostname: String,

    /// Explicit endpoint overriding the hostname derivation.
    pub endpoint_override: Option<Endpoint>,

    /// Image shown in place of a colorgram on any non-200 `get` reply.
    pub fallback_image_url: String,

    /// Gallery column height.
    pub items_per_column: usize,

    /// Seconds to wait for a reply; `0` waits forever.
    pub response_timeout_secs: u64,

    /// Emit JSON log lines instead of human-readable text.
    pub log_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            endpoint_override: None,
            fallback_image_url: DEFAULT_FALLBACK_IMAGE_URL.to_string(),
            items_per_column: DEFAULT_ITEMS_PER_COLUMN,
            response_timeout_secs: 0,
            log_json: false,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or cannot be
    /// parsed. Calls `dotenvy::dotenv().ok()` to optionally load a `.env`
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `IMGSERVE_ENDPOINT` is not a
    /// WebSocket URL, if `IMGSERVE_ITEMS_PER_COLUMN` is `0`, or if the
    /// hostname is empty.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, which maps a variable name
    /// to its value the way [`std::env::var`] does.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let hostname = lookup("IMGSERVE_HOSTNAME").unwrap_or(defaults.hostname);

        let endpoint_override = match lookup("IMGSERVE_ENDPOINT") {
            Some(url) if !url.trim().is_empty() => Some(
                Endpoint::parse(&url)
                    .map_err(|e| ClientError::Config(format!("IMGSERVE_ENDPOINT: {e}")))?,
            ),
            _ => None,
        };

        let fallback_image_url =
            lookup("IMGSERVE_FALLBACK_IMAGE_URL").unwrap_or(defaults.fallback_image_url);

        let items_per_column = parse_var(
            &lookup,
            "IMGSERVE_ITEMS_PER_COLUMN",
            DEFAULT_ITEMS_PER_COLUMN,
        );
        let response_timeout_secs = parse_var(&lookup, "IMGSERVE_RESPONSE_TIMEOUT_SECS", 0);
        let log_json = parse_var_bool(&lookup, "IMGSERVE_LOG_JSON", false);

        let config = Self {
            hostname,
            endpoint_override,
            fallback_image_url,
            items_per_column,
            response_timeout_secs,
            log_json,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that defaults alone cannot guarantee.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `items_per_column` is `0`, or if
    /// the hostname is blank and no endpoint override is set.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.endpoint_override.is_none() && self.hostname.trim().is_empty() {
            return Err(ClientError::Config(
                "IMGSERVE_HOSTNAME must not be empty".to_string(),
            ));
        }
        if self.items_per_column == 0 {
            return Err(ClientError::Config(
                "IMGSERVE_ITEMS_PER_COLUMN must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the endpoint to connect to: the override if set, otherwise
    /// the one derived from [`Self::hostname`].
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| Endpoint::for_hostname(&self.hostname))
    }

    /// Returns the response timeout, or `None` to wait forever.
    #[must_use]
    pub const fn response_timeout(&self) -> Option<Duration> {
        if self.response_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.response_timeout_secs))
        }
    }
}

/// Parses variable `key` as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses variable `key` as a boolean. Accepts `"true"`, `"1"`, `"false"`,
/// `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_var_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
