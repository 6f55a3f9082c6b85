//! Short random identifiers for rendered results.
//!
//! [`ResultId`] keys the subtree of one gallery item (`result-{id}`,
//! `details-{id}`, ...). It has no relation to any server-side identifier.

use std::fmt;

/// Length of a generated result identifier.
pub const RESULT_ID_LEN: usize = 5;

/// Random 5-character lowercase hex identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultId(String);

impl ResultId {
    /// Generates a new random identifier from a UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(simple.chars().take(RESULT_ID_LEN).collect())
    }

    /// Generates identifiers until `is_free` accepts one.
    #[must_use]
    pub fn generate_unique(mut is_free: impl FnMut(&Self) -> bool) -> Self {
        loop {
            let candidate = Self::generate();
            if is_free(&candidate) {
                return candidate;
            }
        }
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `{root}-{id}`, the element id of a part of this result.
    #[must_use]
    pub fn tag(&self, root: &str) -> String {
        format!("{root}-{}", self.0)
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
