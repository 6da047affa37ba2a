//! Inspector-facing identifiers.

use std::fmt;

/// Opaque id of one rule (or style) within an inspected sheet.
///
/// The ordinal is a decimal index counting only style-bearing rules;
/// non-style rules such as `@import` are skipped. It stays a string at this
/// level — a non-numeric ordinal surfaces when the id is resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InspectorCssId {
    sheet_id: String,
    ordinal: String,
}

impl InspectorCssId {
    pub fn new(sheet_id: &str, ordinal: &str) -> Self {
        Self {
            sheet_id: sheet_id.to_owned(),
            ordinal: ordinal.to_owned(),
        }
    }

    pub fn from_ordinal(sheet_id: &str, ordinal: usize) -> Self {
        Self {
            sheet_id: sheet_id.to_owned(),
            ordinal: ordinal.to_string(),
        }
    }

    #[inline]
    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    #[inline]
    pub fn ordinal(&self) -> &str {
        &self.ordinal
    }

    /// The ordinal as an index, or `None` for a malformed id.
    pub fn ordinal_number(&self) -> Option<usize> {
        self.ordinal.parse().ok()
    }

    pub fn as_string(&self) -> String {
        format!("{}:{}", self.sheet_id, self.ordinal)
    }
}

impl fmt::Display for InspectorCssId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sheet_id, self.ordinal)
    }
}

/// Where a sheet came from. Transported opaquely to the client; also
/// decides whether ids may be handed out for its rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleOrigin {
    UserAgent,
    User,
    Author,
    Inspector,
}

impl StyleOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserAgent => "user-agent",
            Self::User => "user",
            Self::Author => "author",
            Self::Inspector => "inspector",
        }
    }

    /// Only author and inspector sheets hand out rule/style ids; engine
    /// sheets stay read-only.
    pub const fn can_bind(self) -> bool {
        matches!(self, Self::Author | Self::Inspector)
    }
}
