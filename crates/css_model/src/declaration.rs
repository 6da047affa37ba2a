//! Mutable style declarations and their identity keys.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use css_source::PropertySourceData;

use crate::shorthand::expand_parsed_properties;

static NEXT_DECLARATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one live declaration block.
///
/// Stands in for object identity: maps keyed by declaration survive the
/// declaration being mutated in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeclarationId(u64);

impl DeclarationId {
    fn next() -> Self {
        Self(NEXT_DECLARATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One property entry on a live declaration.
///
/// `implicit` marks values filled in by shorthand expansion rather than
/// written by the author; `shorthand` names the shorthand the entry was
/// expanded from (empty for standalone properties).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleProperty {
    pub name: String,
    pub value: String,
    pub important: bool,
    pub implicit: bool,
    pub shorthand: String,
}

/// Error from [`StyleDeclaration::set_css_text`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleTextError {
    /// The text contains an unmatched closing delimiter that would escape
    /// the enclosing declaration block.
    UnbalancedBlock,
}

impl fmt::Display for StyleTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedBlock => write!(f, "declaration text escapes its block"),
        }
    }
}

impl std::error::Error for StyleTextError {}

/// A live declaration block: an ordered set of properties with last-write
/// semantics per name.
#[derive(Debug)]
pub struct StyleDeclaration {
    id: DeclarationId,
    properties: Vec<StyleProperty>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self {
            id: DeclarationId::next(),
            properties: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> DeclarationId {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Name of the `index`-th property in declaration order.
    pub fn item(&self, index: usize) -> Option<&str> {
        self.properties.get(index).map(|property| property.name.as_str())
    }

    fn find(&self, name: &str) -> Option<&StyleProperty> {
        self.properties
            .iter()
            .find(|property| property.name.eq_ignore_ascii_case(name))
    }

    /// Value of `name`, or the empty string when absent. Shorthands are not
    /// reassembled from longhands here; callers that need a shorthand view
    /// concatenate longhands themselves.
    pub fn get_property_value(&self, name: &str) -> String {
        self.find(name).map(|property| property.value.clone()).unwrap_or_default()
    }

    /// `"important"` when the property carries `!important`, else `""`.
    pub fn get_property_priority(&self, name: &str) -> String {
        match self.find(name) {
            Some(property) if property.important => "important".to_owned(),
            _ => String::new(),
        }
    }

    pub fn is_property_implicit(&self, name: &str) -> bool {
        self.find(name).is_some_and(|property| property.implicit)
    }

    /// The shorthand `name` was expanded from, or `""`.
    pub fn get_property_shorthand(&self, name: &str) -> String {
        self.find(name).map(|property| property.shorthand.clone()).unwrap_or_default()
    }

    /// Replace the whole declaration from text.
    ///
    /// # Errors
    /// Fails without touching the declaration when the text could not be
    /// spliced back into a block (unmatched closing delimiter).
    pub fn set_css_text(&mut self, text: &str) -> Result<(), StyleTextError> {
        if !css_source::declaration_block_is_valid(text) {
            return Err(StyleTextError::UnbalancedBlock);
        }
        let parsed = css_source::parse_declaration_text(text);
        self.replace_with_parsed(&parsed.properties);
        Ok(())
    }

    /// Canonical serialization of the explicit (non-implicit) properties.
    pub fn css_text(&self) -> String {
        let mut out = String::new();
        for property in &self.properties {
            if property.implicit {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&property.name);
            out.push_str(": ");
            out.push_str(&property.value);
            if property.important {
                out.push_str(" !important");
            }
            out.push(';');
        }
        out
    }

    /// Rebuild from parser output, expanding shorthands.
    pub(crate) fn replace_with_parsed(&mut self, parsed: &[PropertySourceData]) {
        self.properties.clear();
        for property in expand_parsed_properties(parsed) {
            self.push_property(property);
        }
    }

    /// Append or overwrite in place: a later declaration of the same name
    /// replaces the earlier one at its original position.
    fn push_property(&mut self, property: StyleProperty) {
        if let Some(existing) = self
            .properties
            .iter_mut()
            .find(|existing| existing.name == property.name)
        {
            *existing = property;
        } else {
            self.properties.push(property);
        }
    }
}

impl Default for StyleDeclaration {
    fn default() -> Self {
        Self::new()
    }
}
