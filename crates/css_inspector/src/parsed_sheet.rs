//! The authoring-text mirror of one live sheet.

use css_source::RuleSourceData;

/// Stores the current authoring text plus, lazily, per-rule source data
/// derived from it. Any text assignment drops the source data; it is
/// regenerated by re-parsing on demand.
#[derive(Debug, Default)]
pub struct ParsedSheet {
    text: String,
    has_text: bool,
    source_data: Option<Vec<RuleSourceData>>,
}

impl ParsedSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the text and invalidate previously derived source data.
    pub fn set_text(&mut self, text: &str) {
        self.has_text = true;
        self.text.clear();
        self.text.push_str(text);
        self.source_data = None;
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub const fn has_text(&self) -> bool {
        self.has_text
    }

    pub fn set_source_data(&mut self, source_data: Vec<RuleSourceData>) {
        self.source_data = Some(source_data);
    }

    #[inline]
    pub const fn has_source_data(&self) -> bool {
        self.source_data.is_some()
    }

    /// Source data of the `index`-th style-bearing rule, if derived.
    pub fn rule_source_data_at(&self, index: usize) -> Option<&RuleSourceData> {
        self.source_data.as_ref()?.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_source::{SourceRange, StyleSourceData};

    fn dummy_rule() -> RuleSourceData {
        RuleSourceData {
            selector_range: SourceRange::new(0, 1),
            style: StyleSourceData::default(),
        }
    }

    #[test]
    fn set_text_drops_source_data() {
        let mut parsed = ParsedSheet::new();
        assert!(!parsed.has_text());
        parsed.set_text("a { }");
        parsed.set_source_data(vec![dummy_rule()]);
        assert!(parsed.has_source_data());
        assert!(parsed.rule_source_data_at(0).is_some());

        parsed.set_text("b { }");
        assert!(parsed.has_text());
        assert!(!parsed.has_source_data());
        assert!(parsed.rule_source_data_at(0).is_none());
    }

    #[test]
    fn out_of_range_lookup_is_none() {
        let mut parsed = ParsedSheet::new();
        parsed.set_text("a { }");
        parsed.set_source_data(vec![dummy_rule()]);
        assert!(parsed.rule_source_data_at(1).is_none());
    }
}
