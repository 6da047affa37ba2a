//! Live stylesheets: ordered rule lists shared with the style engine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use css_source::{ParsedRule, RuleSourceData};

use crate::declaration::{DeclarationId, StyleDeclaration};
use crate::dom::Element;

/// A non-style rule (`@import`, `@media`, …) kept as opaque text. Such
/// items occupy a slot in the sheet but carry no editable style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtRule {
    pub text: String,
}

/// A style rule: selector list plus a shared declaration block.
#[derive(Debug)]
pub struct StyleRule {
    selector_text: String,
    source_line: u32,
    style: Rc<RefCell<StyleDeclaration>>,
}

impl StyleRule {
    pub fn new(selector_text: &str, source_line: u32) -> Self {
        Self {
            selector_text: selector_text.to_owned(),
            source_line,
            style: Rc::new(RefCell::new(StyleDeclaration::new())),
        }
    }

    #[inline]
    pub fn selector_text(&self) -> &str {
        &self.selector_text
    }

    pub fn set_selector_text(&mut self, selector: &str) {
        self.selector_text = selector.to_owned();
    }

    #[inline]
    pub const fn source_line(&self) -> u32 {
        self.source_line
    }

    /// Shared handle to the rule's declaration block.
    #[inline]
    pub fn style(&self) -> Rc<RefCell<StyleDeclaration>> {
        Rc::clone(&self.style)
    }

    #[inline]
    pub fn style_id(&self) -> DeclarationId {
        self.style.borrow().id()
    }
}

/// One slot in a stylesheet's rule list.
#[derive(Debug)]
pub enum SheetItem {
    Style(StyleRule),
    At(AtRule),
}

impl SheetItem {
    #[inline]
    pub fn as_style(&self) -> Option<&StyleRule> {
        match self {
            Self::Style(rule) => Some(rule),
            Self::At(_) => None,
        }
    }

    #[inline]
    pub fn as_style_mut(&mut self) -> Option<&mut StyleRule> {
        match self {
            Self::Style(rule) => Some(rule),
            Self::At(_) => None,
        }
    }
}

/// Error from [`StyleSheet::add_rule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetError {
    /// The selector was empty or would not parse as a rule prelude.
    InvalidSelector,
    /// The rule body was rejected by the declaration parser.
    InvalidBody,
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSelector => write!(f, "selector rejected"),
            Self::InvalidBody => write!(f, "rule body rejected"),
        }
    }
}

impl std::error::Error for SheetError {}

/// A live stylesheet. Shared between the style engine and the inspector;
/// the inspector is the only writer on this surface.
#[derive(Debug, Default)]
pub struct StyleSheet {
    items: Vec<SheetItem>,
    strict_parsing: bool,
    href: Option<String>,
    final_url: Option<String>,
    title: String,
    disabled: bool,
    owner: Option<Rc<RefCell<Element>>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self {
            strict_parsing: true,
            ..Self::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn item(&self, index: usize) -> Option<&SheetItem> {
        self.items.get(index)
    }

    #[inline]
    pub fn item_mut(&mut self, index: usize) -> Option<&mut SheetItem> {
        self.items.get_mut(index)
    }

    /// The style rule at item position `index`, if that slot holds one.
    pub fn rule_at(&self, index: usize) -> Option<&StyleRule> {
        self.item(index).and_then(SheetItem::as_style)
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    /// Re-parse the sheet from text, replacing every rule.
    pub fn parse_string(&mut self, text: &str, strict: bool) {
        let _ = self.parse_string_collecting(text, strict);
    }

    /// Re-parse the sheet from text and return per-style-rule source data in
    /// rule order. Non-style rules become opaque [`AtRule`] items with no
    /// source data entry.
    pub fn parse_string_collecting(&mut self, text: &str, strict: bool) -> Vec<RuleSourceData> {
        self.strict_parsing = strict;
        self.items.clear();
        let mut collected = Vec::new();
        for parsed in css_source::parse_sheet_text(text) {
            match parsed {
                ParsedRule::Style { selector, source } => {
                    let line = text[..source.selector_range.start as usize]
                        .matches('\n')
                        .count() as u32;
                    let rule = StyleRule::new(&selector, line);
                    rule.style()
                        .borrow_mut()
                        .replace_with_parsed(&source.style.properties);
                    collected.push(source);
                    self.items.push(SheetItem::Style(rule));
                }
                ParsedRule::At { text } => {
                    self.items.push(SheetItem::At(AtRule { text }));
                }
            }
        }
        log::debug!(
            "parse_string: {} items, {} style rules",
            self.items.len(),
            collected.len()
        );
        collected
    }

    /// Append a style rule.
    ///
    /// # Errors
    /// Rejects selectors that are empty or could not head a rule, and
    /// bodies the declaration parser refuses.
    pub fn add_rule(&mut self, selector: &str, body: &str) -> Result<(), SheetError> {
        let selector = selector.trim();
        if selector.is_empty() || selector.contains(['{', '}', ';']) {
            return Err(SheetError::InvalidSelector);
        }
        let rule = StyleRule::new(selector, 0);
        if !body.is_empty() {
            rule.style()
                .borrow_mut()
                .set_css_text(body)
                .map_err(|_| SheetError::InvalidBody)?;
        }
        self.items.push(SheetItem::Style(rule));
        Ok(())
    }

    #[inline]
    pub const fn use_strict_parsing(&self) -> bool {
        self.strict_parsing
    }

    pub fn set_owner(&mut self, owner: Rc<RefCell<Element>>) {
        self.owner = Some(owner);
    }

    pub fn owner_node(&self) -> Option<Rc<RefCell<Element>>> {
        self.owner.clone()
    }

    pub fn set_href(&mut self, href: &str, final_url: &str) {
        self.href = Some(href.to_owned());
        self.final_url = Some(final_url.to_owned());
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn final_url(&self) -> Option<&str> {
        self.final_url.as_deref()
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_owned();
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    #[inline]
    pub const fn disabled(&self) -> bool {
        self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_string_builds_rules_and_lines() {
        let mut sheet = StyleSheet::new();
        sheet.parse_string("a { color: red; }\n.x {\n  margin: 0;\n}", true);
        assert_eq!(sheet.len(), 2);
        let first = sheet.rule_at(0).expect("first style rule");
        assert_eq!(first.selector_text(), "a");
        assert_eq!(first.source_line(), 0);
        assert_eq!(first.style().borrow().get_property_value("color"), "red");
        let second = sheet.rule_at(1).expect("second style rule");
        assert_eq!(second.selector_text(), ".x");
        assert_eq!(second.source_line(), 1);
    }

    #[test]
    fn at_rules_occupy_slots_without_style() {
        let mut sheet = StyleSheet::new();
        sheet.parse_string("@import url(x.css); a { color: red; }", true);
        assert_eq!(sheet.len(), 2);
        assert!(sheet.rule_at(0).is_none());
        assert!(sheet.rule_at(1).is_some());
    }

    #[test]
    fn reparse_replaces_previous_rules() {
        let mut sheet = StyleSheet::new();
        sheet.parse_string("a { color: red; }", true);
        sheet.parse_string("b { color: blue; }", true);
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rule_at(0).unwrap().selector_text(), "b");
    }

    #[test]
    fn collecting_returns_ranges_for_style_rules_only() {
        let mut sheet = StyleSheet::new();
        let ranges = sheet.parse_string_collecting("@import url(x.css); a { color: red; }", true);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].style.properties.len(), 1);
    }

    #[test]
    fn add_rule_validates_selector() {
        let mut sheet = StyleSheet::new();
        assert_eq!(sheet.add_rule("", ""), Err(SheetError::InvalidSelector));
        assert_eq!(sheet.add_rule("a {", ""), Err(SheetError::InvalidSelector));
        assert!(sheet.add_rule(".x", "").is_ok());
        assert_eq!(sheet.len(), 1);
        assert!(sheet.rule_at(0).unwrap().style().borrow().is_empty());
    }
}
