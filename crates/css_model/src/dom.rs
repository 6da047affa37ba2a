//! Minimal DOM surface for style editing: styled elements owning an inline
//! declaration, and `<style>` owner nodes exposing their text content.

use std::cell::RefCell;
use std::rc::Rc;

use crate::declaration::{StyleDeclaration, StyleTextError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
}

/// An element with attributes, an inline style declaration kept in sync
/// with its `style` attribute, and text content (the stylesheet source for
/// `<style>` elements).
#[derive(Debug)]
pub struct Element {
    tag_name: String,
    attributes: Vec<(String, String)>,
    inline_style: Rc<RefCell<StyleDeclaration>>,
    text_content: String,
}

impl Element {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_owned(),
            attributes: Vec::new(),
            inline_style: Rc::new(RefCell::new(StyleDeclaration::new())),
            text_content: String::new(),
        }
    }

    #[inline]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    #[inline]
    pub const fn node_type(&self) -> NodeType {
        NodeType::Element
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attribute, _)| attribute.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute. Writing `style` re-parses the inline declaration in
    /// place; a rejected value leaves both attribute and declaration
    /// untouched.
    ///
    /// # Errors
    /// Propagates the inline declaration's parse rejection.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), StyleTextError> {
        if name.eq_ignore_ascii_case("style") {
            self.inline_style.borrow_mut().set_css_text(value)?;
        }
        if let Some(entry) = self
            .attributes
            .iter_mut()
            .find(|(attribute, _)| attribute.eq_ignore_ascii_case(name))
        {
            entry.1 = value.to_owned();
        } else {
            self.attributes.push((name.to_ascii_lowercase(), value.to_owned()));
        }
        Ok(())
    }

    /// Shared handle to the element's inline declaration.
    #[inline]
    pub fn style(&self) -> Rc<RefCell<StyleDeclaration>> {
        Rc::clone(&self.inline_style)
    }

    #[inline]
    pub fn inner_text(&self) -> &str {
        &self.text_content
    }

    pub fn set_inner_text(&mut self, text: &str) {
        self.text_content = text.to_owned();
    }
}
