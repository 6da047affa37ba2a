//! Inline-style specialization: the "sheet" is one element's `style`
//! attribute, holding exactly one rule at ordinal `0`.

use std::cell::RefCell;
use std::rc::Rc;

use css_model::{DeclarationId, Element};
use css_source::{RuleSourceData, SourceRange, StyleSourceData};
use log::warn;
use serde_json::{Value, json};

use crate::id::{InspectorCssId, StyleOrigin};
use crate::style::{InspectorStyle, InspectorStyleProperty, SheetBacking};

/// Editable view of one element's inline style.
///
/// Inline blocks are small and the ordinal is fixed, so the single
/// [`InspectorStyle`] is owned for the sheet's lifetime rather than cached
/// by disabled state.
pub struct InlineStyleSheet {
    id: String,
    element: Rc<RefCell<Element>>,
    origin: StyleOrigin,
    inspector_style: Option<InspectorStyle>,
    rule_source_data: Option<RuleSourceData>,
}

impl InlineStyleSheet {
    pub fn new(id: &str, element: Rc<RefCell<Element>>, origin: StyleOrigin) -> Self {
        let style = element.borrow().style();
        let inspector_style =
            InspectorStyle::new(Some(InspectorCssId::new(id, "0")), style);
        Self {
            id: id.to_owned(),
            element,
            origin,
            inspector_style: Some(inspector_style),
            rule_source_data: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub const fn origin(&self) -> StyleOrigin {
        self.origin
    }

    pub fn element(&self) -> Rc<RefCell<Element>> {
        Rc::clone(&self.element)
    }

    fn inline_style_id(&self) -> DeclarationId {
        self.element.borrow().style().borrow().id()
    }

    fn attribute_text(&self) -> String {
        self.element
            .borrow()
            .get_attribute("style")
            .unwrap_or("")
            .to_owned()
    }

    fn with_style<T>(
        &mut self,
        edit: impl FnOnce(&mut InspectorStyle, &mut dyn SheetBacking) -> T,
    ) -> T {
        let mut style = match self.inspector_style.take() {
            Some(style) => style,
            None => {
                let declaration = self.element.borrow().style();
                InspectorStyle::new(Some(InspectorCssId::new(&self.id, "0")), declaration)
            }
        };
        let result = edit(&mut style, self);
        self.inspector_style = Some(style);
        result
    }

    /// Insert or overwrite a property in the inline block, by flat index.
    pub fn set_property_text(&mut self, index: usize, text: &str, overwrite: bool) -> bool {
        self.with_style(|style, sheet| style.set_property_text(sheet, index, text, overwrite))
    }

    /// Disable or enable a property in the inline block.
    pub fn toggle_property(&mut self, index: usize, disable: bool) -> bool {
        self.with_style(|style, sheet| style.toggle_property(sheet, index, disable))
    }

    /// The inspectable view of the inline block, with the attribute text as
    /// `cssText`.
    pub fn build_object_for_style(&mut self) -> Value {
        let mut value = self.with_style(|style, sheet| style.build_object_for_style(sheet));
        let css_text = self.attribute_text();
        if let Value::Object(map) = &mut value {
            map.insert("cssText".to_owned(), json!(css_text));
        }
        value
    }

    /// Flattened property listing of the inline block.
    pub fn all_properties(&mut self) -> Vec<InspectorStyleProperty> {
        self.with_style(|style, sheet| style.populate_all_properties(sheet))
    }
}

impl SheetBacking for InlineStyleSheet {
    fn ensure_parsed_data_ready(&mut self) -> bool {
        if self.rule_source_data.is_some() {
            return true;
        }
        let attribute = self.attribute_text();
        let style = if attribute.is_empty() {
            // An absent attribute is a valid, empty zero-width body.
            StyleSourceData {
                body_range: SourceRange::new(0, 0),
                properties: Vec::new(),
            }
        } else {
            css_source::parse_declaration_text(&attribute)
        };
        self.rule_source_data = Some(RuleSourceData {
            selector_range: SourceRange::new(0, 0),
            style,
        });
        true
    }

    fn sheet_text(&mut self) -> Option<String> {
        Some(self.attribute_text())
    }

    fn rule_source_data_for(&mut self, style: DeclarationId) -> Option<RuleSourceData> {
        if style != self.inline_style_id() {
            return None;
        }
        if !self.ensure_parsed_data_ready() {
            return None;
        }
        self.rule_source_data.clone()
    }

    fn commit_style_text(&mut self, style: DeclarationId, text: &str) -> bool {
        if style != self.inline_style_id() {
            return false;
        }
        self.rule_source_data = None;
        match self.element.borrow_mut().set_attribute("style", text) {
            Ok(()) => true,
            Err(error) => {
                warn!("inline style commit rejected: {error}");
                false
            }
        }
    }
}
