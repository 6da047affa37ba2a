//! Rule-level edits for one inspected stylesheet.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use css_model::{DeclarationId, NodeType, SheetItem, StyleDeclaration, StyleRule, StyleSheet};
use css_source::RuleSourceData;
use log::{debug, warn};
use serde_json::{Map, Value, json};

use crate::id::{InspectorCssId, StyleOrigin};
use crate::parsed_sheet::ParsedSheet;
use crate::style::{InspectorStyle, InspectorStyleProperty, SheetBacking};

/// Supplies the original text of externally-linked sheets.
pub trait ResourceLoader {
    fn resource_content(&self, url: &str) -> Option<String>;
}

/// Mediates between one live sheet and its authoring-text mirror.
///
/// Owns the [`ParsedSheet`] exclusively, and retains an [`InspectorStyle`]
/// per live declaration exactly while that declaration has disabled
/// properties.
pub struct InspectorStyleSheet {
    id: String,
    page_sheet: Rc<RefCell<StyleSheet>>,
    origin: StyleOrigin,
    document_url: String,
    parsed: ParsedSheet,
    styles_with_disabled: HashMap<DeclarationId, InspectorStyle>,
    resources: Option<Rc<dyn ResourceLoader>>,
    revalidating: bool,
}

fn nth_style_rule(sheet: &StyleSheet, ordinal: usize) -> Option<&StyleRule> {
    let mut current = 0usize;
    for index in 0..sheet.len() {
        if let Some(SheetItem::Style(rule)) = sheet.item(index) {
            if current == ordinal {
                return Some(rule);
            }
            current += 1;
        }
    }
    None
}

fn style_rule_count(sheet: &StyleSheet) -> usize {
    (0..sheet.len())
        .filter(|&index| matches!(sheet.item(index), Some(SheetItem::Style(_))))
        .count()
}

impl InspectorStyleSheet {
    pub fn new(
        id: &str,
        page_sheet: Rc<RefCell<StyleSheet>>,
        origin: StyleOrigin,
        document_url: &str,
    ) -> Self {
        Self {
            id: id.to_owned(),
            page_sheet,
            origin,
            document_url: document_url.to_owned(),
            parsed: ParsedSheet::new(),
            styles_with_disabled: HashMap::new(),
            resources: None,
            revalidating: false,
        }
    }

    pub fn set_resource_loader(&mut self, loader: Rc<dyn ResourceLoader>) {
        self.resources = Some(loader);
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub const fn origin(&self) -> StyleOrigin {
        self.origin
    }

    pub fn page_sheet(&self) -> Rc<RefCell<StyleSheet>> {
        Rc::clone(&self.page_sheet)
    }

    /// Replace the whole sheet: store the text, drop derived data and every
    /// cached style, and re-parse into the live sheet.
    pub fn set_text(&mut self, text: &str) -> bool {
        self.parsed.set_text(text);
        self.styles_with_disabled.clear();
        let mut sheet = self.page_sheet.borrow_mut();
        sheet.clear_items();
        let strict = sheet.use_strict_parsing();
        sheet.parse_string(text, strict);
        debug!("set_text: reparsed into {} items", sheet.len());
        true
    }

    /// Retarget a rule's selector: live rule first, then the selector bytes
    /// in the stored text. Source data regenerates on next use.
    pub fn set_rule_selector(&mut self, id: &InspectorCssId, selector: &str) -> bool {
        let Some(ordinal) = id.ordinal_number() else {
            warn!("set_rule_selector: malformed ordinal {:?}", id.ordinal());
            return false;
        };
        if !self.ensure_parsed_data_ready() {
            return false;
        }
        {
            let mut sheet = self.page_sheet.borrow_mut();
            let mut current = 0usize;
            let mut updated = false;
            for index in 0..sheet.len() {
                let Some(item) = sheet.item_mut(index) else {
                    continue;
                };
                let Some(rule) = item.as_style_mut() else {
                    continue;
                };
                if current == ordinal {
                    rule.set_selector_text(selector);
                    updated = true;
                    break;
                }
                current += 1;
            }
            if !updated {
                return false;
            }
        }
        let Some(range) = self
            .parsed
            .rule_source_data_at(ordinal)
            .map(|data| data.selector_range)
        else {
            return false;
        };
        let mut text = self.parsed.text().to_owned();
        let (start, end) = (range.start as usize, range.end as usize);
        if start > end || end > text.len() {
            warn!("set_rule_selector: selector range {range:?} outside text");
            return false;
        }
        text.replace_range(start..end, selector);
        self.parsed.set_text(&text);
        true
    }

    /// Append `selector {}` to both the live sheet and the stored text,
    /// returning the new rule's id.
    pub fn add_rule(&mut self, selector: &str) -> Option<InspectorCssId> {
        let mut text = self.text()?;
        {
            let mut sheet = self.page_sheet.borrow_mut();
            if let Err(error) = sheet.add_rule(selector, "") {
                warn!("add_rule: selector {selector:?} rejected: {error}");
                return None;
            }
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(selector);
        text.push_str(" {}");
        self.parsed.set_text(&text);

        let sheet = self.page_sheet.borrow();
        let count = style_rule_count(&sheet);
        Some(InspectorCssId::from_ordinal(&self.id, count.checked_sub(1)?))
    }

    /// Forward a property edit to the rule's style editor.
    pub fn set_property_text(
        &mut self,
        id: &InspectorCssId,
        property_index: usize,
        text: &str,
        overwrite: bool,
    ) -> bool {
        self.with_inspector_style(id, |style, sheet| {
            style.set_property_text(sheet, property_index, text, overwrite)
        })
    }

    /// Forward a disable/enable toggle to the rule's style editor.
    pub fn toggle_property(&mut self, id: &InspectorCssId, property_index: usize, disable: bool) -> bool {
        self.with_inspector_style(id, |style, sheet| {
            style.toggle_property(sheet, property_index, disable)
        })
    }

    /// Flattened property listing (source, disabled, and live-only
    /// entries) of the rule's style.
    pub fn all_properties(&mut self, id: &InspectorCssId) -> Option<Vec<InspectorStyleProperty>> {
        let declaration = self.style_for_id(id)?;
        let declaration_id = declaration.borrow().id();
        let inspector_style = self
            .styles_with_disabled
            .remove(&declaration_id)
            .unwrap_or_else(|| InspectorStyle::new(Some(id.clone()), declaration));
        let all = inspector_style.populate_all_properties(self);
        if inspector_style.has_disabled_properties() {
            self.styles_with_disabled.insert(declaration_id, inspector_style);
        }
        Some(all)
    }

    /// Declaration handle for a rule id, resolving the ordinal over
    /// style-bearing rules only.
    pub fn style_for_id(&self, id: &InspectorCssId) -> Option<Rc<RefCell<StyleDeclaration>>> {
        if id.sheet_id() != self.id {
            return None;
        }
        let ordinal = id.ordinal_number()?;
        let sheet = self.page_sheet.borrow();
        nth_style_rule(&sheet, ordinal).map(StyleRule::style)
    }

    /// Ordinal of the rule owning `style` among style-bearing rules.
    pub fn rule_index_by_style(&self, style: DeclarationId) -> Option<usize> {
        let sheet = self.page_sheet.borrow();
        let mut index = 0usize;
        for item_index in 0..sheet.len() {
            if let Some(SheetItem::Style(rule)) = sheet.item(item_index) {
                if rule.style_id() == style {
                    return Some(index);
                }
                index += 1;
            }
        }
        None
    }

    pub fn rule_or_style_id(&self, style: DeclarationId) -> Option<InspectorCssId> {
        self.rule_index_by_style(style)
            .map(|index| InspectorCssId::from_ordinal(&self.id, index))
    }

    fn declaration_for(&self, style: DeclarationId) -> Option<Rc<RefCell<StyleDeclaration>>> {
        let sheet = self.page_sheet.borrow();
        for index in 0..sheet.len() {
            if let Some(SheetItem::Style(rule)) = sheet.item(index)
                && rule.style_id() == style
            {
                return Some(rule.style());
            }
        }
        None
    }

    /// Splice a new declaration body into the rule owning `style`. The live
    /// declaration is updated first; the stored text is patched only when
    /// the live side accepts the new body.
    pub fn set_style_text(&mut self, style: DeclarationId, body_text: &str) -> bool {
        if !self.ensure_parsed_data_ready() {
            return false;
        }
        let Some(rule_index) = self.rule_index_by_style(style) else {
            return false;
        };
        let Some(body) = self
            .parsed
            .rule_source_data_at(rule_index)
            .map(|data| data.style.body_range)
        else {
            return false;
        };
        let text = self.parsed.text();
        let (start, end) = (body.start as usize, body.end as usize);
        if start > end || end > text.len() {
            warn!("set_style_text: body range {body:?} outside text");
            return false;
        }
        let mut patched = text.to_owned();
        patched.replace_range(start..end, body_text);

        let Some(declaration) = self.declaration_for(style) else {
            return false;
        };
        if let Err(error) = declaration.borrow_mut().set_css_text(body_text) {
            warn!("set_style_text: live declaration rejected body: {error}");
            return false;
        }
        self.parsed.set_text(&patched);
        debug!("set_style_text: rule {rule_index} body now {} bytes", body_text.len());
        true
    }

    /// Recover when the page mutated a style behind the inspector's back:
    /// on drift, drop the cached editor state and commit the live text.
    pub fn revalidate_style(&mut self, style: DeclarationId) {
        if self.revalidating {
            return;
        }
        self.revalidating = true;
        self.revalidate_inner(style);
        self.revalidating = false;
    }

    fn revalidate_inner(&mut self, style: DeclarationId) {
        if !self.ensure_parsed_data_ready() {
            return;
        }
        let Some(rule_index) = self.rule_index_by_style(style) else {
            return;
        };
        let Some(body) = self
            .parsed
            .rule_source_data_at(rule_index)
            .map(|data| data.style.body_range)
        else {
            return;
        };
        let Some(recorded_body) = self
            .parsed
            .text()
            .get(body.start as usize..body.end as usize)
            .map(str::to_owned)
        else {
            return;
        };
        let Some(declaration) = self.declaration_for(style) else {
            return;
        };
        let live_text = declaration.borrow().css_text();

        // Compare serializations, not bytes: authoring whitespace alone is
        // not drift.
        let mut recorded = StyleDeclaration::new();
        let _ = recorded.set_css_text(&recorded_body);
        if recorded.css_text() != live_text {
            debug!("revalidate_style: drift in rule {rule_index}");
            self.styles_with_disabled.remove(&style);
            self.set_style_text(style, &live_text);
        }
    }

    /// The authoring text, fetched on first use from the owner `<style>`
    /// element or the resource loader.
    pub fn text(&mut self) -> Option<String> {
        if !self.ensure_text() {
            return None;
        }
        Some(self.parsed.text().to_owned())
    }

    pub fn ensure_parsed_data_ready(&mut self) -> bool {
        self.ensure_text() && self.ensure_source_data()
    }

    fn ensure_text(&mut self) -> bool {
        if self.parsed.has_text() {
            return true;
        }
        if let Some(text) = self.original_sheet_text() {
            self.parsed.set_text(&text);
            return true;
        }
        false
    }

    fn original_sheet_text(&self) -> Option<String> {
        self.inline_sheet_text().or_else(|| self.resource_sheet_text())
    }

    fn inline_sheet_text(&self) -> Option<String> {
        let sheet = self.page_sheet.borrow();
        let owner = sheet.owner_node()?;
        let owner = owner.borrow();
        if owner.node_type() != NodeType::Element || !owner.tag_name().eq_ignore_ascii_case("style")
        {
            return None;
        }
        Some(owner.inner_text().to_owned())
    }

    fn resource_sheet_text(&self) -> Option<String> {
        let loader = self.resources.as_ref()?;
        let sheet = self.page_sheet.borrow();
        let url = sheet.final_url()?;
        loader.resource_content(url)
    }

    fn ensure_source_data(&mut self) -> bool {
        if self.parsed.has_source_data() {
            return true;
        }
        if !self.parsed.has_text() {
            return false;
        }
        let strict = self.page_sheet.borrow().use_strict_parsing();
        let mut probe = StyleSheet::new();
        let ranges = probe.parse_string_collecting(self.parsed.text(), strict);
        self.parsed.set_source_data(ranges);
        self.parsed.has_source_data()
    }

    /// Run an edit against the rule's style editor: cached instance if the
    /// rule has disabled properties, a transient one otherwise. Presence in
    /// the cache afterwards follows the disabled list alone.
    fn with_inspector_style<F>(&mut self, id: &InspectorCssId, edit: F) -> bool
    where
        F: FnOnce(&mut InspectorStyle, &mut dyn SheetBacking) -> bool,
    {
        let Some(declaration) = self.style_for_id(id) else {
            return false;
        };
        let declaration_id = declaration.borrow().id();
        let mut inspector_style = self
            .styles_with_disabled
            .remove(&declaration_id)
            .unwrap_or_else(|| InspectorStyle::new(Some(id.clone()), declaration));
        let applied = edit(&mut inspector_style, self);
        if inspector_style.has_disabled_properties() {
            self.styles_with_disabled.insert(declaration_id, inspector_style);
        }
        applied
    }

    /// The inspectable view of the whole sheet.
    pub fn build_object_for_sheet(&mut self) -> Value {
        let text = self.text();
        let (disabled, href, title, rule_count) = {
            let sheet = self.page_sheet.borrow();
            (
                sheet.disabled(),
                sheet.href().unwrap_or("").to_owned(),
                sheet.title().to_owned(),
                style_rule_count(&sheet),
            )
        };
        let mut rules = Vec::new();
        for ordinal in 0..rule_count {
            if let Some(rule) = self.build_object_for_rule(ordinal) {
                rules.push(rule);
            }
        }
        let mut result = Map::new();
        result.insert("styleSheetId".to_owned(), json!(self.id));
        result.insert("disabled".to_owned(), json!(disabled));
        result.insert("sourceURL".to_owned(), json!(href));
        result.insert("title".to_owned(), json!(title));
        result.insert("rules".to_owned(), Value::Array(rules));
        if let Some(text) = text {
            result.insert("text".to_owned(), json!(text));
        }
        Value::Object(result)
    }

    /// The inspectable view of one rule, by ordinal.
    pub fn build_object_for_rule(&mut self, ordinal: usize) -> Option<Value> {
        let (selector, source_line, style_id, href) = {
            let sheet = self.page_sheet.borrow();
            let rule = nth_style_rule(&sheet, ordinal)?;
            (
                rule.selector_text().to_owned(),
                rule.source_line(),
                rule.style_id(),
                sheet.href().map(str::to_owned),
            )
        };
        let style_value = self.build_object_for_style(style_id)?;

        let source_url = match &href {
            Some(url) if !url.is_empty() => url.clone(),
            _ => self.document_url.clone(),
        };
        let mut result = Map::new();
        result.insert("selectorText".to_owned(), json!(selector));
        result.insert("sourceURL".to_owned(), json!(source_url));
        result.insert("sourceLine".to_owned(), json!(source_line));
        result.insert("origin".to_owned(), json!(self.origin.as_str()));
        result.insert("style".to_owned(), style_value);
        if self.origin.can_bind() {
            result.insert(
                "ruleId".to_owned(),
                json!(InspectorCssId::from_ordinal(&self.id, ordinal).as_string()),
            );
        }
        Some(Value::Object(result))
    }

    /// [`Self::build_object_for_style`] addressed by rule id.
    pub fn build_object_for_style_id(&mut self, id: &InspectorCssId) -> Option<Value> {
        let declaration = self.style_for_id(id)?;
        let declaration_id = declaration.borrow().id();
        self.build_object_for_style(declaration_id)
    }

    /// The inspectable view of one declaration block, including its current
    /// body text when source data resolves.
    pub fn build_object_for_style(&mut self, style: DeclarationId) -> Option<Value> {
        let declaration = self.declaration_for(style)?;
        let id = if self.origin.can_bind() {
            self.rule_or_style_id(style)
        } else {
            None
        };
        let body_range = if self.ensure_parsed_data_ready() {
            self.rule_index_by_style(style)
                .and_then(|index| self.parsed.rule_source_data_at(index))
                .map(|data| data.style.body_range)
        } else {
            None
        };

        let inspector_style = self
            .styles_with_disabled
            .remove(&style)
            .unwrap_or_else(|| InspectorStyle::new(id, declaration));
        let mut value = inspector_style.build_object_for_style(self);
        if inspector_style.has_disabled_properties() {
            self.styles_with_disabled.insert(style, inspector_style);
        }

        if let Some(body) = body_range
            && let Some(text) = self.text()
            && let Some(css_text) = text.get(body.start as usize..body.end as usize)
            && let Value::Object(map) = &mut value
        {
            map.insert("cssText".to_owned(), json!(css_text));
        }
        Some(value)
    }
}

impl SheetBacking for InspectorStyleSheet {
    fn ensure_parsed_data_ready(&mut self) -> bool {
        InspectorStyleSheet::ensure_parsed_data_ready(self)
    }

    fn sheet_text(&mut self) -> Option<String> {
        self.text()
    }

    fn rule_source_data_for(&mut self, style: DeclarationId) -> Option<RuleSourceData> {
        let index = self.rule_index_by_style(style)?;
        self.parsed.rule_source_data_at(index).cloned()
    }

    fn commit_style_text(&mut self, style: DeclarationId, body: &str) -> bool {
        self.set_style_text(style, body)
    }
}
