//! The property-level edit engine for a single style block.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use css_model::{DeclarationId, StyleDeclaration};
use css_source::{PropertySourceData, RuleSourceData, SourceRange};
use log::{debug, warn};
use serde_json::{Map, Value, json};

use crate::id::InspectorCssId;

/// The style's view of its parent sheet. Implemented by both sheet kinds;
/// the sheet owns the style and hands itself in per call, never the
/// reverse.
pub trait SheetBacking {
    /// Make authoring text and derived source data available.
    fn ensure_parsed_data_ready(&mut self) -> bool;

    /// The current authoring text of the whole sheet.
    fn sheet_text(&mut self) -> Option<String>;

    /// Source data of the rule owning `style`, copied out by value.
    fn rule_source_data_for(&mut self, style: DeclarationId) -> Option<RuleSourceData>;

    /// Commit a new declaration-body text: live object first, stored text
    /// only if the live side accepts.
    fn commit_style_text(&mut self, style: DeclarationId, body: &str) -> bool;
}

/// One entry of the flattened property listing.
///
/// `disabled` entries are shadows: lifted out of the text, anchored at a
/// zero-width range, carrying the removed substring in `raw_text`.
/// `has_source == false` marks properties that exist only on the live
/// declaration (typically implicit longhands).
#[derive(Clone, Debug)]
pub struct InspectorStyleProperty {
    pub source: PropertySourceData,
    pub has_source: bool,
    pub disabled: bool,
    pub raw_text: String,
}

impl InspectorStyleProperty {
    fn from_source(source: PropertySourceData) -> Self {
        Self {
            source,
            has_source: true,
            disabled: false,
            raw_text: String::new(),
        }
    }

    fn live_only(name: String, value: String, important: bool) -> Self {
        Self {
            source: PropertySourceData {
                name,
                value,
                important,
                parsed_ok: true,
                range: SourceRange::default(),
            },
            has_source: false,
            disabled: false,
            raw_text: String::new(),
        }
    }
}

/// Property-level editor for one declaration block.
///
/// Holds the disabled-property shadow list. The parent sheet retains an
/// instance only while that list is non-empty; otherwise instances are
/// transient, built per request.
#[derive(Debug)]
pub struct InspectorStyle {
    id: Option<InspectorCssId>,
    style: Rc<RefCell<StyleDeclaration>>,
    disabled_properties: Vec<InspectorStyleProperty>,
}

impl InspectorStyle {
    pub fn new(id: Option<InspectorCssId>, style: Rc<RefCell<StyleDeclaration>>) -> Self {
        Self {
            id,
            style,
            disabled_properties: Vec::new(),
        }
    }

    #[inline]
    pub fn style_id(&self) -> DeclarationId {
        self.style.borrow().id()
    }

    #[inline]
    pub fn has_disabled_properties(&self) -> bool {
        !self.disabled_properties.is_empty()
    }

    #[inline]
    pub fn disabled_properties(&self) -> &[InspectorStyleProperty] {
        &self.disabled_properties
    }

    /// Flattened listing merging source-derived properties, disabled
    /// shadows (ordered in by their recorded start offsets), and live-only
    /// properties.
    pub fn populate_all_properties(
        &self,
        sheet: &mut dyn SheetBacking,
    ) -> Vec<InspectorStyleProperty> {
        let mut result: Vec<InspectorStyleProperty> = Vec::new();
        let mut emitted_names: HashSet<String> = HashSet::new();
        let mut disabled_index = 0usize;

        let source_data = if sheet.ensure_parsed_data_ready() {
            sheet.rule_source_data_for(self.style_id())
        } else {
            None
        };
        if let Some(data) = &source_data {
            for property in &data.style.properties {
                while disabled_index < self.disabled_properties.len()
                    && self.disabled_properties[disabled_index].source.range.start
                        <= property.range.start
                {
                    let shadow = self.disabled_properties[disabled_index].clone();
                    emitted_names.insert(shadow.source.name.clone());
                    result.push(shadow);
                    disabled_index += 1;
                }
                emitted_names.insert(property.name.clone());
                result.push(InspectorStyleProperty::from_source(property.clone()));
            }
        }
        while disabled_index < self.disabled_properties.len() {
            let shadow = self.disabled_properties[disabled_index].clone();
            emitted_names.insert(shadow.source.name.clone());
            result.push(shadow);
            disabled_index += 1;
        }

        let style = self.style.borrow();
        for index in 0..style.len() {
            let Some(name) = style.item(index) else {
                continue;
            };
            if emitted_names.contains(name) {
                continue;
            }
            let entry = InspectorStyleProperty::live_only(
                name.to_owned(),
                style.get_property_value(name),
                !style.get_property_priority(name).is_empty(),
            );
            emitted_names.insert(entry.source.name.clone());
            result.push(entry);
        }
        result
    }

    /// Insert or overwrite one property by flat index.
    ///
    /// Overwrite replaces the target's byte range in the declaration body;
    /// for a disabled shadow it rewrites the stashed text instead (empty
    /// text re-enables the property). Insert splices before the indexed
    /// property, or at the body end when the index is past the listing.
    pub fn set_property_text(
        &mut self,
        sheet: &mut dyn SheetBacking,
        index: usize,
        property_text: &str,
        overwrite: bool,
    ) -> bool {
        if !sheet.ensure_parsed_data_ready() {
            warn!("set_property_text: parsed data unavailable");
            return false;
        }
        let all = self.populate_all_properties(sheet);
        let length_delta: i64;

        if overwrite {
            let Some(property) = all.get(index) else {
                return false;
            };
            if property.disabled {
                if property_text.is_empty() {
                    return self.enable_property(sheet, index, &all);
                }
                let Some(disabled_index) = Self::disabled_index_by_ordinal(index, false, &all)
                else {
                    return false;
                };
                self.disabled_properties[disabled_index].raw_text = property_text.to_owned();
                // The text itself is untouched, so no range moves.
                return true;
            }
            if !property.has_source {
                return false;
            }
            length_delta = property_text.len() as i64 - i64::from(property.source.range.len());
            if !self.replace_property_in_style_text(sheet, property.source.range, property_text) {
                return false;
            }
        } else {
            let Some(source_data) = sheet.rule_source_data_for(self.style_id()) else {
                return false;
            };
            let Some(mut body_text) = self.style_text(sheet) else {
                return false;
            };
            length_delta = property_text.len() as i64;

            let body_start = source_data.style.body_range.start;
            let mut insertion_offset = source_data.style.body_range.end;
            if let Some(property) = all.get(index)
                && property.has_source
            {
                // Targeting a disabled shadow lands on its zero-width
                // anchor, which shifts along with the inserted text below.
                insertion_offset = property.source.range.start;
            }
            let relative = (insertion_offset.saturating_sub(body_start) as usize).min(body_text.len());
            body_text.insert_str(relative, property_text);
            if !sheet.commit_style_text(self.style_id(), &body_text) {
                return false;
            }
        }

        if let Some(from_index) = Self::disabled_index_by_ordinal(index, true, &all) {
            self.shift_disabled_properties(from_index, length_delta);
        }
        true
    }

    /// Disable or enable the property at the flat index. A no-op when the
    /// property is already in the requested state.
    pub fn toggle_property(
        &mut self,
        sheet: &mut dyn SheetBacking,
        index: usize,
        disable: bool,
    ) -> bool {
        if !sheet.ensure_parsed_data_ready() {
            return false; // Only source-based properties can toggle.
        }
        if sheet.rule_source_data_for(self.style_id()).is_none() {
            return false;
        }
        let all = self.populate_all_properties(sheet);
        let Some(property) = all.get(index) else {
            return false;
        };
        if property.disabled == disable {
            return true;
        }
        if disable && !property.has_source {
            return false; // Nothing in the text to lift out.
        }
        if disable {
            self.disable_property(sheet, index, &all)
        } else {
            self.enable_property(sheet, index, &all)
        }
    }

    /// Current text of the declaration body (between the braces).
    pub fn style_text(&self, sheet: &mut dyn SheetBacking) -> Option<String> {
        let source_data = sheet.rule_source_data_for(self.style_id())?;
        let text = sheet.sheet_text()?;
        let body = source_data.style.body_range;
        text.get(body.start as usize..body.end as usize)
            .map(str::to_owned)
    }

    /// Map a flat-listing ordinal to an index into the shadow list. With
    /// `can_use_subsequent`, a non-disabled ordinal resolves to the next
    /// shadow after it.
    fn disabled_index_by_ordinal(
        ordinal: usize,
        can_use_subsequent: bool,
        all: &[InspectorStyleProperty],
    ) -> Option<usize> {
        let mut disabled_index = 0usize;
        for (index, property) in all.iter().enumerate() {
            if property.disabled {
                if index == ordinal || (can_use_subsequent && index > ordinal) {
                    return Some(disabled_index);
                }
                disabled_index += 1;
            }
        }
        None
    }

    /// Lift the property out of the text into a shadow entry.
    fn disable_property(
        &mut self,
        sheet: &mut dyn SheetBacking,
        index_to_disable: usize,
        all: &[InspectorStyleProperty],
    ) -> bool {
        let Some(property) = all.get(index_to_disable) else {
            return false;
        };
        let range = property.source.range;
        let property_length = i64::from(range.len());

        let Some(text) = sheet.sheet_text() else {
            return false;
        };
        let Some(raw_text) = text
            .get(range.start as usize..range.end as usize)
            .map(str::to_owned)
        else {
            warn!("disable_property: range {range:?} outside sheet text");
            return false;
        };

        let mut disabled_property = property.clone();
        disabled_property.disabled = true;
        disabled_property.source.range = range.collapsed_to_start();
        disabled_property.raw_text = raw_text;

        if !self.replace_property_in_style_text(sheet, range, "") {
            return false;
        }

        match Self::disabled_index_by_ordinal(index_to_disable, true, all) {
            None => self.disabled_properties.push(disabled_property),
            Some(insertion_index) => {
                self.disabled_properties.insert(insertion_index, disabled_property);
                // Everything after the removal point moved back.
                self.shift_disabled_properties(insertion_index + 1, -property_length);
            }
        }
        debug!(
            "disable_property: index {index_to_disable}, {} shadows",
            self.disabled_properties.len()
        );
        true
    }

    /// Reinsert a shadow's stashed text at its anchor.
    fn enable_property(
        &mut self,
        sheet: &mut dyn SheetBacking,
        index_to_enable: usize,
        all: &[InspectorStyleProperty],
    ) -> bool {
        let Some(disabled_index) = Self::disabled_index_by_ordinal(index_to_enable, false, all)
        else {
            return false;
        };
        let disabled_property = self.disabled_properties.remove(disabled_index);
        let raw_length = disabled_property.raw_text.len() as i64;
        let anchor = disabled_property.source.range;
        if self.replace_property_in_style_text(sheet, anchor, &disabled_property.raw_text) {
            self.shift_disabled_properties(disabled_index, raw_length);
            true
        } else {
            self.disabled_properties.insert(disabled_index, disabled_property);
            false
        }
    }

    /// Splice `new_text` over `range` (sheet-absolute) within the
    /// declaration body and commit the result.
    fn replace_property_in_style_text(
        &self,
        sheet: &mut dyn SheetBacking,
        range: SourceRange,
        new_text: &str,
    ) -> bool {
        let Some(source_data) = sheet.rule_source_data_for(self.style_id()) else {
            return false;
        };
        let Some(mut text) = self.style_text(sheet) else {
            return false;
        };
        let body_start = source_data.style.body_range.start;
        if range.start < body_start {
            return false;
        }
        let start = (range.start - body_start) as usize;
        let end = (range.end - body_start) as usize;
        if start > end || end > text.len() {
            warn!("property range {range:?} outside style body");
            return false;
        }
        text.replace_range(start..end, new_text);
        sheet.commit_style_text(self.style_id(), &text)
    }

    fn shift_disabled_properties(&mut self, from_index: usize, delta: i64) {
        for property in self.disabled_properties.iter_mut().skip(from_index) {
            property.source.range.shift(delta);
        }
    }

    /// Shorthand value reassembled from the live declaration: the direct
    /// value when present, else the space-joined non-implicit longhands
    /// (skipping literal `initial`).
    pub fn shorthand_value(&self, shorthand: &str) -> String {
        let style = self.style.borrow();
        let value = style.get_property_value(shorthand);
        if !value.is_empty() {
            return value;
        }
        let mut out = String::new();
        for index in 0..style.len() {
            let Some(name) = style.item(index) else {
                continue;
            };
            if !style.get_property_shorthand(name).eq_ignore_ascii_case(shorthand) {
                continue;
            }
            if style.is_property_implicit(name) {
                continue;
            }
            let individual = style.get_property_value(name);
            if individual == "initial" {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&individual);
        }
        out
    }

    /// Shorthand priority: direct when present, else the first longhand's.
    pub fn shorthand_priority(&self, shorthand: &str) -> String {
        let style = self.style.borrow();
        let priority = style.get_property_priority(shorthand);
        if !priority.is_empty() {
            return priority;
        }
        for index in 0..style.len() {
            let Some(name) = style.item(index) else {
                continue;
            };
            if style.get_property_shorthand(name).eq_ignore_ascii_case(shorthand) {
                return style.get_property_priority(name);
            }
        }
        String::new()
    }

    /// Live-declaration longhands belonging to `shorthand`, deduplicated,
    /// in enumeration order.
    pub fn longhand_properties(&self, shorthand: &str) -> Vec<String> {
        let style = self.style.borrow();
        let mut found: HashSet<String> = HashSet::new();
        let mut properties = Vec::new();
        for index in 0..style.len() {
            let Some(name) = style.item(index) else {
                continue;
            };
            if found.contains(name)
                || !style.get_property_shorthand(name).eq_ignore_ascii_case(shorthand)
            {
                continue;
            }
            found.insert(name.to_owned());
            properties.push(name.to_owned());
        }
        properties
    }

    /// The inspectable view of this style block.
    pub fn build_object_for_style(&self, sheet: &mut dyn SheetBacking) -> Value {
        let mut result = Map::new();
        if let Some(id) = &self.id {
            result.insert("styleId".to_owned(), json!(id.as_string()));
        }

        let mut properties = Map::new();
        {
            let style = self.style.borrow();
            properties.insert("width".to_owned(), json!(style.get_property_value("width")));
            properties.insert("height".to_owned(), json!(style.get_property_value("height")));
        }
        if sheet.ensure_parsed_data_ready()
            && let Some(source_data) = sheet.rule_source_data_for(self.style_id())
        {
            let body = source_data.style.body_range;
            properties.insert("startOffset".to_owned(), json!(body.start));
            properties.insert("endOffset".to_owned(), json!(body.end));
        }
        result.insert("properties".to_owned(), Value::Object(properties));

        self.populate_object_with_style_properties(sheet, &mut result);
        Value::Object(result)
    }

    fn populate_object_with_style_properties(
        &self,
        sheet: &mut dyn SheetBacking,
        result: &mut Map<String, Value>,
    ) {
        let all = self.populate_all_properties(sheet);
        let style = self.style.borrow();

        let mut css_properties: Vec<Value> = Vec::new();
        let mut shorthand_values = Map::new();
        let mut previous_active_by_name: HashMap<String, usize> = HashMap::new();
        let mut found_shorthands: HashSet<String> = HashSet::new();

        for entry in &all {
            let name = &entry.source.name;
            let mut property = Map::new();
            property.insert("parsedOk".to_owned(), json!(entry.source.parsed_ok));

            if entry.disabled {
                property.insert("status".to_owned(), json!("disabled"));
                property.insert("text".to_owned(), json!(entry.raw_text));
                css_properties.push(Value::Object(property));
                continue;
            }

            property.insert("status".to_owned(), json!("active"));
            property.insert("name".to_owned(), json!(name));
            property.insert("value".to_owned(), json!(entry.source.value));
            property.insert(
                "priority".to_owned(),
                json!(if entry.source.important { "important" } else { "" }),
            );
            if entry.has_source {
                property.insert("implicit".to_owned(), json!(false));
                property.insert("startOffset".to_owned(), json!(entry.source.range.start));
                property.insert("endOffset".to_owned(), json!(entry.source.range.end));
            } else {
                property.insert("implicit".to_owned(), json!(style.is_property_implicit(name)));
                property.insert("status".to_owned(), json!("style"));
            }

            if entry.source.parsed_ok {
                let shorthand = style.get_property_shorthand(name);
                property.insert("shorthandName".to_owned(), json!(shorthand));
                if !shorthand.is_empty() && !found_shorthands.contains(&shorthand) {
                    found_shorthands.insert(shorthand.clone());
                    shorthand_values
                        .insert(shorthand.clone(), json!(self.shorthand_value(&shorthand)));
                }
            } else {
                property.insert("shorthandName".to_owned(), json!(""));
            }

            let index = css_properties.len();
            css_properties.push(Value::Object(property));

            // Among source-backed entries of one name, only the last stays
            // active; earlier ones are demoted after the fact.
            if entry.has_source {
                if let Some(&previous_index) = previous_active_by_name.get(name)
                    && let Some(Value::Object(previous)) = css_properties.get_mut(previous_index)
                {
                    previous.insert("status".to_owned(), json!("inactive"));
                    previous.insert("shorthandName".to_owned(), json!(""));
                }
                previous_active_by_name.insert(name.clone(), index);
            }
        }

        result.insert("cssProperties".to_owned(), Value::Array(css_properties));
        result.insert("shorthandValues".to_owned(), Value::Object(shorthand_values));
    }
}
