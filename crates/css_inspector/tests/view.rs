use std::cell::RefCell;
use std::rc::Rc;

use css_inspector::{InspectorCssId, InspectorStyle, InspectorStyleSheet, StyleOrigin};
use css_model::{StyleDeclaration, StyleSheet};
use serde_json::json;

fn inspector_sheet(text: &str) -> InspectorStyleSheet {
    let page = Rc::new(RefCell::new(StyleSheet::new()));
    let mut sheet = InspectorStyleSheet::new(
        "sheet-1",
        page,
        StyleOrigin::Author,
        "http://example.test/page.html",
    );
    assert!(sheet.set_text(text), "seeding sheet text must succeed");
    sheet
}

fn rule(ordinal: usize) -> InspectorCssId {
    InspectorCssId::from_ordinal("sheet-1", ordinal)
}

#[test]
fn rule_view_has_selector_origin_and_bound_id() {
    let mut sheet = inspector_sheet("a { color: red; }");
    let value = sheet.build_object_for_rule(0).unwrap();
    assert_eq!(value["selectorText"], json!("a"));
    assert_eq!(value["origin"], json!("author"));
    assert_eq!(value["sourceLine"], json!(0));
    assert_eq!(value["ruleId"], json!("sheet-1:0"));
    // No href on the page sheet: the document URL is the fallback.
    assert_eq!(value["sourceURL"], json!("http://example.test/page.html"));
    assert_eq!(value["style"]["cssText"], json!(" color: red; "));
}

#[test]
fn engine_sheets_do_not_bind_ids() {
    let page = Rc::new(RefCell::new(StyleSheet::new()));
    let mut sheet = InspectorStyleSheet::new("ua-1", page, StyleOrigin::UserAgent, "");
    assert!(sheet.set_text("a { color: red; }"));
    let value = sheet.build_object_for_rule(0).unwrap();
    assert_eq!(value["origin"], json!("user-agent"));
    assert!(value.get("ruleId").is_none());
    assert!(value["style"].get("styleId").is_none());
}

#[test]
fn later_duplicate_demotes_earlier_entry_to_inactive() {
    let mut sheet = inspector_sheet("a { color: red; color: blue; }");
    let value = sheet.build_object_for_rule(0).unwrap();
    let properties = value["style"]["cssProperties"].as_array().unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0]["status"], json!("inactive"));
    assert_eq!(properties[0]["shorthandName"], json!(""));
    assert_eq!(properties[1]["status"], json!("active"));
    assert_eq!(properties[1]["value"], json!("blue"));
}

#[test]
fn disabled_entries_expose_only_their_text() {
    let mut sheet = inspector_sheet("a { color: red; margin: 0; }");
    assert!(sheet.toggle_property(&rule(0), 0, true));
    let value = sheet.build_object_for_style_id(&rule(0)).unwrap();
    let properties = value["cssProperties"].as_array().unwrap();

    let disabled = &properties[0];
    assert_eq!(disabled["status"], json!("disabled"));
    assert_eq!(disabled["text"], json!("color: red;"));
    assert_eq!(disabled["parsedOk"], json!(true));
    assert!(disabled.get("name").is_none());
    assert!(disabled.get("value").is_none());

    assert_eq!(properties[1]["name"], json!("margin"));
}

#[test]
fn live_only_longhands_report_style_status_and_shorthand_values() {
    let mut sheet = inspector_sheet("a { margin: 1px 2px; }");
    let value = sheet.build_object_for_style_id(&rule(0)).unwrap();
    let properties = value["cssProperties"].as_array().unwrap();
    assert_eq!(properties.len(), 5);

    let source_entry = &properties[0];
    assert_eq!(source_entry["name"], json!("margin"));
    assert_eq!(source_entry["status"], json!("active"));
    assert_eq!(source_entry["shorthandName"], json!(""));

    let top = &properties[1];
    assert_eq!(top["name"], json!("margin-top"));
    assert_eq!(top["status"], json!("style"));
    assert_eq!(top["implicit"], json!(false));
    assert_eq!(top["shorthandName"], json!("margin"));
    assert!(top.get("startOffset").is_none());

    let bottom = &properties[3];
    assert_eq!(bottom["name"], json!("margin-bottom"));
    assert_eq!(bottom["implicit"], json!(true));

    assert_eq!(value["shorthandValues"]["margin"], json!("1px 2px"));
}

#[test]
fn malformed_values_are_listed_without_shorthand_data() {
    let mut sheet = inspector_sheet("a { color: red !importnt; }");
    let value = sheet.build_object_for_style_id(&rule(0)).unwrap();
    let properties = value["cssProperties"].as_array().unwrap();
    assert_eq!(properties[0]["parsedOk"], json!(false));
    assert_eq!(properties[0]["shorthandName"], json!(""));
}

#[test]
fn style_view_carries_dimensions_and_body_offsets() {
    let mut sheet = inspector_sheet("a { width: 10px; height: 20px; }");
    let value = sheet.build_object_for_style_id(&rule(0)).unwrap();
    assert_eq!(value["properties"]["width"], json!("10px"));
    assert_eq!(value["properties"]["height"], json!("20px"));
    assert_eq!(value["properties"]["startOffset"], json!(3));
    assert_eq!(value["properties"]["endOffset"], json!(31));
    assert_eq!(value["cssText"], json!(" width: 10px; height: 20px; "));
    let first = &value["cssProperties"].as_array().unwrap()[0];
    assert_eq!(first["startOffset"], json!(4));
    assert_eq!(first["endOffset"], json!(16));
}

#[test]
fn sheet_view_includes_text_rules_and_metadata() {
    let page = Rc::new(RefCell::new(StyleSheet::new()));
    page.borrow_mut()
        .set_href("http://example.test/site.css", "http://example.test/site.css");
    page.borrow_mut().set_title("site styles");
    let mut sheet = InspectorStyleSheet::new(
        "sheet-9",
        page,
        StyleOrigin::Author,
        "http://example.test/page.html",
    );
    assert!(sheet.set_text("a { color: red; }\nb { margin: 0; }"));

    let value = sheet.build_object_for_sheet();
    assert_eq!(value["styleSheetId"], json!("sheet-9"));
    assert_eq!(value["disabled"], json!(false));
    assert_eq!(value["sourceURL"], json!("http://example.test/site.css"));
    assert_eq!(value["title"], json!("site styles"));
    assert_eq!(value["text"], json!("a { color: red; }\nb { margin: 0; }"));

    let rules = value["rules"].as_array().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0]["selectorText"], json!("a"));
    assert_eq!(rules[1]["selectorText"], json!("b"));
    assert_eq!(rules[1]["sourceLine"], json!(1));
    assert_eq!(rules[1]["sourceURL"], json!("http://example.test/site.css"));
}

#[test]
fn view_text_reparses_to_the_live_sheet_shape() {
    // Round-tripping the exposed text through the parser must reproduce the
    // live sheet's selectors and per-rule property names, even after edits.
    let mut sheet = inspector_sheet("a { color: red; }\nb { margin: 0; padding: 1px; }");
    assert!(sheet.toggle_property(&rule(0), 0, true));
    assert!(sheet.toggle_property(&rule(0), 0, false));
    assert!(sheet.set_property_text(&rule(1), 0, "margin: 2px;", true));

    let value = sheet.build_object_for_sheet();
    let text = value["text"].as_str().unwrap().to_owned();
    let mut reparsed = StyleSheet::new();
    reparsed.parse_string(&text, true);

    let page = sheet.page_sheet();
    let page = page.borrow();
    assert_eq!(reparsed.len(), page.len());
    for index in 0..page.len() {
        let live = page.rule_at(index).unwrap();
        let mirror = reparsed.rule_at(index).unwrap();
        assert_eq!(live.selector_text(), mirror.selector_text());

        let live_style = live.style();
        let live_style = live_style.borrow();
        let mirror_style = mirror.style();
        let mirror_style = mirror_style.borrow();
        let live_names: Vec<String> = (0..live_style.len())
            .filter_map(|i| live_style.item(i).map(str::to_owned))
            .collect();
        let mirror_names: Vec<String> = (0..mirror_style.len())
            .filter_map(|i| mirror_style.item(i).map(str::to_owned))
            .collect();
        assert_eq!(live_names, mirror_names, "rule {index} property names");
    }
}

#[test]
fn shorthand_helpers_reassemble_the_authored_value() {
    let declaration = Rc::new(RefCell::new(StyleDeclaration::new()));
    declaration
        .borrow_mut()
        .set_css_text("margin: 1px 2px !important")
        .unwrap();
    let style = InspectorStyle::new(None, declaration);
    assert_eq!(style.shorthand_value("margin"), "1px 2px");
    assert_eq!(style.shorthand_priority("margin"), "important");
    assert_eq!(
        style.longhand_properties("margin"),
        vec![
            "margin-top".to_owned(),
            "margin-right".to_owned(),
            "margin-bottom".to_owned(),
            "margin-left".to_owned(),
        ]
    );
}

#[test]
fn shorthand_value_skips_literal_initial() {
    let declaration = Rc::new(RefCell::new(StyleDeclaration::new()));
    declaration
        .borrow_mut()
        .set_css_text("margin: initial 2px")
        .unwrap();
    let style = InspectorStyle::new(None, declaration);
    assert_eq!(style.shorthand_value("margin"), "2px");
    assert_eq!(style.shorthand_priority("margin"), "");
}
