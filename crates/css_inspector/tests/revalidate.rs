use std::cell::RefCell;
use std::rc::Rc;

use css_inspector::{InspectorCssId, InspectorStyleSheet, StyleOrigin};
use css_model::StyleSheet;

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
fn external_mutation_is_committed_back_into_the_text() {
    // The page rewrites the live declaration behind the inspector's back.
    let mut sheet = inspector_sheet("a { color: red; }");
    let style = sheet.style_for_id(&rule(0)).unwrap();
    let declaration_id = style.borrow().id();
    style.borrow_mut().set_css_text("color: green;").unwrap();

    sheet.revalidate_style(declaration_id);
    assert_eq!(sheet.text().unwrap(), "a {color: green;}");
    assert_eq!(style.borrow().get_property_value("color"), "green");
}

#[test]
fn revalidation_without_drift_changes_nothing() {
    let mut sheet = inspector_sheet("a { color: red; }");
    let style = sheet.style_for_id(&rule(0)).unwrap();
    let declaration_id = style.borrow().id();

    sheet.revalidate_style(declaration_id);
    // Authoring whitespace alone never counts as drift.
    assert_eq!(sheet.text().unwrap(), "a { color: red; }");
}

#[test]
fn drift_drops_cached_shadow_state() {
    let mut sheet = inspector_sheet("a { color: red; margin: 0; }");
    assert!(sheet.toggle_property(&rule(0), 0, true));

    let style = sheet.style_for_id(&rule(0)).unwrap();
    let declaration_id = style.borrow().id();
    style.borrow_mut().set_css_text("color: lime;").unwrap();
    sheet.revalidate_style(declaration_id);

    let all = sheet.all_properties(&rule(0)).unwrap();
    assert!(
        all.iter().all(|property| !property.disabled),
        "stale shadows must not survive revalidation"
    );
    assert_eq!(sheet.text().unwrap(), "a {color: lime;}");
}

#[test]
fn only_the_drifted_rule_is_patched() {
    let mut sheet = inspector_sheet("a { color: red; }\nb { margin: 2px; }");
    let second = sheet.style_for_id(&rule(1)).unwrap();
    let declaration_id = second.borrow().id();
    second.borrow_mut().set_css_text("margin: 4px;").unwrap();

    sheet.revalidate_style(declaration_id);
    assert_eq!(sheet.text().unwrap(), "a { color: red; }\nb {margin: 4px;}");
}
