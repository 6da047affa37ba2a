//! Box shorthand expansion.
//!
//! The four-sided shorthands expand into their side longhands at parse time;
//! sides the author did not write are copies marked `implicit`. That keeps
//! listings and shorthand reassembly faithful to what was authored.

use css_source::PropertySourceData;

use crate::declaration::StyleProperty;

const BOX_SHORTHANDS: &[(&str, [&str; 4])] = &[
    (
        "margin",
        ["margin-top", "margin-right", "margin-bottom", "margin-left"],
    ),
    (
        "padding",
        ["padding-top", "padding-right", "padding-bottom", "padding-left"],
    ),
    (
        "border-width",
        [
            "border-top-width",
            "border-right-width",
            "border-bottom-width",
            "border-left-width",
        ],
    ),
    (
        "border-style",
        [
            "border-top-style",
            "border-right-style",
            "border-bottom-style",
            "border-left-style",
        ],
    ),
    (
        "border-color",
        [
            "border-top-color",
            "border-right-color",
            "border-bottom-color",
            "border-left-color",
        ],
    ),
];

/// Split a value on top-level whitespace; parenthesized groups such as
/// `calc(1px + 2px)` stay single values.
fn split_top_level_values(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    for (index, character) in value.char_indices() {
        match character {
            '(' | '[' => {
                depth += 1;
                if start.is_none() {
                    start = Some(index);
                }
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                if start.is_none() {
                    start = Some(index);
                }
            }
            c if c.is_ascii_whitespace() && depth == 0 => {
                if let Some(from) = start.take() {
                    out.push(&value[from..index]);
                }
            }
            _ => {
                if start.is_none() {
                    start = Some(index);
                }
            }
        }
    }
    if let Some(from) = start {
        out.push(&value[from..]);
    }
    out
}

/// Expand a declaration into side longhands when its name is a box
/// shorthand with one to four values; `None` means "store as written".
fn expand_declaration(name: &str, value: &str, important: bool) -> Option<Vec<StyleProperty>> {
    let longhands = BOX_SHORTHANDS
        .iter()
        .find(|(shorthand, _)| name.eq_ignore_ascii_case(shorthand))
        .map(|(_, longhands)| longhands)?;
    let values = split_top_level_values(value);
    if values.is_empty() || values.len() > 4 {
        return None;
    }
    let given = values.len();
    // CSS four-value fill: right copies top, bottom copies top, left copies right.
    let top = values[0];
    let right = *values.get(1).unwrap_or(&top);
    let bottom = *values.get(2).unwrap_or(&top);
    let left = *values.get(3).unwrap_or(&right);
    let sides = [top, right, bottom, left];
    let shorthand = name.to_ascii_lowercase();
    Some(
        longhands
            .iter()
            .zip(sides)
            .enumerate()
            .map(|(index, (longhand, side))| StyleProperty {
                name: (*longhand).to_owned(),
                value: side.to_owned(),
                important,
                implicit: index >= given,
                shorthand: shorthand.clone(),
            })
            .collect(),
    )
}

/// Turn parser output into live properties, expanding box shorthands.
pub(crate) fn expand_parsed_properties(parsed: &[PropertySourceData]) -> Vec<StyleProperty> {
    let mut out = Vec::new();
    for data in parsed {
        match expand_declaration(&data.name, &data.value, data.important) {
            Some(mut longhands) => out.append(&mut longhands),
            None => out.push(StyleProperty {
                name: data.name.clone(),
                value: data.value.clone(),
                important: data.important,
                implicit: false,
                shorthand: String::new(),
            }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_whitespace_only() {
        assert_eq!(split_top_level_values("1px 2px"), vec!["1px", "2px"]);
        assert_eq!(
            split_top_level_values("calc(1px + 2px) 3px"),
            vec!["calc(1px + 2px)", "3px"]
        );
        assert_eq!(split_top_level_values("  1px  "), vec!["1px"]);
        assert!(split_top_level_values("").is_empty());
    }

    #[test]
    fn one_value_fills_all_sides() {
        let expanded = expand_declaration("margin", "4px", false).unwrap();
        assert_eq!(expanded.len(), 4);
        assert!(expanded.iter().all(|property| property.value == "4px"));
        assert!(!expanded[0].implicit);
        assert!(expanded[1].implicit && expanded[2].implicit && expanded[3].implicit);
        assert!(expanded.iter().all(|property| property.shorthand == "margin"));
    }

    #[test]
    fn three_values_leave_left_implicit() {
        let expanded = expand_declaration("padding", "1px 2px 3px", true).unwrap();
        let values: Vec<&str> = expanded.iter().map(|property| property.value.as_str()).collect();
        assert_eq!(values, vec!["1px", "2px", "3px", "2px"]);
        let implicit: Vec<bool> = expanded.iter().map(|property| property.implicit).collect();
        assert_eq!(implicit, vec![false, false, false, true]);
        assert!(expanded.iter().all(|property| property.important));
    }

    #[test]
    fn non_shorthands_and_overlong_values_pass_through() {
        assert!(expand_declaration("color", "red", false).is_none());
        assert!(expand_declaration("margin", "1px 2px 3px 4px 5px", false).is_none());
    }
}
