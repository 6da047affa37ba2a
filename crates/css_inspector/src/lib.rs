//! Editable view of live stylesheets for a remote style inspector.
//!
//! Keeps two representations of every inspected sheet in sync under
//! client-driven edits: the authoring text with byte-precise ranges for
//! selectors, declaration bodies, and individual properties, and the live
//! style objects that drive rendering. Properties can be toggled off while
//! their original text is retained, so re-enabling restores the sheet
//! byte-exactly.

#![forbid(unsafe_code)]

mod id;
mod inline;
mod parsed_sheet;
mod sheet;
mod style;

pub use id::{InspectorCssId, StyleOrigin};
pub use inline::InlineStyleSheet;
pub use parsed_sheet::ParsedSheet;
pub use sheet::{InspectorStyleSheet, ResourceLoader};
pub use style::{InspectorStyle, InspectorStyleProperty, SheetBacking};
