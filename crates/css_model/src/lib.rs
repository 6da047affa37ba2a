//! Live style model: the mutable stylesheet, rule, and declaration objects
//! whose state drives rendering. The inspector edits these through their
//! public surface and mirrors every change into authoring text.

#![forbid(unsafe_code)]

mod declaration;
mod dom;
mod sheet;
mod shorthand;

pub use declaration::{DeclarationId, StyleDeclaration, StyleProperty, StyleTextError};
pub use dom::{Element, NodeType};
pub use sheet::{AtRule, SheetError, SheetItem, StyleRule, StyleSheet};
