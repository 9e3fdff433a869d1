//! Report workbook generation on top of fixed Excel templates
//!
//! - `cell` / `merge`: A1 references and merge-region redirection
//! - `layout`: anchors and table geometry of each template
//! - `reference`: optional canonical item ordering
//! - `signature`: technician signature lookup and embedding
//! - `template`: the render pipeline

pub mod cell;
pub mod layout;
pub mod merge;
pub mod reference;
pub mod signature;
pub mod template;

pub use cell::CellRef;
pub use layout::LayoutSpec;
pub use merge::{MergeMap, MergeRegion};
pub use reference::ReferenceOrder;
pub use template::{render, render_book, RenderOptions, RenderOutput, TemplateBuilder};
