//! Reporte - work-order exports to filled Excel report templates
//!
//! This library reads the CSV-like export of a housing-improvement work order,
//! repairs its text encoding, extracts the beneficiary/technician fields and
//! the activity table, and writes them into one of the fixed report templates.
//!
//! # Features
//!
//! - Mojibake repair and accent-preserving text normalization
//! - `key: value` field extraction and activity table parsing
//! - Merge-aware template writes with per-category subtotals
//! - Totals formulas, print setup and technician signature embedding
//!
//! # Example
//!
//! ```no_run
//! use royalbit_reporte::excel::{render, RenderOptions};
//! use royalbit_reporte::parser::extract;
//! use royalbit_reporte::types::Layout;
//!
//! let raw = std::fs::read("orden.csv")?;
//! let extraction = extract(&raw);
//!
//! let output = render(
//!     extraction.items.items(),
//!     &extraction.fields,
//!     Layout::Medellin,
//!     &RenderOptions::default(),
//! )?;
//! std::fs::write("reporte.xlsx", &output.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use config::ReportConfig;
pub use error::{ReportError, ReportResult};
pub use types::{ExtractedFields, Layout, LineItem};
