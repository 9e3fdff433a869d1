use std::path::PathBuf;
use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("No item table found in {}", .0.display())]
    MissingItemTable(PathBuf),

    #[error("Unreadable image {}: {reason}", .path.display())]
    Image { path: PathBuf, reason: String },

    #[error("Invalid cell reference: {0}")]
    InvalidCell(String),

    #[error(
        "Item table needs {needed} rows but the template only has {available} before the totals; remove at least {} rows",
        .needed - .available
    )]
    TableOverflow { needed: u32, available: u32 },
}
