//! Optional canonical item ordering read from a reference spreadsheet.
//!
//! The reference lists item codes in the order the report should present
//! them. Reordering is best-effort: the caller keeps the original order when
//! the reference cannot be read.

use crate::error::{ReportError, ReportResult};
use crate::types::LineItem;
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;

/// Header names accepted for the item-code column (compared lower-cased)
const CODE_HEADERS: &[&str] = &["item", "ítem", "código", "codigo"];

/// How many leading rows are searched for the header
const HEADER_SCAN_ROWS: usize = 20;

/// Item code → position in the reference table
#[derive(Debug, Clone, Default)]
pub struct ReferenceOrder {
    positions: HashMap<String, usize>,
}

impl ReferenceOrder {
    /// Build an ordering from codes listed in canonical order. The first
    /// occurrence of a repeated code wins.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = HashMap::new();
        for (idx, code) in codes.into_iter().enumerate() {
            let code = code.as_ref().trim();
            if !code.is_empty() {
                positions.entry(code.to_string()).or_insert(idx);
            }
        }
        Self { positions }
    }

    /// Read the item-code column from the first sheet of a spreadsheet.
    pub fn load(path: &Path) -> ReportResult<Self> {
        if !path.exists() {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("reference file not found: {}", path.display()),
            )));
        }
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            ReportError::Spreadsheet(format!("Failed to open reference file: {}", e))
        })?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ReportError::Spreadsheet("reference file has no sheets".to_string()))?
            .map_err(|e| ReportError::Spreadsheet(format!("Failed to read reference sheet: {}", e)))?;

        let rows: Vec<&[Data]> = range.rows().collect();
        let (header_row, code_col) = rows
            .iter()
            .take(HEADER_SCAN_ROWS)
            .enumerate()
            .find_map(|(r, row)| {
                row.iter()
                    .position(|cell| {
                        let header = cell_text(cell).to_lowercase();
                        CODE_HEADERS.contains(&header.as_str())
                    })
                    .map(|c| (r, c))
            })
            .ok_or_else(|| {
                ReportError::Spreadsheet("reference file has no item code column".to_string())
            })?;

        let codes = rows[header_row + 1..]
            .iter()
            .map(|row| row.get(code_col).map(cell_text).unwrap_or_default());
        Ok(Self::from_codes(codes))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of `code`, or `usize::MAX` when the reference doesn't list it
    pub fn position(&self, code: &str) -> usize {
        self.positions
            .get(code.trim())
            .copied()
            .unwrap_or(usize::MAX)
    }

    /// Stable-sort items by their reference position; unknown codes go last
    /// and keep their relative order.
    pub fn apply(&self, items: &mut [LineItem]) {
        items.sort_by_key(|item| self.position(&item.code));
    }
}

/// Cell content as trimmed text. Whole floats print without a fraction so a
/// code stored as the number 3 matches the text "3".
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}
