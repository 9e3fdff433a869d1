//! A1-style cell references

use crate::error::{ReportError, ReportResult};
use std::fmt;
use std::str::FromStr;

/// A single cell position, 1-based like the sheet itself (A1 = col 1, row 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Cell in `column` (letters) at `row`. Layout code only passes fixed
    /// column letters; anything else falls back to column A.
    pub fn at(column: &str, row: u32) -> Self {
        Self {
            col: letters_to_column(column).unwrap_or(1),
            row,
        }
    }

    pub fn column_letter(&self) -> String {
        column_to_letters(self.col)
    }

    /// `(col, row)` tuple in the order the spreadsheet crate expects
    pub fn coords(&self) -> (u32, u32) {
        (self.col, self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letter(), self.row)
    }
}

impl FromStr for CellRef {
    type Err = ReportError;

    fn from_str(s: &str) -> ReportResult<Self> {
        let s = s.trim().replace('$', "");
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ReportError::InvalidCell(s.clone()))?;
        let (letters, digits) = s.split_at(split);
        let col = letters_to_column(letters).ok_or_else(|| ReportError::InvalidCell(s.clone()))?;
        let row = digits
            .parse::<u32>()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| ReportError::InvalidCell(s.clone()))?;
        Ok(Self { col, row })
    }
}

/// Convert a 1-based column number to its letters
///
/// Examples:
/// - 1 → A
/// - 26 → Z
/// - 27 → AA
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut idx = col.saturating_sub(1);

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Convert column letters to a 1-based column number (case-insensitive)
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        let c = c.to_ascii_uppercase();
        c.is_ascii_uppercase()
            .then(|| acc * 26 + (c as u32 - 'A' as u32 + 1))
    })
}
