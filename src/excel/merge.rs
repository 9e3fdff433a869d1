//! Merge regions of a template sheet.
//!
//! Only the top-left cell of a merge region holds a value; every write that
//! targets a cell inside a region is redirected to that anchor.

use super::cell::CellRef;
use crate::error::{ReportError, ReportResult};
use std::collections::HashMap;
use umya_spreadsheet::Worksheet;

/// Rectangular merged block, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRegion {
    pub start: CellRef,
    pub end: CellRef,
}

impl MergeRegion {
    /// Parse an `A1:B2` range. A single cell is a degenerate region.
    pub fn parse(range: &str) -> ReportResult<Self> {
        let (a, b) = range.split_once(':').unwrap_or((range, range));
        let a: CellRef = a.parse()?;
        let b: CellRef = b.parse()?;
        Ok(Self {
            start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
            end: CellRef::new(a.col.max(b.col), a.row.max(b.row)),
        })
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.col..=self.end.col).contains(&cell.col)
            && (self.start.row..=self.end.row).contains(&cell.row)
    }
}

/// Lookup from any covered cell to the region that covers it.
#[derive(Debug, Clone, Default)]
pub struct MergeMap {
    regions: Vec<MergeRegion>,
    covered: HashMap<CellRef, usize>,
}

impl MergeMap {
    pub fn new(regions: Vec<MergeRegion>) -> Self {
        let mut covered = HashMap::new();
        for (idx, region) in regions.iter().enumerate() {
            for row in region.start.row..=region.end.row {
                for col in region.start.col..=region.end.col {
                    covered.entry(CellRef::new(col, row)).or_insert(idx);
                }
            }
        }
        Self { regions, covered }
    }

    /// Collect the merge regions declared on a worksheet
    pub fn from_worksheet(sheet: &Worksheet) -> ReportResult<Self> {
        let regions = sheet
            .get_merge_cells()
            .iter()
            .map(|range| MergeRegion::parse(&range.get_range()))
            .collect::<ReportResult<Vec<_>>>()
            .map_err(|e| match e {
                ReportError::InvalidCell(c) => {
                    ReportError::Spreadsheet(format!("unreadable merge range '{}'", c))
                }
                other => other,
            })?;
        Ok(Self::new(regions))
    }

    pub fn regions(&self) -> &[MergeRegion] {
        &self.regions
    }

    /// Region covering `cell`, if any
    pub fn region_of(&self, cell: CellRef) -> Option<&MergeRegion> {
        self.covered.get(&cell).map(|idx| &self.regions[*idx])
    }

    /// True when `cell` belongs to any merge region (anchor included)
    pub fn is_merged(&self, cell: CellRef) -> bool {
        self.covered.contains_key(&cell)
    }

    /// The cell a write to `cell` must land on: the region's top-left cell,
    /// or `cell` itself when it is not merged.
    pub fn resolve(&self, cell: CellRef) -> CellRef {
        self.region_of(cell).map_or(cell, |r| r.start)
    }
}
