//! Template writer: fills one of the fixed report templates.
//!
//! A [`TemplateBuilder`] owns the loaded workbook for the length of one
//! render call. Every step mutates the sheet through it and
//! [`TemplateBuilder::finish`] serializes the result to bytes.

use super::cell::CellRef;
use super::layout::{
    LayoutSpec, CURRENCY_FORMAT, HEADER_FILL, MARKUP_RATE, PRINT_COLUMNS, TAX_RATE,
};
use super::merge::MergeMap;
use super::reference::ReferenceOrder;
use super::signature::{embed_signature, find_signature, signature_file_name};
use crate::error::{ReportError, ReportResult};
use crate::parser::text::normalize_money;
use crate::types::{category_groups, CategoryGroup, ExtractedFields, Layout, LineItem};
use chrono::NaiveDate;
use regex::Regex;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use umya_spreadsheet::{HorizontalAlignmentValues, OrientationValues, Spreadsheet, Worksheet};

const FONT_NAME: &str = "Times New Roman";
const FONT_SIZE: f64 = 14.0;
const FONT_COLOR: &str = "FF000000";
const SUBTOTAL_LABEL: &str = "SUBTOTAL";
const PRINT_AREA: &str = "_xlnm.Print_Area";
const BASE_ROW_HEIGHT: f64 = 15.0;

/// Inputs of a render call besides the extracted data
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory holding the template files
    pub templates_dir: PathBuf,
    /// Optional spreadsheet listing item codes in canonical order
    pub reference: Option<PathBuf>,
    /// Optional directory of `<name>.png` signature images
    pub signatures_dir: Option<PathBuf>,
    /// Date printed on the report
    pub date: NaiveDate,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("."),
            reference: None,
            signatures_dir: None,
            date: chrono::Local::now().date_naive(),
        }
    }
}

/// Rendered workbook plus any non-fatal notices for the user
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub notices: Vec<String>,
}

/// Value handed to a cell write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue<'a> {
    Text(&'a str),
    Number(f64),
    /// Formula text without the leading `=`
    Formula(String),
}

/// Path of a layout's template inside `templates_dir`
pub fn template_path(templates_dir: &Path, layout: Layout) -> PathBuf {
    templates_dir.join(LayoutSpec::for_layout(layout).template_file)
}

/// Render the extracted data into the template of `layout`.
///
/// Fails only when the template can't be loaded or the item table doesn't
/// fit; reference ordering and signature problems become notices.
pub fn render(
    items: &[LineItem],
    fields: &ExtractedFields,
    layout: Layout,
    options: &RenderOptions,
) -> ReportResult<RenderOutput> {
    let path = template_path(&options.templates_dir, layout);
    if !path.is_file() {
        return Err(ReportError::TemplateNotFound(path));
    }
    info!(template = %path.display(), layout = %layout, "loading template");
    let book = umya_spreadsheet::reader::xlsx::read(&path)
        .map_err(|e| ReportError::Spreadsheet(format!("Failed to open template: {}", e)))?;
    render_book(book, items, fields, LayoutSpec::for_layout(layout), options)
}

/// Render into an already loaded template workbook.
pub fn render_book(
    book: Spreadsheet,
    items: &[LineItem],
    fields: &ExtractedFields,
    spec: &'static LayoutSpec,
    options: &RenderOptions,
) -> ReportResult<RenderOutput> {
    let mut items = items.to_vec();
    let mut builder = TemplateBuilder::new(book, spec)?;

    if let Some(reference) = &options.reference {
        builder.reorder(&mut items, reference);
    }
    builder.write_fields(fields, &options.date.format("%d/%m/%Y").to_string());
    builder.write_items(&items)?;
    builder.write_totals();
    builder.write_technician(fields);
    builder.hide_unused_rows();
    builder.fill_blanks();
    builder.setup_page()?;
    if let Some(dir) = &options.signatures_dir {
        builder.place_signature(dir, &fields.tecnico_nombre);
    }
    builder.finish()
}

/// Exclusive owner of one template workbook during a render call.
pub struct TemplateBuilder {
    book: Spreadsheet,
    spec: &'static LayoutSpec,
    merges: MergeMap,
    notices: Vec<String>,
    /// Last row written by the item table (subtotal row of the last block)
    last_table_row: Option<u32>,
}

impl TemplateBuilder {
    pub fn new(mut book: Spreadsheet, spec: &'static LayoutSpec) -> ReportResult<Self> {
        let merges = MergeMap::from_worksheet(book.get_active_sheet_mut())?;
        debug!(regions = merges.regions().len(), "template merge regions");
        Ok(Self {
            book,
            spec,
            merges,
            notices: Vec::new(),
            last_table_row: None,
        })
    }

    fn sheet(&mut self) -> &mut Worksheet {
        self.book.get_active_sheet_mut()
    }

    /// Add a notice for the user; also logged as a warning.
    fn notice(&mut self, message: String) {
        warn!("{}", message);
        self.notices.push(message);
    }

    /// Sort items by the reference document, keeping the current order when
    /// it can't be read.
    pub fn reorder(&mut self, items: &mut [LineItem], reference: &Path) {
        match ReferenceOrder::load(reference) {
            Ok(order) => {
                order.apply(items);
                info!(codes = order.len(), "items reordered by reference");
            }
            Err(e) => self.notice(format!(
                "Reference ordering skipped ({}): {}",
                reference.display(),
                e
            )),
        }
    }

    /// Merge-aware write; returns the cell actually written.
    pub fn write(
        &mut self,
        target: CellRef,
        value: WriteValue<'_>,
        number_format: Option<&str>,
    ) -> CellRef {
        let anchor = self.merges.resolve(target);
        write_cell(self.book.get_active_sheet_mut(), anchor, value, number_format);
        anchor
    }

    pub fn write_fields(&mut self, fields: &ExtractedFields, date: &str) {
        for (anchor, source) in self.spec.fields {
            let value = source.value(fields, date);
            match anchor.parse::<CellRef>() {
                Ok(cell) => {
                    self.write(cell, WriteValue::Text(&value), None);
                }
                Err(e) => warn!(anchor = %anchor, error = %e, "bad field anchor"),
            }
        }
    }

    /// Write every category block starting at the layout's first item row.
    pub fn write_items(&mut self, items: &[LineItem]) -> ReportResult<()> {
        let spec = self.spec;
        let groups = category_groups(items);

        let needed = rows_needed(&groups);
        let available = spec.first_totals_row - spec.first_item_row;
        if needed > available {
            return Err(ReportError::TableOverflow { needed, available });
        }

        let description_width = spec.description_width;
        self.sheet()
            .get_column_dimension_mut(spec.columns.description)
            .set_width(description_width);

        let mut row = spec.first_item_row;
        for group in &groups {
            self.write_category_header(row, group);
            row += 1;

            let first = row;
            for item in &group.items {
                self.write_item_row(row, item);
                row += 1;
            }
            self.write_subtotal_row(row, first, row - 1);
            self.last_table_row = Some(row);
            row += 2;
        }
        info!(categories = groups.len(), items = items.len(), "wrote item table");
        Ok(())
    }

    fn write_category_header(&mut self, row: u32, group: &CategoryGroup<'_>) {
        let cols = self.spec.columns;
        let prefix = group
            .items
            .iter()
            .find_map(|item| code_prefix(&item.code))
            .unwrap_or_default();

        for (column, text) in [(cols.code, prefix.as_str()), (cols.description, group.label)] {
            let cell = CellRef::at(column, row);
            if self.spec.skip_populated_merged_header && self.merged_and_populated(cell) {
                debug!(cell = %cell, "category header cell already filled by template");
                continue;
            }
            let written = self.write(cell, WriteValue::Text(text), None);
            let style = self
                .sheet()
                .get_cell_mut(written.coords())
                .get_style_mut();
            style.get_font_mut().set_bold(true);
            style.set_background_color(HEADER_FILL);
        }
    }

    fn merged_and_populated(&mut self, cell: CellRef) -> bool {
        let Some(region) = self.merges.region_of(cell).copied() else {
            return false;
        };
        let value = self.sheet().get_value(region.start.coords());
        !value.trim().is_empty()
    }

    fn write_item_row(&mut self, row: u32, item: &LineItem) {
        let cols = self.spec.columns;
        let partial = normalize_money(&item.subtotal);
        let cells = [
            (cols.code, WriteValue::Text(&item.code), None),
            (cols.description, WriteValue::Text(&item.description), None),
            (cols.unit, WriteValue::Text(&item.unit), None),
            (cols.quantity, WriteValue::Number(item.quantity), None),
            (
                cols.unit_price,
                WriteValue::Number(normalize_money(&item.unit_price)),
                Some(CURRENCY_FORMAT),
            ),
            (cols.partial, WriteValue::Number(partial), Some(CURRENCY_FORMAT)),
        ];

        for (column, value, format) in cells {
            let cell = CellRef::at(column, row);
            if self.merges.is_merged(cell) {
                debug!(cell = %cell, "skipping merged item cell");
                continue;
            }
            let sheet = self.book.get_active_sheet_mut();
            set_cell_value(sheet, cell, value);
            style_written_cell(sheet, cell, format, false);
        }

        let height = estimate_row_height(&item.description, self.spec.description_width);
        self.sheet().get_row_dimension_mut(&row).set_height(height);

        if self.spec.mirror_partial {
            self.write(
                CellRef::at(cols.value, row),
                WriteValue::Number(partial),
                Some(CURRENCY_FORMAT),
            );
        }
    }

    fn write_subtotal_row(&mut self, row: u32, first: u32, last: u32) {
        let cols = self.spec.columns;
        let label = self.write(
            CellRef::at(cols.label, row),
            WriteValue::Text(SUBTOTAL_LABEL),
            None,
        );
        self.sheet()
            .get_cell_mut(label.coords())
            .get_style_mut()
            .get_font_mut()
            .set_bold(true);

        let formula = format!("SUM({col}{first}:{col}{last})", col = cols.value);
        self.write(
            CellRef::at(cols.value, row),
            WriteValue::Formula(formula),
            Some(CURRENCY_FORMAT),
        );

        for column in PRINT_COLUMNS {
            let cell = CellRef::at(column, row);
            if self.merges.resolve(cell) != cell {
                continue;
            }
            self.sheet()
                .get_cell_mut(cell.coords())
                .get_style_mut()
                .set_background_color(HEADER_FILL);
        }
    }

    /// Rows of the table area whose label cell reads "SUBTOTAL"
    pub fn subtotal_rows(&mut self) -> Vec<u32> {
        let spec = self.spec;
        let sheet = self.sheet();
        (spec.first_item_row..spec.first_totals_row)
            .filter(|row| {
                let value = sheet.get_value(CellRef::at(spec.columns.label, *row).coords());
                value.trim().eq_ignore_ascii_case(SUBTOTAL_LABEL)
            })
            .collect()
    }

    /// Grand subtotal over the SUBTOTAL rows, then tax, markup, total and
    /// the final value as chained formulas.
    pub fn write_totals(&mut self) {
        let spec = self.spec;
        let totals = spec.totals;
        let subtotal_refs: Vec<String> = self
            .subtotal_rows()
            .into_iter()
            .map(|row| format!("{}{}", spec.columns.value, row))
            .collect();
        let subtotal_formula = if subtotal_refs.is_empty() {
            "0".to_string()
        } else {
            format!("SUM({})", subtotal_refs.join(","))
        };
        debug!(formula = %subtotal_formula, "grand subtotal");

        let mut formulas = vec![(totals.subtotal, subtotal_formula)];
        if let Some(tax) = totals.tax {
            formulas.push((tax, format!("{}*{}", totals.subtotal, TAX_RATE)));
        }
        if let Some(markup) = totals.markup {
            formulas.push((markup, format!("{}*{}", totals.subtotal, MARKUP_RATE)));
        }
        let final_source = match totals.total {
            Some(total) => {
                let parts: Vec<&str> = std::iter::once(totals.subtotal)
                    .chain(totals.tax)
                    .chain(totals.markup)
                    .collect();
                formulas.push((total, parts.join("+")));
                total
            }
            None => totals.subtotal,
        };
        formulas.push((totals.final_value, final_source.to_string()));

        for (anchor, formula) in formulas {
            match anchor.parse::<CellRef>() {
                Ok(cell) => {
                    self.write(cell, WriteValue::Formula(formula), Some(CURRENCY_FORMAT));
                }
                Err(e) => warn!(anchor = %anchor, error = %e, "bad totals anchor"),
            }
        }
    }

    pub fn write_technician(&mut self, fields: &ExtractedFields) {
        let anchors = [
            (self.spec.technician_name, fields.tecnico_nombre.as_str()),
            (self.spec.technician_id, fields.tecnico_cedula.as_str()),
        ];
        for (anchor, value) in anchors {
            if let Ok(cell) = anchor.parse::<CellRef>() {
                self.write(cell, WriteValue::Text(value), None);
            }
        }
    }

    /// Hide empty rows between the end of the item table and the totals.
    pub fn hide_unused_rows(&mut self) {
        let spec = self.spec;
        let start = self
            .last_table_row
            .unwrap_or(spec.first_item_row.saturating_sub(1))
            + 1;
        let sheet = self.book.get_active_sheet_mut();
        let mut hidden = 0;
        for row in start..spec.first_totals_row {
            let empty = PRINT_COLUMNS
                .iter()
                .all(|column| cell_is_empty(sheet, CellRef::at(column, row)));
            if empty {
                sheet.get_row_dimension_mut(&row).set_hidden(true);
                hidden += 1;
            }
        }
        debug!(hidden, "hid unused table rows");
    }

    /// Give every empty, non-covered cell of the printable grid an explicit
    /// empty string.
    pub fn fill_blanks(&mut self) {
        let print_rows = self.spec.print_rows;
        let merges = &self.merges;
        let sheet = self.book.get_active_sheet_mut();
        for row in 1..=print_rows {
            for column in PRINT_COLUMNS {
                let cell = CellRef::at(column, row);
                if merges.resolve(cell) != cell {
                    continue;
                }
                if cell_is_empty(sheet, cell) {
                    sheet.get_cell_mut(cell.coords()).set_value_string("");
                }
            }
        }
    }

    /// Print area A1:G<last row>, fit to one page wide, portrait.
    pub fn setup_page(&mut self) -> ReportResult<()> {
        let print_rows = self.spec.print_rows;
        let sheet = self.sheet();
        let last_row = print_rows.max(sheet.get_highest_row());
        let address = format!(
            "'{}'!$A$1:${}${}",
            sheet.get_name(),
            PRINT_COLUMNS[PRINT_COLUMNS.len() - 1],
            last_row
        );

        match sheet
            .get_defined_names_mut()
            .iter_mut()
            .find(|d| d.get_name() == PRINT_AREA)
        {
            Some(existing) => {
                existing.set_address(address);
            }
            None => {
                sheet
                    .add_defined_name(PRINT_AREA.to_string(), address)
                    .map_err(|e| ReportError::Spreadsheet(format!("print area: {}", e)))?;
            }
        }

        let page = sheet.get_page_setup_mut();
        page.set_fit_to_width(1);
        page.set_fit_to_height(0);
        page.set_orientation(OrientationValues::Portrait);

        let margins = sheet.get_page_margins_mut();
        margins.set_left(0.5);
        margins.set_right(0.5);
        margins.set_top(0.75);
        margins.set_bottom(0.75);
        Ok(())
    }

    /// Embed the technician's signature when the layout has a slot for it.
    pub fn place_signature(&mut self, dir: &Path, technician: &str) {
        let Some(signature) = self.spec.signature else {
            return;
        };
        match find_signature(dir, technician) {
            Some(path) => match embed_signature(self.sheet(), &path, &signature) {
                Ok(()) => info!(image = %path.display(), "embedded technician signature"),
                Err(e) => self.notice(format!("Signature skipped: {}", e)),
            },
            None => {
                let file = signature_file_name(technician).unwrap_or_else(|| "(sin nombre)".into());
                self.notice(format!(
                    "Signature not found: {} in {}",
                    file,
                    dir.display()
                ));
            }
        }
    }

    /// Serialize the workbook and hand back the bytes with the notices.
    pub fn finish(self) -> ReportResult<RenderOutput> {
        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buffer)
            .map_err(|e| ReportError::Spreadsheet(format!("Failed to write workbook: {}", e)))?;
        Ok(RenderOutput {
            bytes: buffer.into_inner(),
            notices: self.notices,
        })
    }
}

/// Rows the item table occupies: per category a header, its items and a
/// subtotal, with one blank row between categories.
fn rows_needed(groups: &[CategoryGroup<'_>]) -> u32 {
    let rows: usize = groups.iter().map(|g| g.items.len() + 2).sum();
    (rows + groups.len().saturating_sub(1)) as u32
}

/// Leading 1–3 digit group of an item code ("12.03" → "12")
pub fn code_prefix(code: &str) -> Option<String> {
    static PREFIX: OnceLock<Option<Regex>> = OnceLock::new();
    let re = PREFIX
        .get_or_init(|| Regex::new(r"^\s*(\d{1,3})").ok())
        .as_ref()?;
    re.captures(code).map(|c| c[1].to_string())
}

/// Combine an existing cell text with a new one.
///
/// The new text is appended after a space unless the existing text already
/// contains it; an empty cell just takes the new text.
pub fn merge_text(existing: &str, new: &str) -> String {
    if !existing.is_empty() && !existing.contains(new.trim()) {
        format!("{} {}", existing, new).trim().to_string()
    } else if !existing.is_empty() {
        existing.to_string()
    } else {
        new.to_string()
    }
}

/// Row height that fits `text` wrapped in a column `width` characters wide
pub fn estimate_row_height(text: &str, width: f64) -> f64 {
    let width = width.max(1.0) as usize;
    let lines: usize = text
        .split('\n')
        .map(|segment| segment.chars().count() / width + 1)
        .sum();
    (BASE_ROW_HEIGHT * lines as f64).max(BASE_ROW_HEIGHT)
}

/// Write `value` into `cell` with the concatenating rule for text, then
/// apply the report's text style.
pub fn write_cell(
    sheet: &mut Worksheet,
    cell: CellRef,
    value: WriteValue<'_>,
    number_format: Option<&str>,
) {
    let value = match value {
        WriteValue::Text(text) => {
            let existing = sheet.get_value(cell.coords());
            let merged = merge_text(&existing, text);
            debug!(cell = %cell, value = %merged, "write");
            sheet.get_cell_mut(cell.coords()).set_value_string(merged);
            None
        }
        other => Some(other),
    };
    if let Some(value) = value {
        debug!(cell = %cell, value = ?value, "write");
        set_cell_value(sheet, cell, value);
    }
    style_written_cell(sheet, cell, number_format, true);
}

fn set_cell_value(sheet: &mut Worksheet, cell: CellRef, value: WriteValue<'_>) {
    let target = sheet.get_cell_mut(cell.coords());
    match value {
        WriteValue::Text(text) => {
            target.set_value_string(text);
        }
        WriteValue::Number(n) => {
            target.set_value_number(n);
        }
        WriteValue::Formula(formula) => {
            target.set_formula(formula);
        }
    }
}

fn style_written_cell(
    sheet: &mut Worksheet,
    cell: CellRef,
    number_format: Option<&str>,
    report_font: bool,
) {
    let style = sheet.get_cell_mut(cell.coords()).get_style_mut();
    let alignment = style.get_alignment_mut();
    alignment.set_horizontal(HorizontalAlignmentValues::Left);
    alignment.set_wrap_text(true);
    if report_font {
        let font = style.get_font_mut();
        font.set_name(FONT_NAME);
        font.set_size(FONT_SIZE);
        font.get_color_mut().set_argb(FONT_COLOR);
    }
    if let Some(format) = number_format {
        style.get_number_format_mut().set_format_code(format);
    }
}

/// No value and no formula
fn cell_is_empty(sheet: &Worksheet, cell: CellRef) -> bool {
    match sheet.get_cell(cell.coords()) {
        None => true,
        Some(c) => c.get_value().trim().is_empty() && c.get_formula().is_empty(),
    }
}
