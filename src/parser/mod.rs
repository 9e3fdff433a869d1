//! Extraction of beneficiary/technician data and the activity table from a
//! raw work-order export.
//!
//! The export is a hybrid document: free-text `key: value` lines followed by
//! a comma-delimited table that starts at a header line beginning with
//! `item,` and stops at a `TOTAL GENERAL` line.

pub mod text;

use crate::types::{ExtractedFields, LineItem};
use text::{
    decode_single_byte, normalize_money, normalize_text, repair_known_mojibake,
    MOJIBAKE_CATEGORY_HEADER,
};
use tracing::{debug, info, warn};

/// Header names of the activity table columns we read
pub mod columns {
    pub const ITEM: &str = "Item";
    pub const CATEGORY: &str = "Categoría";
    pub const DESCRIPTION: &str = "Actividad Obra";
    pub const UNIT: &str = "Un";
    pub const QUANTITY: &str = "Cant";
    pub const UNIT_PRICE: &str = "V. Unitario";
    pub const PARTIAL: &str = "V. Parcial";
}

/// Result of looking for the activity table.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemExtraction {
    /// Table found; items in source order (possibly empty)
    Found(Vec<LineItem>),
    /// No line starting with `item,` exists in the document
    NoHeader,
}

impl ItemExtraction {
    /// Items found, or an empty slice when the header was missing
    pub fn items(&self) -> &[LineItem] {
        match self {
            ItemExtraction::Found(items) => items,
            ItemExtraction::NoHeader => &[],
        }
    }

    pub fn into_items(self) -> Vec<LineItem> {
        match self {
            ItemExtraction::Found(items) => items,
            ItemExtraction::NoHeader => Vec::new(),
        }
    }

    pub fn is_no_header(&self) -> bool {
        matches!(self, ItemExtraction::NoHeader)
    }
}

/// Everything recovered from one export.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub fields: ExtractedFields,
    pub items: ItemExtraction,
}

/// Decode an export and extract both the header fields and the item table.
///
/// # Example
/// ```
/// use royalbit_reporte::parser::extract;
///
/// let raw = "Nombre: Juan\n\
///            Item,Categoría,Actividad Obra,Un,Cant,V. Unitario,V. Parcial\n\
///            1.01,Pisos,Enchape,m2,2,\"$10.000\",\"$20.000\"\n\
///            TOTAL GENERAL,,,,,,\"$20.000\"\n";
/// let extraction = extract(raw.as_bytes());
/// assert_eq!(extraction.fields.nombre, "Juan");
/// assert_eq!(extraction.items.items().len(), 1);
/// ```
pub fn extract(raw: &[u8]) -> Extraction {
    let (fields, lines) = parse_fields(raw);
    let items = parse_items(&lines);
    Extraction { fields, items }
}

/// Decode the export and pull the beneficiary/technician fields out of its
/// `key: value` lines.
///
/// Returns the fields together with the decoded lines (before any repair) so
/// the item table can be parsed from the same text.
pub fn parse_fields(raw: &[u8]) -> (ExtractedFields, Vec<String>) {
    let content = decode_single_byte(raw);
    let lines: Vec<String> = content.lines().map(str::to_string).collect();

    let mut fields = ExtractedFields::default();
    for line in &lines {
        let line = repair_known_mojibake(line);
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = normalize_text(&clean_value(value));
        if let Some(slot) = field_slot(&mut fields, &key) {
            debug!(key = %key, value = %value, "matched field line");
            *slot = value;
        }
    }

    info!(
        beneficiary = %fields.nombre,
        technician = %fields.tecnico_nombre,
        "extracted header fields"
    );
    (fields, lines)
}

/// Strip CSV quoting and padding from the right-hand side of a field line.
///
/// Values usually sit in the next CSV cell (`Nombre:,"Juan",,`), so quotes
/// and the surrounding separator commas are removed.
fn clean_value(value: &str) -> String {
    value
        .replace('"', "")
        .trim()
        .trim_start_matches(',')
        .trim_end_matches(',')
        .trim()
        .to_string()
}

/// Pick the field a lower-cased key belongs to.
///
/// Technician keys are tested first so "nombre técnico" never lands in the
/// beneficiary name, and the generic keys explicitly reject the qualifier.
fn field_slot<'a>(fields: &'a mut ExtractedFields, key: &str) -> Option<&'a mut String> {
    const TECH: &str = "técnico";
    let slot = if key.contains("nombre técnico") {
        &mut fields.tecnico_nombre
    } else if key.contains("cédula técnico") {
        &mut fields.tecnico_cedula
    } else if key.contains("cargo técnico") {
        &mut fields.tecnico_cargo
    } else if key.contains("nombre") && !key.contains(TECH) {
        &mut fields.nombre
    } else if key.contains("cédula") && !key.contains(TECH) {
        &mut fields.cedula
    } else if key.contains("dirección") {
        &mut fields.direccion
    } else if key.contains("teléfono 1") {
        &mut fields.telefono
    } else if key.contains("teléfono 2") {
        &mut fields.telefono2
    } else if key.contains("id hogar") {
        &mut fields.idhogar
    } else {
        return None;
    };
    Some(slot)
}

/// Locate and parse the activity table.
///
/// The table runs from the first line beginning with `item,` (any case) up
/// to, but excluding, the first later line containing `TOTAL GENERAL`.
pub fn parse_items(lines: &[String]) -> ItemExtraction {
    let Some(start) = lines
        .iter()
        .position(|l| l.to_lowercase().starts_with("item,"))
    else {
        warn!("no activity table header found");
        return ItemExtraction::NoHeader;
    };
    let end = lines[start..]
        .iter()
        .position(|l| l.to_uppercase().contains("TOTAL GENERAL"))
        .map_or(lines.len(), |offset| start + offset);

    let table = lines[start..end].join("\n");
    let items = parse_table(&table);
    info!(rows = items.len(), "parsed activity table");
    ItemExtraction::Found(items)
}

/// Column positions resolved from the table header
struct ColumnIndex {
    headers: Vec<String>,
}

impl ColumnIndex {
    fn new(raw_headers: &csv::StringRecord) -> Self {
        let headers = raw_headers
            .iter()
            .map(|h| {
                let h = normalize_text(h.trim());
                if h == MOJIBAKE_CATEGORY_HEADER {
                    columns::CATEGORY.to_lowercase()
                } else {
                    h.to_lowercase()
                }
            })
            .collect();
        Self { headers }
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, name: &str) -> &'r str {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .position(|h| *h == name)
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
    }
}

fn parse_table(table: &str) -> Vec<LineItem> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(table.as_bytes());

    let index = match reader.headers() {
        Ok(headers) => ColumnIndex::new(headers),
        Err(e) => {
            warn!(error = %e, "activity table header could not be read");
            return Vec::new();
        }
    };

    let mut items = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(row = row + 1, error = %e, "skipping malformed activity row");
                continue;
            }
        };
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let text = |name: &str| normalize_text(index.get(&record, name).trim());
        let category = text(columns::CATEGORY);
        let item = LineItem {
            code: text(columns::ITEM),
            category: (!category.is_empty()).then_some(category),
            description: text(columns::DESCRIPTION),
            unit: text(columns::UNIT),
            quantity: normalize_money(index.get(&record, columns::QUANTITY)),
            unit_price: text(columns::UNIT_PRICE),
            subtotal: text(columns::PARTIAL),
        };
        debug!(code = %item.code, category = ?item.category, "parsed activity row");
        items.push(item);
    }
    items
}
