//! Fixed geometry of the two report templates.

use crate::types::{ExtractedFields, Layout};

/// Which extracted value goes into a fixed anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Name,
    IdNumber,
    Phones,
    Address,
    HouseholdId,
    Date,
}

impl FieldSource {
    pub fn value(&self, fields: &ExtractedFields, date: &str) -> String {
        match self {
            FieldSource::Name => fields.nombre.clone(),
            FieldSource::IdNumber => fields.cedula.clone(),
            FieldSource::Phones => fields.phones(),
            FieldSource::Address => fields.direccion.clone(),
            FieldSource::HouseholdId => fields.idhogar.clone(),
            FieldSource::Date => date.to_string(),
        }
    }
}

/// Column letters of the activity table
#[derive(Debug, Clone, Copy)]
pub struct TableColumns {
    pub code: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    pub quantity: &'static str,
    pub unit_price: &'static str,
    pub partial: &'static str,
    /// Column of the "SUBTOTAL" label on subtotal rows
    pub label: &'static str,
    /// Column summed by the subtotal formulas
    pub value: &'static str,
}

/// Anchors of the totals block. Layouts without tax/markup leave them out,
/// in which case the final value equals the subtotal.
#[derive(Debug, Clone, Copy)]
pub struct TotalsAnchors {
    pub subtotal: &'static str,
    pub tax: Option<&'static str>,
    pub markup: Option<&'static str>,
    pub total: Option<&'static str>,
    pub final_value: &'static str,
}

/// Signature image placement
#[derive(Debug, Clone, Copy)]
pub struct SignatureSpec {
    pub anchor: &'static str,
    pub width_px: u32,
    pub height_px: u32,
}

/// Everything the writer needs to know about one template
#[derive(Debug, Clone, Copy)]
pub struct LayoutSpec {
    pub layout: Layout,
    pub template_file: &'static str,
    pub fields: &'static [(&'static str, FieldSource)],
    pub columns: TableColumns,
    pub first_item_row: u32,
    /// First row of the totals block; the item table must end above it
    pub first_totals_row: u32,
    pub totals: TotalsAnchors,
    pub technician_name: &'static str,
    pub technician_id: &'static str,
    /// Skip a category header whose anchor is in a merge region that already
    /// holds a value, instead of writing through it
    pub skip_populated_merged_header: bool,
    /// Copy each item's partial value into the subtotal column as well
    pub mirror_partial: bool,
    pub signature: Option<SignatureSpec>,
    pub description_width: f64,
    /// Last row of the printable grid (columns A–G)
    pub print_rows: u32,
}

pub const PRINT_COLUMNS: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

pub const TAX_RATE: f64 = 0.12;
pub const MARKUP_RATE: f64 = 0.016;

pub const CURRENCY_FORMAT: &str = "\"$\"#,##0.00";
pub const HEADER_FILL: &str = "FFD3D3D3";

pub static MEDELLIN: LayoutSpec = LayoutSpec {
    layout: Layout::Medellin,
    template_file: "Plantilla_Medellin_Final.xlsx",
    fields: &[
        ("C7", FieldSource::Name),
        ("C8", FieldSource::IdNumber),
        ("C9", FieldSource::Phones),
        ("D8", FieldSource::Address),
        ("G7", FieldSource::HouseholdId),
        ("G4", FieldSource::Date),
        ("G9", FieldSource::Date),
        ("E101", FieldSource::Name),
        ("F100", FieldSource::IdNumber),
    ],
    columns: TableColumns {
        code: "B",
        description: "C",
        unit: "D",
        quantity: "E",
        unit_price: "F",
        partial: "G",
        label: "F",
        value: "G",
    },
    first_item_row: 14,
    first_totals_row: 77,
    totals: TotalsAnchors {
        subtotal: "G77",
        tax: Some("G81"),
        markup: Some("G82"),
        total: Some("G83"),
        final_value: "G85",
    },
    technician_name: "B101",
    technician_id: "C100",
    skip_populated_merged_header: true,
    mirror_partial: false,
    signature: None,
    description_width: 60.0,
    print_rows: 106,
};

pub static FINDETER: LayoutSpec = LayoutSpec {
    layout: Layout::Findeter,
    template_file: "Plantilla_Findeter_Final.xlsx",
    fields: &[
        ("F15", FieldSource::Name),
        ("E16", FieldSource::IdNumber),
        ("F17", FieldSource::Phones),
        ("B16", FieldSource::Address),
        ("B17", FieldSource::IdNumber),
        ("G5", FieldSource::HouseholdId),
        ("G6", FieldSource::Date),
    ],
    columns: TableColumns {
        code: "A",
        description: "B",
        unit: "C",
        quantity: "D",
        unit_price: "E",
        partial: "F",
        label: "F",
        value: "G",
    },
    first_item_row: 31,
    first_totals_row: 93,
    totals: TotalsAnchors {
        subtotal: "G93",
        tax: None,
        markup: None,
        total: None,
        final_value: "G94",
    },
    technician_name: "B104",
    technician_id: "B105",
    skip_populated_merged_header: false,
    mirror_partial: true,
    signature: Some(SignatureSpec {
        anchor: "B100",
        width_px: 180,
        height_px: 70,
    }),
    description_width: 60.0,
    print_rows: 106,
};

impl LayoutSpec {
    pub fn for_layout(layout: Layout) -> &'static LayoutSpec {
        match layout {
            Layout::Medellin => &MEDELLIN,
            Layout::Findeter => &FINDETER,
        }
    }
}
