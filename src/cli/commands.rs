use crate::config::ReportConfig;
use crate::error::{ReportError, ReportResult};
use crate::excel;
use crate::parser::{self, Extraction};
use crate::types::{ExtractedFields, Layout, LineItem};
use chrono::{Local, NaiveDateTime};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Line items shown by `inspect`
const PREVIEW_ROWS: usize = 10;

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    format!("{:.2}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Output file name for a report rendered at `timestamp`
pub fn report_file_name(layout: Layout, timestamp: NaiveDateTime) -> String {
    format!(
        "Reporte_{}_{}.xlsx",
        layout.slug(),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

fn read_export(input: &Path) -> ReportResult<Extraction> {
    let raw = fs::read(input)?;
    Ok(parser::extract(&raw))
}

/// Execute the render command; returns the path of the written report
pub fn render(
    input: PathBuf,
    layout: Layout,
    config: &ReportConfig,
    verbose: bool,
) -> ReportResult<PathBuf> {
    println!("{}", "📄 Reporte - Generating report".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Layout: {}\n", layout.to_string().bright_blue());

    if verbose {
        println!("{}", "📖 Reading export...".cyan());
    }

    let extraction = read_export(&input)?;
    if extraction.items.is_no_header() {
        println!(
            "{}",
            "❌ No item table found (expected a line starting with 'Item,')"
                .bold()
                .red()
        );
        return Err(ReportError::MissingItemTable(input));
    }
    let Extraction { fields, items } = extraction;
    let items = items.into_items();

    if verbose {
        println!("   Beneficiary: {}", fields.nombre);
        println!("   Technician:  {}", fields.tecnico_nombre);
        println!("   Found {} line items\n", items.len());
        println!("{}", "📊 Filling template...".cyan());
    }

    let now = Local::now();
    let options = config.render_options(now.date_naive());
    let output = excel::render(&items, &fields, layout, &options)?;

    fs::create_dir_all(&config.output_dir)?;
    let path = config
        .output_dir
        .join(report_file_name(layout, now.naive_local()));
    fs::write(&path, &output.bytes)?;

    for notice in &output.notices {
        println!("{} {}", "⚠️ ".yellow(), notice.yellow());
    }
    if !output.notices.is_empty() {
        println!();
    }

    println!("{}", "✅ Report Complete!".bold().green());
    println!("   Excel file: {}\n", path.display());

    Ok(path)
}

#[derive(Serialize)]
struct InspectReport<'a> {
    fields: &'a ExtractedFields,
    item_table_found: bool,
    items: &'a [LineItem],
}

/// Execute the inspect command
pub fn inspect(input: PathBuf, json: bool) -> ReportResult<()> {
    let extraction = read_export(&input)?;

    if json {
        let report = InspectReport {
            fields: &extraction.fields,
            item_table_found: !extraction.items.is_no_header(),
            items: extraction.items.items(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "🔍 Reporte - Inspecting export".bold().green());
    println!("   File: {}\n", input.display());

    print_fields(&extraction.fields);

    if extraction.items.is_no_header() {
        println!("{}", "⚠️  No item table found".yellow());
        return Ok(());
    }
    print_items(extraction.items.items());
    Ok(())
}

fn print_fields(fields: &ExtractedFields) {
    println!("{}", "📋 Fields".bold());
    let rows = [
        ("Nombre", &fields.nombre),
        ("Cédula", &fields.cedula),
        ("Dirección", &fields.direccion),
        ("Teléfono", &fields.telefono),
        ("Teléfono 2", &fields.telefono2),
        ("ID Hogar", &fields.idhogar),
        ("Técnico", &fields.tecnico_nombre),
        ("Cédula técnico", &fields.tecnico_cedula),
        ("Cargo técnico", &fields.tecnico_cargo),
    ];
    for (label, value) in rows {
        if value.is_empty() {
            println!("   {:<16} {}", label, "-".dimmed());
        } else {
            println!("   {:<16} {}", label, value);
        }
    }
    println!();
}

fn print_items(items: &[LineItem]) {
    println!("{} ({} total)", "📊 Items".bold(), items.len());
    for item in items.iter().take(PREVIEW_ROWS) {
        println!(
            "   {:<8} {:<20} {} [{} {}] {}",
            item.code.bright_blue(),
            item.category.as_deref().unwrap_or("-"),
            item.description,
            format_number(item.quantity),
            item.unit,
            item.subtotal
        );
    }
    if items.len() > PREVIEW_ROWS {
        println!("   ... {} more", items.len() - PREVIEW_ROWS);
    }
    println!();
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
