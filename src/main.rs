use anyhow::Context;
use clap::{Parser, Subcommand};
use royalbit_reporte::cli;
use royalbit_reporte::config::ReportConfig;
use royalbit_reporte::types::Layout;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reporte")]
#[command(about = "Fill the Medellín/Findeter Excel report templates from a work-order export")]
#[command(long_about = "Reporte - work-order exports to Excel report templates

Reads the CSV-like export of a work order, repairs garbled accents, extracts
the beneficiary and technician data plus the activity table, and writes them
into the selected report template with per-category subtotals and totals.

COMMANDS:
  render   - Fill a template and write Reporte_<Layout>_<timestamp>.xlsx
  inspect  - Show what would be extracted from an export

EXAMPLES:
  reporte inspect orden.csv
  reporte render orden.csv --layout medellin --templates-dir plantillas
  reporte render orden.csv -l findeter --signatures-dir firmas -o reportes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a report template from a work-order export
    Render {
        /// Path to the exported work order (CSV-like text)
        input: PathBuf,

        /// Target template layout (medellin or findeter)
        #[arg(short, long)]
        layout: Layout,

        /// Directory holding Plantilla_Medellin_Final.xlsx / Plantilla_Findeter_Final.xlsx
        #[arg(short, long, env = "REPORTE_TEMPLATES_DIR")]
        templates_dir: Option<PathBuf>,

        /// Spreadsheet listing item codes in canonical order
        #[arg(short, long, env = "REPORTE_REFERENCE")]
        reference: Option<PathBuf>,

        /// Directory of technician signature images (<name>.png)
        #[arg(short, long, env = "REPORTE_SIGNATURES_DIR")]
        signatures_dir: Option<PathBuf>,

        /// Directory the report is written to
        #[arg(short, long, env = "REPORTE_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Show progress and debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the fields and line items extracted from an export
    Inspect {
        /// Path to the exported work order
        input: PathBuf,

        /// Print the extraction as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "royalbit_reporte=debug"
    } else {
        "royalbit_reporte=warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            layout,
            templates_dir,
            reference,
            signatures_dir,
            output_dir,
            verbose,
        } => {
            init_tracing(verbose);
            let config =
                ReportConfig::with_overrides(templates_dir, reference, signatures_dir, output_dir);
            cli::render(input.clone(), layout, &config, verbose)
                .with_context(|| format!("Failed to render report from {}", input.display()))?;
        }

        Commands::Inspect { input, json } => {
            init_tracing(false);
            cli::inspect(input.clone(), json)
                .with_context(|| format!("Failed to inspect {}", input.display()))?;
        }
    }
    Ok(())
}
