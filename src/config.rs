//! Run configuration for the report generator

use crate::excel::RenderOptions;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Default signatures directory, used only when it exists
pub const DEFAULT_SIGNATURES_DIR: &str = "firmas";

/// Where templates, reference data and signatures live, and where reports go
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub templates_dir: PathBuf,
    pub reference: Option<PathBuf>,
    pub signatures_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let signatures = Path::new(DEFAULT_SIGNATURES_DIR);
        Self {
            templates_dir: PathBuf::from("."),
            reference: None,
            signatures_dir: signatures.is_dir().then(|| signatures.to_path_buf()),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ReportConfig {
    /// Overlay explicit settings on the defaults; `None` keeps the default.
    pub fn with_overrides(
        templates_dir: Option<PathBuf>,
        reference: Option<PathBuf>,
        signatures_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            templates_dir: templates_dir.unwrap_or(defaults.templates_dir),
            reference: reference.or(defaults.reference),
            signatures_dir: signatures_dir.or(defaults.signatures_dir),
            output_dir: output_dir.unwrap_or(defaults.output_dir),
        }
    }

    pub fn render_options(&self, date: NaiveDate) -> RenderOptions {
        RenderOptions {
            templates_dir: self.templates_dir.clone(),
            reference: self.reference.clone(),
            signatures_dir: self.signatures_dir.clone(),
            date,
        }
    }
}
