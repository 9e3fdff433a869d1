//! Technician signature images, looked up by normalized name.

use super::layout::SignatureSpec;
use crate::error::{ReportError, ReportResult};
use crate::parser::text::ascii_slug;
use std::path::{Path, PathBuf};
use umya_spreadsheet::structs::drawing::spreadsheet::MarkerType;
use umya_spreadsheet::structs::Image;
use umya_spreadsheet::Worksheet;

pub const SIGNATURE_EXTENSION: &str = "png";

/// EMUs per pixel at 96 DPI
const EMU_PER_PIXEL: i64 = 9525;

/// File name of a technician's signature ("Ana Gómez" → "ana_gomez.png").
/// `None` when the name is blank.
pub fn signature_file_name(technician: &str) -> Option<String> {
    let slug = ascii_slug(technician);
    (!slug.is_empty()).then(|| format!("{}.{}", slug, SIGNATURE_EXTENSION))
}

/// Path of the technician's signature in `dir`, if the file exists.
pub fn find_signature(dir: &Path, technician: &str) -> Option<PathBuf> {
    let path = dir.join(signature_file_name(technician)?);
    path.is_file().then_some(path)
}

/// Place the image at the layout's anchor, scaled to the fixed size.
///
/// The file must decode as an image; the sheet is left untouched otherwise.
pub fn embed_signature(
    sheet: &mut Worksheet,
    image_path: &Path,
    spec: &SignatureSpec,
) -> ReportResult<()> {
    image::open(image_path).map_err(|e| ReportError::Image {
        path: image_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut marker = MarkerType::default();
    marker.set_coordinate(spec.anchor);

    let mut image = Image::default();
    image.new_image(&image_path.to_string_lossy(), marker);
    if let Some(anchor) = image.get_one_cell_anchor_mut() {
        let extent = anchor.get_extent_mut();
        extent.set_cx(spec.width_px as i64 * EMU_PER_PIXEL);
        extent.set_cy(spec.height_px as i64 * EMU_PER_PIXEL);
    }
    sheet.add_image(image);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_signature_file_name() {
        assert_eq!(
            signature_file_name(" Ana Gómez ").as_deref(),
            Some("ana_gomez.png")
        );
        assert_eq!(signature_file_name("   "), None);
    }

    #[test]
    fn test_find_signature_present() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ana_gomez.png"), b"png").unwrap();
        let found = find_signature(dir.path(), "Ana Gómez");
        assert_eq!(found, Some(dir.path().join("ana_gomez.png")));
    }

    #[test]
    fn test_embed_rejects_undecodable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ana_gomez.png");
        std::fs::write(&path, b"not really a png").unwrap();
        let spec = SignatureSpec {
            anchor: "B100",
            width_px: 180,
            height_px: 70,
        };

        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_active_sheet_mut();
        let result = embed_signature(sheet, &path, &spec);
        assert!(matches!(result, Err(ReportError::Image { .. })));
        assert!(sheet.get_image_collection().is_empty());
    }

    #[test]
    fn test_find_signature_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_signature(dir.path(), "Ana Gómez"), None);
        assert_eq!(find_signature(dir.path(), ""), None);
    }
}
