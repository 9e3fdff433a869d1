//! Text decoding and repair for the exported work-order files.
//!
//! Exports arrive in a single-byte Western encoding, but many of them carry
//! UTF-8 text that was decoded as single-byte somewhere upstream ("Cédula"
//! shows up as "CÃ©dula"). Two repairs are applied:
//!
//! - [`repair_known_mojibake`]: a fixed, ordered table of corrupted key
//!   words. This is a heuristic with known blind spots: any accented word not
//!   in the table stays corrupted.
//! - [`normalize_text`]: re-encodes a value and decodes it as UTF-8, keeping
//!   the original when that fails, then applies NFC.

use encoding_rs::{UTF_8, WINDOWS_1252};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Known corrupted substrings and their repaired form, applied in order.
///
/// Each corrupted form is what the UTF-8 bytes of the repaired word look
/// like after a Windows-1252 decode.
pub const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[
    ("C\u{c3}\u{a9}dula", "Cédula"),
    ("Tel\u{c3}\u{a9}fono", "Teléfono"),
    ("Direcci\u{c3}\u{b3}n", "Dirección"),
    ("T\u{c3}\u{a9}cnico", "Técnico"),
    (
        "INFORMACI\u{c3}\u{201c}N DEL T\u{c3}\u{2030}CNICO",
        "INFORMACIÓN DEL TÉCNICO",
    ),
];

/// Corrupted form of the "Categoría" column header.
pub const MOJIBAKE_CATEGORY_HEADER: &str = "Categor\u{c3}\u{ad}a";

/// Decode raw export bytes with the single-byte Western encoding.
///
/// Every byte maps to exactly one character, so this never fails.
pub fn decode_single_byte(bytes: &[u8]) -> String {
    let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Apply [`MOJIBAKE_REPAIRS`] to a line.
pub fn repair_known_mojibake(line: &str) -> String {
    MOJIBAKE_REPAIRS
        .iter()
        .fold(line.to_string(), |acc, (bad, good)| acc.replace(bad, good))
}

/// Undo a UTF-8-as-single-byte decode when possible, then compose to NFC.
///
/// The value is re-encoded to single-byte and the bytes decoded as strict
/// UTF-8. Text that was never corrupted (plain ASCII, or genuine single-byte
/// accents that don't form valid UTF-8) comes back unchanged.
pub fn normalize_text(text: &str) -> String {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    let repaired = if unmappable {
        None
    } else {
        UTF_8
            .decode_without_bom_handling_and_without_replacement(&bytes)
            .map(|s| s.into_owned())
    };
    repaired.as_deref().unwrap_or(text).nfc().collect()
}

/// Parse a quantity or monetary value into a two-decimal-truncated number.
///
/// Values are read as locale-formatted currency: an optional `$`, `.` as
/// thousands separator and `,` as decimal separator, so "12.500" is 12500.
/// The only machine-format decimal accepted is a single `.` not followed by
/// exactly three digits ("2.5", "1234.56"). Unparseable input yields `0.0`.
pub fn normalize_money(text: &str) -> f64 {
    let trimmed = text.trim();
    let value = if is_plain_decimal(trimmed) {
        trimmed.parse::<f64>().ok()
    } else {
        trimmed
            .replace('$', "")
            .replace('.', "")
            .replace(',', ".")
            .trim()
            .parse::<f64>()
            .ok()
    };
    match value {
        Some(v) if v.is_finite() => (v * 100.0).trunc() / 100.0,
        _ => 0.0,
    }
}

/// Digits with at most one `.` that can't be a thousands separator
fn is_plain_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    !int.is_empty()
        && all_digits(int)
        && all_digits(frac)
        && !frac.is_empty()
        && frac.len() != 3
}

/// Lower-case ASCII file stem for a person's name: diacritics stripped and
/// spaces replaced by underscores ("Ana Gómez" → "ana_gomez").
pub fn ascii_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// UTF-8 bytes of `s` read back as single-byte text
    fn garble(s: &str) -> String {
        decode_single_byte(s.as_bytes())
    }

    #[test]
    fn test_repair_table_matches_real_corruption() {
        for (bad, good) in MOJIBAKE_REPAIRS {
            assert_eq!(&garble(good), bad, "table entry for {}", good);
        }
        assert_eq!(garble("Categoría"), MOJIBAKE_CATEGORY_HEADER);
    }

    #[test]
    fn test_repair_known_mojibake_line() {
        let line = garble("Cédula Técnico: 123");
        assert_eq!(repair_known_mojibake(&line), "Cédula Técnico: 123");
    }

    #[test]
    fn test_repair_leaves_unknown_words() {
        let line = garble("Municipio: Medellín");
        assert_eq!(repair_known_mojibake(&line), line);
    }

    #[test]
    fn test_normalize_text_repairs_value() {
        assert_eq!(normalize_text(&garble("Juan Pérez")), "Juan Pérez");
        assert_eq!(normalize_text(&garble("Ñoño Muñoz")), "Ñoño Muñoz");
    }

    #[test]
    fn test_normalize_text_keeps_clean_text() {
        assert_eq!(normalize_text("Juan Perez"), "Juan Perez");
        // Genuine single-byte accents are not valid UTF-8 once re-encoded
        assert_eq!(normalize_text("Juan Pérez"), "Juan Pérez");
    }

    #[test]
    fn test_normalize_text_keeps_unencodable_text() {
        assert_eq!(normalize_text("Gómez 🚧"), "Gómez 🚧");
    }

    #[test]
    fn test_normalize_text_composes() {
        let decomposed = "Pe\u{301}rez";
        assert_eq!(normalize_text(decomposed), "P\u{e9}rez");
    }

    #[test]
    fn test_normalize_money_locale() {
        assert_eq!(normalize_money("$1.234,56"), 1234.56);
        assert_eq!(normalize_money("$ 25.000"), 25000.0);
        assert_eq!(normalize_money("3,5"), 3.5);
    }

    #[test]
    fn test_normalize_money_plain_numbers() {
        assert_eq!(normalize_money("2"), 2.0);
        assert_eq!(normalize_money(" 1234.5 "), 1234.5);
        assert_eq!(normalize_money("1234.56"), 1234.56);
    }

    #[test]
    fn test_normalize_money_thousands_without_symbol() {
        assert_eq!(normalize_money("12.500"), 12500.0);
        assert_eq!(normalize_money("25.000"), 25000.0);
        assert_eq!(normalize_money("1.250.000"), 1250000.0);
        assert_eq!(normalize_money("12.500"), normalize_money("$12.500"));
    }

    #[test]
    fn test_normalize_money_truncates() {
        assert_eq!(normalize_money("10,129"), 10.12);
        assert_eq!(normalize_money("-4,567"), -4.56);
    }

    #[test]
    fn test_normalize_money_unparseable() {
        assert_eq!(normalize_money("n/a"), 0.0);
        assert_eq!(normalize_money(""), 0.0);
        assert_eq!(normalize_money("$"), 0.0);
    }

    #[test]
    fn test_ascii_slug() {
        assert_eq!(ascii_slug("  Ana Gómez "), "ana_gomez");
        assert_eq!(ascii_slug("JOSÉ MUÑOZ"), "jose_munoz");
    }
}
