//! Extraction tests against realistic export documents

use pretty_assertions::assert_eq;
use royalbit_reporte::parser::text::normalize_money;
use royalbit_reporte::parser::{extract, parse_fields, parse_items, ItemExtraction};
use royalbit_reporte::types::category_groups;

/// Export as produced by the field tool: UTF-8 bytes, CSV padding on every
/// line, the table after the header block.
const EXPORT: &str = "ORDEN DE TRABAJO,,,,,,\n\
INFORMACIÓN DEL BENEFICIARIO,,,,,,\n\
Nombre:,\"Juan Pérez\",,,,,\n\
Cédula:,1020304050,,,,,\n\
Dirección:,\"Calle 45, Barrio Niño Jesús\",,,,,\n\
Teléfono 1:,3001234567,,,,,\n\
Teléfono 2:,6044445566,,,,,\n\
ID Hogar:,H-778,,,,,\n\
INFORMACIÓN DEL TÉCNICO,,,,,,\n\
Nombre Técnico:,Ana Gómez,,,,,\n\
Cédula Técnico:,43111222,,,,,\n\
Cargo Técnico:,Arquitecta,,,,,\n\
,,,,,,\n\
Item,Categoría,Actividad Obra,Un,Cant,V. Unitario,V. Parcial\n\
1.01,Cimentación,Excavación manual,m3,\"2,5\",\"$10.000\",\"$25.000\"\n\
1.02,Cimentación,Relleno compactado,m3,1,\"$6.000\",\"$6.000\"\n\
,,,,,,\n\
2.01,Pisos,\"Enchape cerámico, incluye pegante\",m2,12,\"$35.000\",\"$420.000\"\n\
3.01,,Actividad sin categoría,gl,1,\"$1.000\",\"$1.000\"\n\
TOTAL GENERAL,,,,,,\"$452.000\"\n\
Observaciones: ninguna,,,,,,\n";

// ═══════════════════════════════════════════════════════════════════════════
// FIELDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_extract_all_fields() {
    let extraction = extract(EXPORT.as_bytes());
    let fields = &extraction.fields;
    assert_eq!(fields.nombre, "Juan Pérez");
    assert_eq!(fields.cedula, "1020304050");
    assert_eq!(fields.direccion, "Calle 45, Barrio Niño Jesús");
    assert_eq!(fields.telefono, "3001234567");
    assert_eq!(fields.telefono2, "6044445566");
    assert_eq!(fields.idhogar, "H-778");
    assert_eq!(fields.tecnico_nombre, "Ana Gómez");
    assert_eq!(fields.tecnico_cedula, "43111222");
    assert_eq!(fields.tecnico_cargo, "Arquitecta");
    assert_eq!(fields.phones(), "3001234567 / 6044445566");
}

#[test]
fn test_fields_missing_keys_stay_empty() {
    let (fields, lines) = parse_fields("Nombre:,Juan,,\n".as_bytes());
    assert_eq!(fields.nombre, "Juan");
    assert_eq!(fields.cedula, "");
    assert_eq!(fields.tecnico_nombre, "");
    assert_eq!(lines.len(), 1);
}

#[test]
fn test_empty_input() {
    let extraction = extract(b"");
    assert_eq!(extraction.fields, Default::default());
    assert!(extraction.items.is_no_header());
}

// ═══════════════════════════════════════════════════════════════════════════
// ITEM TABLE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_extract_items() {
    let extraction = extract(EXPORT.as_bytes());
    let items = extraction.items.items();
    assert_eq!(items.len(), 4);

    assert_eq!(items[0].code, "1.01");
    assert_eq!(items[0].category.as_deref(), Some("Cimentación"));
    assert_eq!(items[0].description, "Excavación manual");
    assert_eq!(items[0].quantity, 2.5);
    assert_eq!(items[0].unit_price, "$10.000");
    assert_eq!(items[0].subtotal, "$25.000");

    assert_eq!(items[2].description, "Enchape cerámico, incluye pegante");
    assert_eq!(items[2].quantity, 12.0);
    assert_eq!(items[3].category, None);
}

#[test]
fn test_categories_group_in_first_seen_order() {
    let extraction = extract(EXPORT.as_bytes());
    let groups = category_groups(extraction.items.items());
    let labels: Vec<&str> = groups.iter().map(|g| g.label).collect();
    assert_eq!(labels, vec!["Cimentación", "Pisos"]);
    assert_eq!(groups[0].items.len(), 2);
    assert_eq!(groups[1].items.len(), 1);
}

#[test]
fn test_header_only_table_is_found_and_empty() {
    let lines = vec![
        "Item,Categoría,Actividad Obra,Un,Cant,V. Unitario,V. Parcial".to_string(),
        "TOTAL GENERAL,,,,,,0".to_string(),
    ];
    assert_eq!(parse_items(&lines), ItemExtraction::Found(Vec::new()));
}

#[test]
fn test_total_general_before_table_is_ignored() {
    let text = "Resumen TOTAL GENERAL: 0\n\
                item,Categoría,Actividad Obra,Un,Cant,V. Unitario,V. Parcial\n\
                1.01,Pisos,Enchape,m2,1,\"$1\",\"$1\"\n";
    let extraction = extract(text.as_bytes());
    assert_eq!(extraction.items.items().len(), 1);
}

#[test]
fn test_genuine_single_byte_export() {
    // Same content saved as Windows-1252: accents survive unchanged
    let raw: Vec<u8> = b"Nombre:,Jos\xe9 Mu\xf1oz,,\n\
Item,Categor\xeda,Actividad Obra,Un,Cant,V. Unitario,V. Parcial\n\
1.01,Cimentaci\xf3n,Excavaci\xf3n,m3,1,$1,$1\n"
        .to_vec();
    let extraction = extract(&raw);
    assert_eq!(extraction.fields.nombre, "José Muñoz");
    let items = extraction.items.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].category.as_deref(), Some("Cimentación"));
    assert_eq!(items[0].description, "Excavación");
}

#[test]
fn test_amounts_with_and_without_symbol_agree() {
    let text = "Item,Categoría,Actividad Obra,Un,Cant,V. Unitario,V. Parcial\n\
                1.01,Pisos,Enchape,m2,2,12.500,25.000\n\
                1.02,Pisos,Guardaescoba,ml,2,\"$12.500\",\"$25.000\"\n";
    let extraction = extract(text.as_bytes());
    let items = extraction.items.items();
    assert_eq!(items.len(), 2);
    for item in items {
        assert_eq!(normalize_money(&item.unit_price), 12500.0);
        assert_eq!(normalize_money(&item.subtotal), 25000.0);
    }
}
