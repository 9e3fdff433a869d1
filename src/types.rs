use serde::Serialize;
use std::fmt;
use std::str::FromStr;

//==============================================================================
// Extracted header data
//==============================================================================

/// Beneficiary and technician data recovered from the `key: value` lines.
///
/// Every field is always present; a key missing from the input stays empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    pub nombre: String,
    pub cedula: String,
    pub direccion: String,
    pub telefono: String,
    pub telefono2: String,
    pub idhogar: String,
    pub tecnico_nombre: String,
    pub tecnico_cedula: String,
    pub tecnico_cargo: String,
}

impl ExtractedFields {
    /// Both phone numbers joined with " / ", without a dangling separator
    /// when one of them is missing.
    pub fn phones(&self) -> String {
        format!("{} / {}", self.telefono, self.telefono2)
            .trim_matches(|c| c == ' ' || c == '/')
            .to_string()
    }
}

//==============================================================================
// Activity table
//==============================================================================

/// One budgeted activity row from the item table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItem {
    /// Item number/code as written in the export (e.g. "1.01")
    pub code: String,
    /// Group label; `None` when the cell was empty
    pub category: Option<String>,
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    /// Unit price as exported, usually currency-formatted
    pub unit_price: String,
    /// Declared partial value as exported, usually currency-formatted
    pub subtotal: String,
}

/// A category and its items, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub label: &'a str,
    pub items: Vec<&'a LineItem>,
}

/// Group items by category label in order of first appearance.
///
/// Items without a category are left out entirely rather than collected
/// into a catch-all group.
pub fn category_groups(items: &[LineItem]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for item in items {
        let Some(label) = item.category.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.items.push(item),
            None => groups.push(CategoryGroup {
                label,
                items: vec![item],
            }),
        }
    }
    groups
}

//==============================================================================
// Layout selection
//==============================================================================

/// Target template layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Layout {
    Medellin,
    Findeter,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::Medellin, Layout::Findeter];

    /// Display name used in the UI and in output file names
    pub fn display_name(&self) -> &'static str {
        match self {
            Layout::Medellin => "Medellín",
            Layout::Findeter => "Findeter",
        }
    }

    /// ASCII form of the name, safe for file names
    pub fn slug(&self) -> &'static str {
        match self {
            Layout::Medellin => "Medellin",
            Layout::Findeter => "Findeter",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "medellin" | "medellín" => Ok(Layout::Medellin),
            "findeter" => Ok(Layout::Findeter),
            other => Err(format!(
                "unknown layout '{}' (expected one of: medellin, findeter)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str, category: Option<&str>) -> LineItem {
        LineItem {
            code: code.to_string(),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_phones_both_present() {
        let fields = ExtractedFields {
            telefono: "300123".to_string(),
            telefono2: "604555".to_string(),
            ..Default::default()
        };
        assert_eq!(fields.phones(), "300123 / 604555");
    }

    #[test]
    fn test_phones_one_side_missing() {
        let first_only = ExtractedFields {
            telefono: "300123".to_string(),
            ..Default::default()
        };
        assert_eq!(first_only.phones(), "300123");

        let second_only = ExtractedFields {
            telefono2: "604555".to_string(),
            ..Default::default()
        };
        assert_eq!(second_only.phones(), "604555");

        assert_eq!(ExtractedFields::default().phones(), "");
    }

    #[test]
    fn test_category_groups_first_seen_order() {
        let items = vec![
            item("1.01", Some("Cimentación")),
            item("2.01", Some("Pisos")),
            item("1.02", Some("Cimentación")),
        ];
        let groups = category_groups(&items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Cimentación");
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[0].items[1].code, "1.02");
        assert_eq!(groups[1].label, "Pisos");
    }

    #[test]
    fn test_category_groups_drops_missing_category() {
        let items = vec![item("1", None), item("2", Some("Pisos"))];
        let groups = category_groups(&items);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Pisos");
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("medellin".parse::<Layout>(), Ok(Layout::Medellin));
        assert_eq!("Medellín".parse::<Layout>(), Ok(Layout::Medellin));
        assert_eq!(" FINDETER ".parse::<Layout>(), Ok(Layout::Findeter));
        assert!("bogota".parse::<Layout>().is_err());
    }
}
