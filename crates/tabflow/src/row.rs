//! Rows of named field values read from tabular test data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value as the source format provides it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    /// Text cell, kept verbatim (no trimming)
    Text(String),
    /// Numeric cell
    Number(f64),
    /// Boolean cell
    Bool(bool),
    /// Empty cell
    #[default]
    Empty,
}

impl CellValue {
    /// True for `Empty` and for empty text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Blank for the purpose of required-field checks
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            other => other.is_empty(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            // Spreadsheets show 2, not 2.0
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One record of named field values, in header order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Zero-based index of the row among data rows
    pub index: usize,
    fields: Vec<(String, CellValue)>,
}

impl Row {
    /// Create an empty row
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: Vec::new(),
        }
    }

    /// Builder-style field insertion
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field, keeping first-insertion order
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    /// Raw value of a field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Display text of a field; `None` when absent or empty
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }

    /// Whether the field is present and non-empty
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_blank())
    }

    /// Required fields that are absent or blank, in the order given
    #[must_use]
    pub fn missing_required(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_value(name))
            .cloned()
            .collect()
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over (name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields present
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Row has no fields at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod cell_value_tests {
        use super::*;

        #[test]
        fn test_integral_number_display() {
            assert_eq!(CellValue::Number(2.0).to_string(), "2");
            assert_eq!(CellValue::Number(-7.0).to_string(), "-7");
        }

        #[test]
        fn test_fractional_number_display() {
            assert_eq!(CellValue::Number(10.5).to_string(), "10.5");
        }

        #[test]
        fn test_text_not_trimmed() {
            assert_eq!(CellValue::from("  $10.00 ").to_string(), "  $10.00 ");
        }

        #[test]
        fn test_blank_vs_empty() {
            let spaces = CellValue::from("   ");
            assert!(!spaces.is_empty());
            assert!(spaces.is_blank());
            assert!(CellValue::Empty.is_blank());
            assert!(!CellValue::Number(0.0).is_blank());
        }
    }

    mod row_tests {
        use super::*;

        fn widget() -> Row {
            Row::new(0)
                .with("name", "Widget A")
                .with("sku", "")
                .with("qty", 2_i64)
        }

        #[test]
        fn test_order_preserved() {
            let names: Vec<_> = widget().names().map(str::to_string).collect();
            assert_eq!(names, vec!["name", "sku", "qty"]);
        }

        #[test]
        fn test_text_skips_empty() {
            let row = widget();
            assert_eq!(row.text("name").as_deref(), Some("Widget A"));
            assert_eq!(row.text("sku"), None);
            assert_eq!(row.text("missing"), None);
            assert_eq!(row.text("qty").as_deref(), Some("2"));
        }

        #[test]
        fn test_missing_required() {
            let row = widget();
            let required = vec!["name".to_string(), "sku".to_string(), "price".to_string()];
            assert_eq!(row.missing_required(&required), vec!["sku", "price"]);
        }

        #[test]
        fn test_insert_replaces() {
            let mut row = widget();
            row.insert("sku", "W-100");
            assert_eq!(row.len(), 3);
            assert!(row.has_value("sku"));
        }
    }
}
