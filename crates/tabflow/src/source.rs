//! Tabular data sources.
//!
//! A [`DataSource`] turns a file reference and a sheet identifier into an
//! ordered list of [`Row`]s. The first row of every sheet is the header;
//! columns are addressed by header name.

use crate::result::{TabflowError, TabflowResult};
use crate::row::{CellValue, Row};
use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Sheet addressed by zero-based index or by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetId {
    /// Zero-based position in the workbook
    Index(usize),
    /// Sheet name
    Name(String),
}

impl Default for SheetId {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

impl FromStr for SheetId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = s.parse() {
                return Ok(Self::Index(i));
            }
        }
        Ok(Self::Name(s.to_string()))
    }
}

impl SheetId {
    /// Resolve against the sheet names of a source
    pub fn resolve<'a>(&self, names: &'a [String]) -> TabflowResult<&'a str> {
        let found = match self {
            Self::Index(i) => names.get(*i),
            Self::Name(n) => names.iter().find(|s| *s == n),
        };
        found
            .map(String::as_str)
            .ok_or_else(|| TabflowError::SheetNotFound {
                sheet: self.to_string(),
                available: names.to_vec(),
            })
    }
}

/// A loaded sheet: header row plus data rows
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    /// Resolved sheet name
    pub name: String,
    /// Non-empty header cells, in column order
    pub headers: Vec<String>,
    /// Data rows
    pub rows: Vec<Row>,
}

/// Read-only capability: load the rows of one sheet
pub trait DataSource {
    /// Load the header and data rows of `sheet` from `source_ref`
    fn load_sheet(&self, source_ref: &Path, sheet: &SheetId) -> TabflowResult<Sheet>;

    /// Load all data rows of `sheet` from `source_ref`
    fn load_rows(&self, source_ref: &Path, sheet: &SheetId) -> TabflowResult<Vec<Row>> {
        self.load_sheet(source_ref, sheet).map(|s| s.rows)
    }
}

/// Spreadsheet-backed source (xlsx, xls, xlsb, ods)
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxSource;

impl XlsxSource {
    /// Create a new spreadsheet source
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// List the sheet names of a workbook
    pub fn sheet_names(path: &Path) -> TabflowResult<Vec<String>> {
        ensure_exists(path)?;
        let workbook = open_workbook_auto(path).map_err(workbook_error)?;
        Ok(workbook.sheet_names())
    }
}

impl DataSource for XlsxSource {
    fn load_sheet(&self, source_ref: &Path, sheet: &SheetId) -> TabflowResult<Sheet> {
        ensure_exists(source_ref)?;
        let mut workbook = open_workbook_auto(source_ref).map_err(workbook_error)?;
        let names = workbook.sheet_names();
        let name = sheet.resolve(&names)?.to_string();
        let range = workbook.worksheet_range(&name).map_err(workbook_error)?;

        let mut grid = range.rows();
        let header: Vec<Option<String>> = match grid.next() {
            Some(cells) => cells
                .iter()
                .map(|c| {
                    let h = c.to_string();
                    (!h.trim().is_empty()).then_some(h)
                })
                .collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for cells in grid {
            let mut row = Row::new(rows.len());
            for (column, cell) in cells.iter().enumerate() {
                let Some(Some(field)) = header.get(column) else {
                    continue;
                };
                let value = cell_value(cell);
                if !value.is_empty() {
                    row.insert(field.clone(), value);
                }
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }

        if rows.is_empty() {
            return Err(TabflowError::EmptyData {
                sheet: format!("sheet '{name}'"),
            });
        }
        tracing::debug!(path = %source_ref.display(), sheet = %name, rows = rows.len(), "loaded sheet");
        Ok(Sheet {
            name,
            headers: header.into_iter().flatten().collect(),
            rows,
        })
    }
}

/// Column names seen in any row, in first-seen order
fn column_union(rows: &[Row]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for name in row.names() {
            if !headers.iter().any(|h| h == name) {
                headers.push(name.to_string());
            }
        }
    }
    headers
}

fn ensure_exists(path: &Path) -> TabflowResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TabflowError::SourceNotFound {
            path: path.to_path_buf(),
        })
    }
}

fn workbook_error(e: impl fmt::Display) -> TabflowError {
    TabflowError::Workbook {
        message: e.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| CellValue::Number(dt.as_f64()), |d| CellValue::Text(d.to_string())),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// In-memory source of named sheets
///
/// The `source_ref` path passed to [`DataSource::load_rows`] must equal the
/// path the source was created with.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    path: std::path::PathBuf,
    sheets: Vec<(String, Vec<Row>)>,
}

impl MemorySource {
    /// Create an empty in-memory workbook at a nominal path
    #[must_use]
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheets: Vec::new(),
        }
    }

    /// Append a sheet; rows are re-indexed in order
    #[must_use]
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.index = i;
                r
            })
            .collect();
        self.sheets.push((name.into(), rows));
        self
    }

    /// Sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(n, _)| n.clone()).collect()
    }
}

impl DataSource for MemorySource {
    fn load_sheet(&self, source_ref: &Path, sheet: &SheetId) -> TabflowResult<Sheet> {
        if source_ref != self.path {
            return Err(TabflowError::SourceNotFound {
                path: source_ref.to_path_buf(),
            });
        }
        let names = self.sheet_names();
        let name = sheet.resolve(&names)?;
        let rows = self
            .sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        if rows.is_empty() {
            return Err(TabflowError::EmptyData {
                sheet: format!("sheet '{name}'"),
            });
        }
        Ok(Sheet {
            name: name.to_string(),
            headers: column_union(&rows),
            rows,
        })
    }
}
