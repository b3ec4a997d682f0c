//! Inspect command handler

use crate::error::CliResult;
use crate::output::OutputFormat;
use crate::InspectArgs;
use tabflow::{DataSource, Row, XlsxSource};

/// Execute the inspect command
pub fn execute_inspect(args: &InspectArgs) -> CliResult<()> {
    let format = OutputFormat::from(args.format);
    match args.sheet {
        None => {
            let names = XlsxSource::sheet_names(&args.data)?;
            match format {
                OutputFormat::Text => {
                    for (index, name) in names.iter().enumerate() {
                        println!("{index}: {name}");
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
            }
        }
        Some(ref sheet) => {
            let rows = XlsxSource::new().load_rows(&args.data, sheet)?;
            match format {
                OutputFormat::Text => {
                    for row in &rows {
                        println!("{}", render_row(row));
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
        }
    }
    Ok(())
}

/// Render a row as `row N: name=value, ...`
#[must_use]
pub fn render_row(row: &Row) -> String {
    let cells: Vec<String> = row
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    format!("row {}: {}", row.index, cells.join(", "))
}
