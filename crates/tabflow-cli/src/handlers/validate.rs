//! Validate command handler

use crate::error::CliResult;
use crate::output::ProgressReporter;
use crate::ValidateArgs;
use tabflow::{DataSource, WorkflowDefinition, XlsxSource};

/// Execute the validate command
pub fn execute_validate(reporter: &ProgressReporter, args: &ValidateArgs) -> CliResult<()> {
    let workflow = WorkflowDefinition::from_file(&args.workflow)?;
    reporter.success(&describe(&workflow));

    let Some(ref data) = args.source.data else {
        return Ok(());
    };

    let sheet = XlsxSource::new().load_sheet(data, &args.source.sheet)?;
    workflow.validate_headers(&sheet.headers)?;
    let rows = sheet.rows;

    let required = workflow.required_fields();
    let incomplete: Vec<usize> = rows
        .iter()
        .filter(|r| !r.missing_required(&required).is_empty())
        .map(|r| r.index)
        .collect();
    if incomplete.is_empty() {
        reporter.success(&format!(
            "sheet {} provides every required field in all {} rows",
            args.source.sheet,
            rows.len()
        ));
    } else {
        reporter.warning(&format!(
            "{} of {} rows will be skipped for missing required fields: {incomplete:?}",
            incomplete.len(),
            rows.len()
        ));
    }
    Ok(())
}

/// One-line description of a valid workflow
#[must_use]
pub fn describe(workflow: &WorkflowDefinition) -> String {
    format!(
        "workflow '{}' is valid ({} steps, {} fields, {} required)",
        workflow.name,
        workflow.steps.len(),
        workflow.fields.len(),
        workflow.required_fields().len()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let workflow = WorkflowDefinition::from_yaml(
            r##"
version: "1.0"
name: "search"
fields:
  - { name: "Product", required: true }
  - { name: "Qty" }
selectors:
  query: "#small-searchterms"
steps:
  - { action: fill, target: query, value: "${Product}" }
"##,
        )
        .unwrap();
        assert_eq!(
            describe(&workflow),
            "workflow 'search' is valid (1 steps, 2 fields, 1 required)"
        );
    }
}
