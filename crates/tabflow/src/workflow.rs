//! Workflow YAML schema.
//!
//! A workflow is a selector table plus an ordered list of steps. Step values
//! are templates bound to the current row at execution time.
//!
//! # Example
//!
//! ```yaml
//! version: "1.0"
//! name: "address_add"
//! fields:
//!   - { name: "First Name", required: true }
//!   - { name: "Company Name" }
//! selectors:
//!   first_name: 'input[name="Address.FirstName"]'
//!   company: 'input[name="Address.Company"]'
//!   save: '//button[normalize-space()="Save"]'
//! steps:
//!   - { action: navigate, url: "/customer/addresses" }
//!   - { action: fill, target: first_name, value: "${First Name}" }
//!   - { action: fill, target: company, value: "${Company Name}" }
//!   - { action: click, target: save }
//! ```

use crate::adapter::MatchMode;
use crate::dialog::DialogResponse;
use crate::locator::Selector;
use crate::result::{TabflowError, TabflowResult};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Supported schema version
pub const WORKFLOW_VERSION: &str = "1.0";

/// String with `${Field}` placeholders. `$$` is a literal `$`; a `$` not
/// followed by `{` is kept as-is, so prices like `$10.00` need no escaping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

impl Template {
    /// Wrap a raw template string
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw template text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> Result<Vec<Segment>, String> {
        let mut out = Vec::new();
        let mut literal = String::new();
        let mut chars = self.0.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '$' {
                literal.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    literal.push('$');
                }
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(format!("unterminated placeholder in '{}'", self.0));
                    }
                    if name.trim().is_empty() {
                        return Err(format!("empty placeholder in '{}'", self.0));
                    }
                    if !literal.is_empty() {
                        out.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    out.push(Segment::Field(name));
                }
                _ => literal.push('$'),
            }
        }
        if !literal.is_empty() {
            out.push(Segment::Literal(literal));
        }
        Ok(out)
    }

    /// Field names referenced by this template
    pub fn placeholders(&self) -> TabflowResult<Vec<String>> {
        let segments = self.segments().map_err(TabflowError::invalid_workflow)?;
        Ok(segments
            .into_iter()
            .filter_map(|s| match s {
                Segment::Field(name) => Some(name),
                Segment::Literal(_) => None,
            })
            .collect())
    }

    /// Substitute row values.
    ///
    /// Returns `Ok(None)` when a referenced field is absent or empty in the
    /// row, so the caller can skip a step bound to an optional field.
    pub fn render(&self, row: &Row) -> TabflowResult<Option<String>> {
        let segments = self.segments().map_err(TabflowError::invalid_workflow)?;
        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(s) => out.push_str(&s),
                Segment::Field(name) => match row.text(&name) {
                    Some(v) => out.push_str(&v),
                    None => return Ok(None),
                },
            }
        }
        Ok(Some(out))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Declared row field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Column header name
    pub name: String,
    /// Row is skipped when this field is absent or blank
    #[serde(default)]
    pub required: bool,
}

/// What `assert_text` reads from the element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadKind {
    /// Text content
    #[default]
    Text,
    /// Form value
    Value,
}

const fn select_default_mode() -> MatchMode {
    MatchMode::CaseInsensitive
}

/// One atomic UI action
///
/// `target` names an entry of the selector table. `timeout_ms` overrides
/// the runner's default element timeout for this step.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Navigate to URL (relative URLs resolve against the base URL)
    Navigate { url: Template },
    /// Fill an input
    Fill {
        target: String,
        value: Template,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Choose an option of a select element
    Select {
        target: String,
        option: Template,
        #[serde(default = "select_default_mode")]
        match_mode: MatchMode,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Check a checkbox
    Check {
        target: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Click an element, optionally answering the dialog it raises
    Click {
        target: String,
        #[serde(default)]
        dialog: Option<DialogResponse>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Wait until an element exists
    WaitFor {
        target: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Compare element text with an expected value
    AssertText {
        target: String,
        expected: Template,
        #[serde(default)]
        match_mode: MatchMode,
        #[serde(default)]
        read: ReadKind,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

impl WorkflowStep {
    /// Action name as written in YAML
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::Fill { .. } => "fill",
            Self::Select { .. } => "select",
            Self::Check { .. } => "check",
            Self::Click { .. } => "click",
            Self::WaitFor { .. } => "wait_for",
            Self::AssertText { .. } => "assert_text",
        }
    }

    /// Selector-table key, if the step targets an element
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Navigate { .. } => None,
            Self::Fill { target, .. }
            | Self::Select { target, .. }
            | Self::Check { target, .. }
            | Self::Click { target, .. }
            | Self::WaitFor { target, .. }
            | Self::AssertText { target, .. } => Some(target),
        }
    }

    /// Per-step timeout override
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        let ms = match self {
            Self::Navigate { .. } => None,
            Self::Fill { timeout_ms, .. }
            | Self::Select { timeout_ms, .. }
            | Self::Check { timeout_ms, .. }
            | Self::Click { timeout_ms, .. }
            | Self::WaitFor { timeout_ms, .. }
            | Self::AssertText { timeout_ms, .. } => *timeout_ms,
        };
        ms.map(Duration::from_millis)
    }

    /// Templates carried by the step
    #[must_use]
    pub fn templates(&self) -> Vec<&Template> {
        match self {
            Self::Navigate { url } => vec![url],
            Self::Fill { value, .. } => vec![value],
            Self::Select { option, .. } => vec![option],
            Self::AssertText { expected, .. } => vec![expected],
            Self::Check { .. } | Self::Click { .. } | Self::WaitFor { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { url } => write!(f, "navigate {url}"),
            Self::Fill { target, value, .. } => write!(f, "fill {target} = {value}"),
            Self::Select { target, option, .. } => write!(f, "select {target} = {option}"),
            Self::AssertText {
                target, expected, ..
            } => write!(f, "assert_text {target} == {expected}"),
            other => write!(f, "{} {}", other.action(), other.target().unwrap_or_default()),
        }
    }
}

/// Declarative, row-parameterized UI workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Schema version (must be "1.0")
    pub version: String,
    /// Workflow name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Row schema
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Selector table, keyed by the names steps use as `target`. Entries
    /// may carry `${Field}` placeholders to scope an element to the row.
    #[serde(default)]
    pub selectors: BTreeMap<String, Template>,
    /// Ordered steps
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    /// Parse and validate a workflow from YAML.
    ///
    /// # Errors
    /// Returns error if YAML is invalid or static validation fails.
    pub fn from_yaml(yaml: &str) -> TabflowResult<Self> {
        let workflow: Self = serde_yaml_ng::from_str(yaml)?;
        workflow.validate()?;
        Ok(workflow)
    }

    /// Read, parse and validate a workflow file
    pub fn from_file(path: &Path) -> TabflowResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Static validation: every target and placeholder must resolve.
    pub fn validate(&self) -> TabflowResult<()> {
        if self.version != WORKFLOW_VERSION {
            return Err(TabflowError::invalid_workflow(format!(
                "version '{}', expected '{WORKFLOW_VERSION}'",
                self.version
            )));
        }
        if self.steps.is_empty() {
            return Err(TabflowError::invalid_workflow("steps cannot be empty"));
        }

        let mut declared = HashSet::new();
        for field in &self.fields {
            if !declared.insert(field.name.as_str()) {
                return Err(TabflowError::invalid_workflow(format!(
                    "field '{}' declared twice",
                    field.name
                )));
            }
        }

        for (name, raw) in &self.selectors {
            if raw.as_str().trim().is_empty() {
                return Err(TabflowError::invalid_workflow(format!(
                    "selector '{name}' is empty"
                )));
            }
            for field in raw.placeholders()? {
                if !declared.contains(field.as_str()) {
                    return Err(TabflowError::invalid_workflow(format!(
                        "selector '{name}' references undeclared field '{field}'"
                    )));
                }
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(target) = step.target() {
                if !self.selectors.contains_key(target) {
                    return Err(TabflowError::invalid_workflow(format!(
                        "step {index} ({}) targets unknown selector '{target}'",
                        step.action()
                    )));
                }
            }
            for template in step.templates() {
                for field in template.placeholders()? {
                    if !declared.contains(field.as_str()) {
                        return Err(TabflowError::invalid_workflow(format!(
                            "step {index} ({}) references undeclared field '{field}'",
                            step.action()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Names of required fields, in declaration order
    #[must_use]
    pub fn required_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Check that a sheet header carries every required field
    pub fn validate_headers(&self, headers: &[String]) -> TabflowResult<()> {
        let missing: Vec<String> = self
            .required_fields()
            .into_iter()
            .filter(|f| !headers.contains(f))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TabflowError::RequiredFieldMissing { fields: missing })
        }
    }

    /// Resolve a step target to a selector bound to `row`.
    ///
    /// Returns `Ok(None)` when the selector names a field the row leaves
    /// empty.
    pub fn selector(&self, target: &str, row: &Row) -> TabflowResult<Option<Selector>> {
        let template = self.selectors.get(target).ok_or_else(|| {
            TabflowError::invalid_workflow(format!("unknown selector '{target}'"))
        })?;
        Ok(template.render(row)?.map(|raw| Selector::parse(&raw)))
    }
}
