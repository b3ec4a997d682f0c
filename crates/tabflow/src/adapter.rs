//! ElementAdapter - abstract UI automation capability
//!
//! Everything the runner does to a page goes through [`ElementAdapter`].
//! Implementations:
//!
//! - `ChromiumAdapter` (feature `browser`) - real browser over CDP
//! - [`MockAdapter`] - in-memory page model for unit testing
//!
//! Failures are typed. An adapter never reports "false" for a missing
//! element; it returns `ElementNotFound` and the caller decides.

use crate::dialog::{Dialog, DialogGuard, DialogResponse};
use crate::locator::Selector;
use crate::result::{TabflowError, TabflowResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Bounded wait for element operations
pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// How an expected string is compared with what the UI shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Byte-for-byte equal
    #[default]
    Exact,
    /// Actual contains expected
    Contains,
    /// Equal ignoring case
    CaseInsensitive,
}

impl MatchMode {
    /// Compare `expected` against `actual`
    #[must_use]
    pub fn matches(self, expected: &str, actual: &str) -> bool {
        match self {
            Self::Exact => expected == actual,
            Self::Contains => actual.contains(expected),
            Self::CaseInsensitive => expected.to_lowercase() == actual.to_lowercase(),
        }
    }
}

/// Pick the option label to select.
///
/// Exact label first; unless `mode` is `Exact`, fall back to the first
/// option whose label contains `requested` ignoring case. Labels are
/// compared trimmed. Labels often carry annotations such as
/// `"Yes [+$10.00]"`, which the fallback tolerates.
pub fn resolve_option<'a>(
    selector: &Selector,
    options: &'a [String],
    requested: &str,
    mode: MatchMode,
) -> TabflowResult<&'a str> {
    let wanted = requested.trim();
    if let Some(exact) = options.iter().find(|o| o.trim() == wanted) {
        return Ok(exact.as_str());
    }
    if mode != MatchMode::Exact {
        let needle = wanted.to_lowercase();
        if let Some(loose) = options
            .iter()
            .find(|o| o.trim().to_lowercase().contains(&needle))
        {
            return Ok(loose.as_str());
        }
    }
    Err(TabflowError::OptionNotFound {
        selector: selector.to_string(),
        requested: requested.to_string(),
        available: options.to_vec(),
    })
}

/// UI automation primitives used by the workflow runner.
///
/// Every call may suspend while waiting for UI state. Element operations
/// are bounded by `timeout`.
#[async_trait]
pub trait ElementAdapter: Send {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> TabflowResult<()>;

    /// Replace the value of an input
    async fn fill(&mut self, selector: &Selector, value: &str, timeout: Duration)
        -> TabflowResult<()>;

    /// Click element
    async fn click(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()>;

    /// Click element while a one-shot dialog handler is armed
    async fn click_with_dialog(
        &mut self,
        selector: &Selector,
        response: DialogResponse,
        timeout: Duration,
    ) -> TabflowResult<Vec<Dialog>>;

    /// Ensure a checkbox is checked
    async fn check(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()>;

    /// Select an option by label; returns the label actually chosen
    async fn select_option(
        &mut self,
        selector: &Selector,
        label: &str,
        mode: MatchMode,
        timeout: Duration,
    ) -> TabflowResult<String>;

    /// Wait for selector to appear
    async fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()>;

    /// Trimmed text content
    async fn read_text(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<String>;

    /// Trimmed form value
    async fn read_value(&mut self, selector: &Selector, timeout: Duration)
        -> TabflowResult<String>;

    /// PNG of the current page; empty when unsupported
    async fn screenshot(&mut self) -> TabflowResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Kind of element in the mock page model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MockKind {
    /// Anything without checked state (inputs, buttons, text)
    #[default]
    Plain,
    /// Checkbox or radio button
    Checkbox,
    /// `<label>` whose control is the element at the given selector
    Label(String),
}

/// Element in the mock page model
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Element kind
    pub kind: MockKind,
    /// Text content
    pub text: String,
    /// Form value
    pub value: String,
    /// Option labels (select elements)
    pub options: Vec<String>,
    /// Checkbox state
    pub checked: bool,
    /// Accepts input
    pub enabled: bool,
    /// Dialog raised when clicked
    pub dialog: Option<Dialog>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            kind: MockKind::Plain,
            text: String::new(),
            value: String::new(),
            options: Vec::new(),
            checked: false,
            enabled: true,
            dialog: None,
        }
    }
}

impl MockElement {
    /// Create an enabled, empty element
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unchecked checkbox
    #[must_use]
    pub fn checkbox() -> Self {
        Self {
            kind: MockKind::Checkbox,
            ..Self::default()
        }
    }

    /// Label for the control registered under `control`
    #[must_use]
    pub fn label_for(control: &str) -> Self {
        Self {
            kind: MockKind::Label(control.to_string()),
            ..Self::default()
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set select options
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Raise a dialog when clicked
    #[must_use]
    pub fn raises(mut self, dialog: Dialog) -> Self {
        self.dialog = Some(dialog);
        self
    }
}

/// Failure the mock injects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFault {
    /// `ElementNotFound`
    NotFound,
    /// `ElementNotInteractable`
    NotInteractable,
    /// `Timeout`
    Timeout,
    /// `NavigationError`
    Navigation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Trigger {
    Selector(String),
    Value(String),
    Url(String),
}

#[derive(Debug, Clone)]
struct Fault {
    trigger: Trigger,
    kind: MockFault,
    remaining: Option<usize>,
}

/// Mock adapter for unit testing
#[derive(Debug, Default)]
pub struct MockAdapter {
    /// Current URL
    pub current_url: String,
    /// Call history for verification
    pub call_history: Vec<String>,
    /// Dialogs raised by plain clicks (auto-dismissed)
    pub unhandled_dialogs: Vec<Dialog>,
    elements: HashMap<String, MockElement>,
    mirrors: HashMap<String, String>,
    faults: Vec<Fault>,
}

impl MockAdapter {
    /// Create new mock adapter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mock element under a selector
    #[must_use]
    pub fn with_element(mut self, selector: &str, element: MockElement) -> Self {
        self.add_element(selector, element);
        self
    }

    /// Add a mock element under a selector
    pub fn add_element(&mut self, selector: &str, element: MockElement) {
        self.elements.insert(key(&Selector::parse(selector)), element);
    }

    /// After `from` is filled, `to` shows the same text
    #[must_use]
    pub fn mirror(mut self, from: &str, to: &str) -> Self {
        self.mirrors
            .insert(key(&Selector::parse(from)), key(&Selector::parse(to)));
        self
    }

    /// Fail every operation on `selector`
    #[must_use]
    pub fn fail_on(self, selector: &str, kind: MockFault) -> Self {
        self.fault(Trigger::Selector(key(&Selector::parse(selector))), kind, None)
    }

    /// Fail the next operation on `selector` only
    #[must_use]
    pub fn fail_once_on(self, selector: &str, kind: MockFault) -> Self {
        self.fault(
            Trigger::Selector(key(&Selector::parse(selector))),
            kind,
            Some(1),
        )
    }

    /// Fail any fill or select carrying `value`
    #[must_use]
    pub fn fail_on_value(self, value: &str, kind: MockFault) -> Self {
        self.fault(Trigger::Value(value.to_string()), kind, None)
    }

    /// Fail navigation to `url`
    #[must_use]
    pub fn fail_on_url(self, url: &str) -> Self {
        self.fault(Trigger::Url(url.to_string()), MockFault::Navigation, None)
    }

    fn fault(mut self, trigger: Trigger, kind: MockFault, remaining: Option<usize>) -> Self {
        self.faults.push(Fault {
            trigger,
            kind,
            remaining,
        });
        self
    }

    /// Get element state
    #[must_use]
    pub fn element(&self, selector: &str) -> Option<&MockElement> {
        self.elements.get(&key(&Selector::parse(selector)))
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Number of adapter calls made
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history.len()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn injected(&mut self, candidates: &[Trigger]) -> Option<MockFault> {
        let fault = self.faults.iter_mut().find(|f| {
            candidates.contains(&f.trigger) && f.remaining.map_or(true, |n| n > 0)
        })?;
        if let Some(n) = fault.remaining.as_mut() {
            *n -= 1;
        }
        Some(fault.kind)
    }

    fn element_error(kind: MockFault, selector: &Selector, timeout: Duration) -> TabflowError {
        let timeout_ms = timeout.as_millis() as u64;
        match kind {
            MockFault::NotFound => TabflowError::ElementNotFound {
                selector: selector.to_string(),
                timeout_ms,
            },
            MockFault::NotInteractable => TabflowError::ElementNotInteractable {
                selector: selector.to_string(),
                reason: "injected fault".to_string(),
            },
            MockFault::Timeout => TabflowError::Timeout {
                what: selector.to_string(),
                ms: timeout_ms,
            },
            MockFault::Navigation => TabflowError::NavigationError {
                url: selector.to_string(),
                message: "injected fault".to_string(),
            },
        }
    }

    fn locate(
        &mut self,
        selector: &Selector,
        value: Option<&str>,
        timeout: Duration,
    ) -> TabflowResult<&mut MockElement> {
        let k = key(selector);
        let mut triggers = vec![Trigger::Selector(k.clone())];
        if let Some(v) = value {
            triggers.push(Trigger::Value(v.to_string()));
        }
        if let Some(kind) = self.injected(&triggers) {
            return Err(Self::element_error(kind, selector, timeout));
        }
        self.elements
            .get_mut(&k)
            .ok_or_else(|| TabflowError::ElementNotFound {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    fn interactable(
        &mut self,
        selector: &Selector,
        value: Option<&str>,
        timeout: Duration,
    ) -> TabflowResult<&mut MockElement> {
        let element = self.locate(selector, value, timeout)?;
        if element.enabled {
            Ok(element)
        } else {
            Err(TabflowError::ElementNotInteractable {
                selector: selector.to_string(),
                reason: "disabled".to_string(),
            })
        }
    }
}

fn key(selector: &Selector) -> String {
    selector.to_string()
}

#[async_trait]
impl ElementAdapter for MockAdapter {
    async fn navigate(&mut self, url: &str) -> TabflowResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        if self.injected(&[Trigger::Url(url.to_string())]).is_some() {
            return Err(TabflowError::NavigationError {
                url: url.to_string(),
                message: "injected fault".to_string(),
            });
        }
        self.current_url = url.to_string();
        Ok(())
    }

    async fn fill(
        &mut self,
        selector: &Selector,
        value: &str,
        timeout: Duration,
    ) -> TabflowResult<()> {
        self.call_history.push(format!("fill:{selector}={value}"));
        self.interactable(selector, Some(value), timeout)?.value = value.to_string();
        if let Some(target) = self.mirrors.get(&key(selector)).cloned() {
            self.elements.entry(target).or_default().text = value.to_string();
        }
        Ok(())
    }

    async fn click(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()> {
        self.call_history.push(format!("click:{selector}"));
        let dialog = self.interactable(selector, None, timeout)?.dialog.clone();
        // No handler armed: the dialog is dismissed
        self.unhandled_dialogs.extend(dialog);
        Ok(())
    }

    async fn click_with_dialog(
        &mut self,
        selector: &Selector,
        response: DialogResponse,
        timeout: Duration,
    ) -> TabflowResult<Vec<Dialog>> {
        self.call_history.push(format!("click_with_dialog:{selector}"));
        let mut guard = DialogGuard::arm(response);
        let clicked = self
            .interactable(selector, None, timeout)
            .map(|el| el.dialog.clone());
        match clicked {
            Ok(Some(dialog)) => {
                let _ = guard.handle(dialog);
                Ok(guard.disarm())
            }
            Ok(None) => Ok(guard.disarm()),
            Err(e) => {
                let _ = guard.disarm();
                Err(e)
            }
        }
    }

    async fn check(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()> {
        self.call_history.push(format!("check:{selector}"));
        let kind = self.interactable(selector, None, timeout)?.kind.clone();
        let not_checkable = |reason: &str| TabflowError::ElementNotInteractable {
            selector: selector.to_string(),
            reason: reason.to_string(),
        };
        // A label retargets to its control
        let control = match kind {
            MockKind::Label(control) => key(&Selector::parse(&control)),
            MockKind::Checkbox => key(selector),
            MockKind::Plain => return Err(not_checkable("not a checkbox")),
        };
        let element = self
            .elements
            .get_mut(&control)
            .ok_or_else(|| not_checkable("label has no control"))?;
        if !element.enabled {
            return Err(not_checkable("disabled"));
        }
        if element.kind != MockKind::Checkbox {
            return Err(not_checkable("not a checkbox"));
        }
        element.checked = true;
        Ok(())
    }

    async fn select_option(
        &mut self,
        selector: &Selector,
        label: &str,
        mode: MatchMode,
        timeout: Duration,
    ) -> TabflowResult<String> {
        self.call_history.push(format!("select:{selector}={label}"));
        let element = self.interactable(selector, Some(label), timeout)?;
        let chosen = resolve_option(selector, &element.options, label, mode)?.to_string();
        element.value = chosen.clone();
        Ok(chosen)
    }

    async fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<()> {
        self.call_history.push(format!("wait_for:{selector}"));
        match self.locate(selector, None, timeout) {
            Ok(_) => Ok(()),
            Err(TabflowError::ElementNotFound { .. }) => Err(TabflowError::Timeout {
                what: selector.to_string(),
                ms: timeout.as_millis() as u64,
            }),
            Err(e) => Err(e),
        }
    }

    async fn read_text(&mut self, selector: &Selector, timeout: Duration) -> TabflowResult<String> {
        self.call_history.push(format!("read_text:{selector}"));
        Ok(self.locate(selector, None, timeout)?.text.trim().to_string())
    }

    async fn read_value(
        &mut self,
        selector: &Selector,
        timeout: Duration,
    ) -> TabflowResult<String> {
        self.call_history.push(format!("read_value:{selector}"));
        Ok(self.locate(selector, None, timeout)?.value.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogType;
    use crate::result::ErrorKind;

    fn colors() -> Vec<String> {
        vec!["Silver".into(), "Space Gray".into(), "Gold".into()]
    }

    mod match_mode_tests {
        use super::*;

        #[test]
        fn test_exact() {
            assert!(MatchMode::Exact.matches("$10.00", "$10.00"));
            assert!(!MatchMode::Exact.matches("$10.00", "$10.00 USD"));
        }

        #[test]
        fn test_contains() {
            assert!(MatchMode::Contains.matches("Widget", "Widget A was added"));
            assert!(!MatchMode::Contains.matches("widget", "Widget A"));
        }

        #[test]
        fn test_case_insensitive() {
            assert!(MatchMode::CaseInsensitive.matches("widget a", "Widget A"));
            assert!(!MatchMode::CaseInsensitive.matches("widget", "Widget A"));
        }
    }

    mod resolve_option_tests {
        use super::*;

        #[test]
        fn test_case_insensitive_fallback() {
            let sel = Selector::css("select#color");
            let opts = colors();
            let chosen = resolve_option(&sel, &opts, "silver", MatchMode::CaseInsensitive).unwrap();
            assert_eq!(chosen, "Silver");
        }

        #[test]
        fn test_exact_preferred_over_substring() {
            let sel = Selector::css("select#ram");
            let opts: Vec<String> = vec!["8GB [+$60.00]".into(), "8GB".into()];
            let chosen = resolve_option(&sel, &opts, "8GB", MatchMode::Contains).unwrap();
            assert_eq!(chosen, "8GB");
        }

        #[test]
        fn test_annotated_label() {
            let sel = Selector::css("select#checkout_attribute_1");
            let opts: Vec<String> = vec!["No".into(), "Yes [+$10.00]".into()];
            let chosen = resolve_option(&sel, &opts, "yes", MatchMode::CaseInsensitive).unwrap();
            assert_eq!(chosen, "Yes [+$10.00]");
        }

        #[test]
        fn test_not_found_lists_all() {
            let sel = Selector::css("select#color");
            let err = resolve_option(&sel, &colors(), "Titanium", MatchMode::CaseInsensitive)
                .unwrap_err();
            match err {
                TabflowError::OptionNotFound {
                    requested,
                    available,
                    ..
                } => {
                    assert_eq!(requested, "Titanium");
                    assert_eq!(available, colors());
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_exact_mode_disables_fallback() {
            let sel = Selector::css("select#color");
            let err = resolve_option(&sel, &colors(), "silver", MatchMode::Exact).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::OptionNotFound);
        }
    }

    mod mock_adapter_tests {
        use super::*;

        fn t() -> Duration {
            DEFAULT_ELEMENT_TIMEOUT
        }

        #[test]
        fn test_mock_adapter_creation() {
            let adapter = MockAdapter::new();
            assert!(adapter.current_url.is_empty());
            assert_eq!(adapter.call_count(), 0);
            assert!(!adapter.was_called("navigate"));
        }

        #[tokio::test]
        async fn test_fill_and_read_value() {
            let mut adapter = MockAdapter::new().with_element("#email", MockElement::new());
            let sel = Selector::parse("#email");
            adapter.fill(&sel, "a@b.c", t()).await.unwrap();
            assert_eq!(adapter.read_value(&sel, t()).await.unwrap(), "a@b.c");
            assert!(adapter.was_called("fill:css=#email"));
        }

        #[tokio::test]
        async fn test_check_checkbox() {
            let mut adapter = MockAdapter::new().with_element("#agree", MockElement::checkbox());
            let sel = Selector::parse("#agree");
            adapter.check(&sel, t()).await.unwrap();
            adapter.check(&sel, t()).await.unwrap();
            assert!(adapter.element("#agree").unwrap().checked);
        }

        #[tokio::test]
        async fn test_check_label_retargets_to_control() {
            let mut adapter = MockAdapter::new()
                .with_element("#RememberMe", MockElement::checkbox())
                .with_element(
                    "//label[@for=\"RememberMe\"]",
                    MockElement::label_for("#RememberMe").with_text("Remember me?"),
                );
            adapter
                .check(&Selector::parse("//label[@for=\"RememberMe\"]"), t())
                .await
                .unwrap();
            assert!(adapter.element("#RememberMe").unwrap().checked);
            assert!(!adapter.element("//label[@for=\"RememberMe\"]").unwrap().checked);
        }

        #[tokio::test]
        async fn test_check_rejects_plain_element() {
            let mut adapter = MockAdapter::new().with_element("#email", MockElement::new());
            let err = adapter.check(&Selector::parse("#email"), t()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ElementNotInteractable);
        }

        #[tokio::test]
        async fn test_check_label_without_control() {
            let mut adapter =
                MockAdapter::new().with_element("label.terms", MockElement::label_for("#terms"));
            let err = adapter
                .check(&Selector::parse("label.terms"), t())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ElementNotInteractable);
        }

        #[tokio::test]
        async fn test_missing_element_is_typed() {
            let mut adapter = MockAdapter::new();
            let err = adapter
                .click(&Selector::parse("#nope"), t())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ElementNotFound);
        }

        #[tokio::test]
        async fn test_disabled_not_interactable() {
            let mut adapter =
                MockAdapter::new().with_element("#save", MockElement::new().disabled());
            let err = adapter
                .click(&Selector::parse("#save"), t())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ElementNotInteractable);
        }

        #[tokio::test]
        async fn test_wait_for_times_out() {
            let mut adapter = MockAdapter::new();
            let err = adapter
                .wait_for(&Selector::parse("//p[@class=\"content\"]"), Duration::from_millis(250))
                .await
                .unwrap_err();
            assert!(matches!(err, TabflowError::Timeout { ms: 250, .. }));
        }

        #[tokio::test]
        async fn test_select_sets_value() {
            let mut adapter = MockAdapter::new()
                .with_element("select#color", MockElement::new().with_options(colors()));
            let sel = Selector::parse("select#color");
            let chosen = adapter
                .select_option(&sel, "silver", MatchMode::CaseInsensitive, t())
                .await
                .unwrap();
            assert_eq!(chosen, "Silver");
            assert_eq!(adapter.element("select#color").unwrap().value, "Silver");
        }

        #[tokio::test]
        async fn test_mirror() {
            let mut adapter = MockAdapter::new()
                .with_element("#q", MockElement::new())
                .mirror("#q", "h1");
            adapter
                .fill(&Selector::parse("#q"), "Widget A", t())
                .await
                .unwrap();
            let text = adapter.read_text(&Selector::parse("h1"), t()).await.unwrap();
            assert_eq!(text, "Widget A");
        }

        #[tokio::test]
        async fn test_fault_once() {
            let mut adapter = MockAdapter::new()
                .with_element("#go", MockElement::new())
                .fail_once_on("#go", MockFault::NotFound);
            let sel = Selector::parse("#go");
            assert!(adapter.click(&sel, t()).await.is_err());
            assert!(adapter.click(&sel, t()).await.is_ok());
        }

        #[tokio::test]
        async fn test_fault_on_value() {
            let mut adapter = MockAdapter::new()
                .with_element("#q", MockElement::new())
                .fail_on_value("Widget C", MockFault::NotFound);
            let sel = Selector::parse("#q");
            assert!(adapter.fill(&sel, "Widget B", t()).await.is_ok());
            let err = adapter.fill(&sel, "Widget C", t()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ElementNotFound);
        }

        #[tokio::test]
        async fn test_navigation_fault() {
            let mut adapter = MockAdapter::new().fail_on_url("/cart");
            adapter.navigate("/").await.unwrap();
            let err = adapter.navigate("/cart").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NavigationError);
            assert_eq!(adapter.current_url, "/");
        }

        #[tokio::test]
        async fn test_click_with_dialog_handles_one() {
            let mut adapter = MockAdapter::new().with_element(
                "text=Delete",
                MockElement::new().raises(Dialog::new(DialogType::Confirm, "Are you sure?")),
            );
            let handled = adapter
                .click_with_dialog(&Selector::parse("text=Delete"), DialogResponse::Accept, t())
                .await
                .unwrap();
            assert_eq!(handled.len(), 1);
            assert!(adapter.unhandled_dialogs.is_empty());
        }

        #[tokio::test]
        async fn test_plain_click_leaves_dialog_unhandled() {
            let mut adapter = MockAdapter::new().with_element(
                "text=Delete",
                MockElement::new().raises(Dialog::new(DialogType::Confirm, "Are you sure?")),
            );
            adapter
                .click(&Selector::parse("text=Delete"), t())
                .await
                .unwrap();
            assert_eq!(adapter.unhandled_dialogs.len(), 1);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_listed_label_always_resolves(
                options in prop::collection::vec("[A-Za-z ]{1,12}", 1..8),
                pick in any::<prop::sample::Index>(),
            ) {
                let wanted = pick.get(&options).trim().to_string();
                prop_assume!(!wanted.is_empty());
                let chosen =
                    resolve_option(&Selector::css("select"), &options, &wanted, MatchMode::Exact)
                        .unwrap();
                prop_assert_eq!(chosen.trim(), wanted.as_str());
            }

            #[test]
            fn prop_resolved_option_is_listed(
                options in prop::collection::vec("[a-z]{1,6}", 0..6),
                requested in "[a-z]{1,3}",
            ) {
                if let Ok(chosen) = resolve_option(
                    &Selector::css("select"),
                    &options,
                    &requested,
                    MatchMode::CaseInsensitive,
                ) {
                    prop_assert!(options.iter().any(|o| o == chosen));
                    prop_assert!(chosen.to_lowercase().contains(&requested));
                }
            }
        }
    }
}
