//! Selector syntax shared by workflow definitions and the browser adapter.
//!
//! Selectors use Playwright-style prefixes so existing page-object selector
//! tables carry over as-is:
//!
//! | Input                              | Kind  |
//! |------------------------------------|-------|
//! | `xpath=//a[@class='product-name']` | XPath |
//! | `//button[normalize-space()="Save"]` | XPath |
//! | `(//button[@type="button"])[1]`    | XPath |
//! | `text=Add new`                     | Text  |
//! | `css=.qty-input`, `input#email`    | CSS   |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed element selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Text content selector
    Text(String),
}

impl Selector {
    /// Parse a selector string
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("xpath=") {
            Self::XPath(rest.to_string())
        } else if let Some(rest) = raw.strip_prefix("text=") {
            Self::Text(rest.trim_matches('"').to_string())
        } else if let Some(rest) = raw.strip_prefix("css=") {
            Self::Css(rest.to_string())
        } else if raw.starts_with("//") || raw.starts_with("(/") || raw.starts_with("..") {
            Self::XPath(raw.to_string())
        } else {
            Self::Css(raw.to_string())
        }
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// JavaScript expression evaluating to the first match (or null)
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({})", js_string(s)),
            Self::XPath(s) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(s)
            ),
            Self::Text(t) => {
                // Innermost element whose text contains the needle
                format!(
                    "Array.from(document.querySelectorAll('body *')).reverse().find(el => (el.innerText || el.textContent || '').includes({}))",
                    js_string(t)
                )
            }
        }
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelectorAll({}).length", js_string(s)),
            Self::XPath(s) => format!(
                "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                js_string(s)
            ),
            Self::Text(t) => format!(
                "Array.from(document.querySelectorAll('body *')).filter(el => (el.innerText || el.textContent || '').includes({})).length",
                js_string(t)
            ),
        }
    }

    /// Wrap `body` in a function that receives the located element as `el`.
    ///
    /// The script returns `{"found": false}` when nothing matches, otherwise
    /// `{"found": true, ...}` merged with whatever `body` returns.
    #[must_use]
    pub fn with_element(&self, body: &str) -> String {
        format!(
            "(() => {{ const el = {query}; if (!el) {{ return {{ found: false }}; }} \
             const r = ((el) => {{ {body} }})(el) || {{}}; return Object.assign({{ found: true }}, r); }})()",
            query = self.to_query(),
        )
    }
}

/// JSON string literal, which is also a valid JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text={t}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_plain_css() {
            assert_eq!(
                Selector::parse("input[name=\"Address.FirstName\"]"),
                Selector::Css("input[name=\"Address.FirstName\"]".to_string())
            );
        }

        #[test]
        fn test_css_prefix() {
            assert_eq!(Selector::parse("css=.qty-input"), Selector::css(".qty-input"));
        }

        #[test]
        fn test_xpath_forms() {
            assert_eq!(
                Selector::parse("xpath=//a[@class='product-name']"),
                Selector::XPath("//a[@class='product-name']".to_string())
            );
            assert!(matches!(
                Selector::parse("//button[normalize-space()=\"Save\"]"),
                Selector::XPath(_)
            ));
            assert!(matches!(
                Selector::parse("(//button[@type=\"button\"][normalize-space()=\"Delete\"])[1]"),
                Selector::XPath(_)
            ));
        }

        #[test]
        fn test_text_prefix() {
            assert_eq!(Selector::parse("text=Add new"), Selector::text("Add new"));
            assert_eq!(Selector::parse("text=\"Log in\""), Selector::text("Log in"));
        }

        #[test]
        fn test_display_round_trip() {
            let sel = Selector::parse("//p[@class=\"content\"]");
            assert_eq!(Selector::parse(&sel.to_string()), sel);
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let q = Selector::css("#email").to_query();
            assert_eq!(q, "document.querySelector(\"#email\")");
        }

        #[test]
        fn test_xpath_count_query() {
            let q = Selector::parse("//tr").to_count_query();
            assert!(q.contains("snapshotLength"));
            assert!(q.contains("\"//tr\""));
        }

        #[test]
        fn test_control_chars_use_js_escapes() {
            let q = Selector::text("Total:\u{1}").to_query();
            assert!(q.contains("\"Total:\\u0001\""));
            assert!(!q.contains("\\u{"));
        }

        #[test]
        fn test_quotes_escaped_in_count_query() {
            let q = Selector::parse("//a[normalize-space()=\"Widget \\ A\"]").to_count_query();
            assert!(q.contains("\"//a[normalize-space()=\\\"Widget \\\\ A\\\"]\""));
        }

        #[test]
        fn test_with_element_wraps_query() {
            let js = Selector::css("#qty").with_element("return { value: el.value };");
            assert!(js.contains("document.querySelector(\"#qty\")"));
            assert!(js.contains("found: false"));
            assert!(js.contains("return { value: el.value };"));
        }
    }
}
