//! One-shot dialog handling (alert, confirm, prompt).
//!
//! A [`DialogGuard`] is armed right before an action that is expected to
//! raise a dialog and disarmed as soon as that action completes. It answers
//! at most one dialog. Nothing stays registered on the page afterwards.

use serde::{Deserialize, Serialize};

/// Type of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogType {
    /// Alert dialog (OK button only)
    Alert,
    /// Confirm dialog (OK/Cancel buttons)
    Confirm,
    /// Prompt dialog (text input + OK/Cancel)
    Prompt,
}

impl std::fmt::Display for DialogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

/// How to answer the expected dialog
///
/// In YAML this is `accept`, `dismiss` or `{ accept_with: "text" }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ResponseRepr", into = "ResponseRepr")]
pub enum DialogResponse {
    /// OK / Yes / Leave
    #[default]
    Accept,
    /// OK with prompt text
    AcceptWith(String),
    /// Cancel / No / Stay
    Dismiss,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ResponseWord {
    Accept,
    Dismiss,
}

// Untagged so a bare word and a one-key map both parse in YAML and JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ResponseRepr {
    Word(ResponseWord),
    AcceptWith { accept_with: String },
}

impl From<ResponseRepr> for DialogResponse {
    fn from(repr: ResponseRepr) -> Self {
        match repr {
            ResponseRepr::Word(ResponseWord::Accept) => Self::Accept,
            ResponseRepr::Word(ResponseWord::Dismiss) => Self::Dismiss,
            ResponseRepr::AcceptWith { accept_with } => Self::AcceptWith(accept_with),
        }
    }
}

impl From<DialogResponse> for ResponseRepr {
    fn from(response: DialogResponse) -> Self {
        match response {
            DialogResponse::Accept => Self::Word(ResponseWord::Accept),
            DialogResponse::Dismiss => Self::Word(ResponseWord::Dismiss),
            DialogResponse::AcceptWith(accept_with) => Self::AcceptWith { accept_with },
        }
    }
}

impl DialogResponse {
    /// Whether the dialog is accepted
    #[must_use]
    pub const fn accepts(&self) -> bool {
        !matches!(self, Self::Dismiss)
    }
}

/// A dialog that was raised while a guard was armed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Type of dialog
    #[serde(rename = "type")]
    pub dialog_type: DialogType,
    /// Message displayed in the dialog
    pub message: String,
}

impl Dialog {
    /// Create a new dialog record
    #[must_use]
    pub fn new(dialog_type: DialogType, message: impl Into<String>) -> Self {
        Self {
            dialog_type,
            message: message.into(),
        }
    }
}

/// One-shot dialog handler scoped to a single action
#[derive(Debug)]
pub struct DialogGuard {
    response: Option<DialogResponse>,
    handled: Vec<Dialog>,
}

impl DialogGuard {
    /// Arm a handler that answers the next dialog with `response`
    #[must_use]
    pub fn arm(response: DialogResponse) -> Self {
        Self {
            response: Some(response),
            handled: Vec::new(),
        }
    }

    /// Whether the one shot is still available
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.response.is_some()
    }

    /// Answer a dialog. The first call consumes the armed response; any
    /// later dialog gets the browser default (dismiss).
    pub fn handle(&mut self, dialog: Dialog) -> DialogResponse {
        self.handled.push(dialog);
        self.response.take().unwrap_or(DialogResponse::Dismiss)
    }

    /// Record dialogs observed out-of-process (browser shim)
    pub fn record(&mut self, dialogs: impl IntoIterator<Item = Dialog>) {
        let before = self.handled.len();
        self.handled.extend(dialogs);
        if self.handled.len() > before {
            self.response = None;
        }
    }

    /// Deregister and return what was handled
    #[must_use]
    pub fn disarm(mut self) -> Vec<Dialog> {
        self.response = None;
        std::mem::take(&mut self.handled)
    }

    /// Page script that installs the one-shot shim over the dialog functions.
    ///
    /// Each replaced function answers once, then puts all originals back.
    #[must_use]
    pub fn install_script(&self) -> String {
        let response = self.response.clone().unwrap_or(DialogResponse::Dismiss);
        let confirm = response.accepts();
        let prompt = match &response {
            DialogResponse::AcceptWith(text) => {
                serde_json::to_string(text).unwrap_or_else(|_| "''".to_string())
            }
            DialogResponse::Accept => "(d === undefined ? '' : String(d))".to_string(),
            DialogResponse::Dismiss => "null".to_string(),
        };
        format!(
            "(() => {{ \
               const saved = {{ alert: window.alert, confirm: window.confirm, prompt: window.prompt }}; \
               const handled = []; \
               const restore = () => {{ window.alert = saved.alert; window.confirm = saved.confirm; window.prompt = saved.prompt; }}; \
               window.__tabflowDialog = {{ handled, restore }}; \
               window.alert = (m) => {{ handled.push({{ type: 'alert', message: String(m ?? '') }}); restore(); }}; \
               window.confirm = (m) => {{ handled.push({{ type: 'confirm', message: String(m ?? '') }}); restore(); return {confirm}; }}; \
               window.prompt = (m, d) => {{ handled.push({{ type: 'prompt', message: String(m ?? '') }}); restore(); return {prompt}; }}; \
               return true; \
             }})()"
        )
    }

    /// Page script that removes the shim and returns the handled dialogs
    #[must_use]
    pub const fn restore_script() -> &'static str {
        "(() => { const s = window.__tabflowDialog; if (!s) { return []; } \
         s.restore(); delete window.__tabflowDialog; return s.handled; })()"
    }
}
