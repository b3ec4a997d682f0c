//! CLI configuration

use serde::{Deserialize, Serialize};

/// How much the CLI prints and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// `-q`: errors and failed rows only
    Quiet,
    /// Progress, per-row lines and the summary
    #[default]
    Normal,
    /// `-v`: also info-level logs
    Verbose,
    /// `-vv`: per-step debug logs
    Debug,
}

impl Verbosity {
    /// Build from the `-q` flag and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Only failures are printed
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Default tracing filter for this level
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// When to color terminal output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Force colors
    Always,
    /// Color when stderr is a color-capable terminal
    #[default]
    Auto,
    /// Plain text
    Never,
}

impl ColorChoice {
    /// Resolve to a yes/no for the current stderr
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Settings shared by every subcommand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Output and log level
    pub verbosity: Verbosity,
    /// Color policy
    pub color: ColorChoice,
    /// Log format
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the color policy
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }
}
