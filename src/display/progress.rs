//! Stage status lines for CLI output
//!
//! Status lines go to stderr so that `--format json` output on stdout stays
//! machine readable.

use crate::display::ColourManager;

/// Status indicator symbols with unicode support
#[derive(Debug, Clone)]
pub struct StatusSymbols {
    pub info: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
}

impl Default for StatusSymbols {
    fn default() -> Self {
        Self {
            info: "ℹ️",
            success: "✅",
            warning: "⚠️",
            error: "❌",
        }
    }
}

impl StatusSymbols {
    /// ASCII-only symbols for terminals without unicode support
    pub fn ascii() -> Self {
        Self {
            info: "[INFO]",
            success: "[ OK ]",
            warning: "[WARN]",
            error: "[FAIL]",
        }
    }
}

/// Status type for different kinds of messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    Info,
    Success,
    Warning,
    Error,
}

/// Progress indicator manager
#[derive(Debug, Clone)]
pub struct ProgressIndicator {
    colour_manager: ColourManager,
    symbols: StatusSymbols,
    quiet: bool,
}

impl ProgressIndicator {
    pub fn new(colour_manager: ColourManager) -> Self {
        let symbols = if Self::supports_unicode() { StatusSymbols::default() } else { StatusSymbols::ascii() };
        Self { colour_manager, symbols, quiet: false }
    }

    /// Suppress everything but warnings and errors (-q)
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Check if terminal supports unicode characters
    fn supports_unicode() -> bool {
        ["LC_ALL", "LC_CTYPE", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
            .map(|value| {
                let value = value.to_lowercase();
                value.contains("utf-8") || value.contains("utf8")
            })
            .unwrap_or(false)
    }

    pub fn colours(&self) -> &ColourManager {
        &self.colour_manager
    }

    /// Render a status line without printing it
    pub fn format_status(&self, status_type: StatusType, message: &str) -> String {
        let (symbol, coloured) = match status_type {
            StatusType::Info => (self.symbols.info, self.colour_manager.info(message)),
            StatusType::Success => (self.symbols.success, self.colour_manager.success(message)),
            StatusType::Warning => (self.symbols.warning, self.colour_manager.warning(message)),
            StatusType::Error => (self.symbols.error, self.colour_manager.error(message)),
        };
        format!("{} {}", symbol, coloured)
    }

    /// Display a status message with appropriate symbol and colour
    pub fn status(&self, status_type: StatusType, message: &str) {
        if self.quiet && matches!(status_type, StatusType::Info | StatusType::Success) {
            return;
        }
        eprintln!("{}", self.format_status(status_type, message));
    }
}
