// ABOUTME: Centralized CLI output utilities for consistent user-facing messages
// ABOUTME: Formats errors, warnings and hints on stderr, never on the image output

use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Centralized CLI output utilities for consistent formatting
pub struct CliOutput {
    use_color: bool,
}

impl CliOutput {
    /// Create new CLI output utility with TTY and NO_COLOR detection
    pub fn new() -> Self {
        Self {
            use_color: std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Create CLI output utility with explicit color setting
    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.format("error:", message, Level::Error));
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.format("warning:", message, Level::Warning));
    }

    pub fn hint(&self, message: &str) {
        eprintln!("{}", self.format("hint:", message, Level::Hint));
    }

    fn format(&self, label: &str, message: &str, level: Level) -> String {
        if !self.use_color {
            return format!("{} {}", label, message);
        }

        match level {
            Level::Error => format!("{} {}", label.red().bold(), message),
            Level::Warning => format!("{} {}", label.yellow().bold(), message),
            Level::Hint => format!("{} {}", label.blue().bold(), message),
        }
    }
}

#[derive(Clone, Copy)]
enum Level {
    Error,
    Warning,
    Hint,
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new()
    }
}
