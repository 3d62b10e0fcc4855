//! Output formatting for CLI commands.

use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable reports.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything other than `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Serializes `value` as pretty JSON followed by a newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let mut json = serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!(r#"{{"error": "serialization failed: {e}"}}"#));
        json.push('\n');
        json
    }
}

/// Terminates `text` with exactly one newline.
#[must_use]
pub fn line(text: impl Into<String>) -> String {
    let mut text = text.into();
    while text.ends_with('\n') {
        text.pop();
    }
    text.push('\n');
    text
}
