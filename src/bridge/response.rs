//! Structured results returned by the bridge's wrapper functions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the failure reason in an error response.
pub const ERROR_MESSAGE_KEY: &str = "error_message";

/// Outcome flag of a [`ToolResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The call succeeded.
    Success,
    /// The call failed; see `error_message`.
    Error,
}

/// A `{status, ...}` mapping handed back to agent code.
///
/// Serializes flat: `{"status": "success", "message": ..., "results": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Success or error.
    pub status: Status,
    /// Every other field of the mapping.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ToolResponse {
    /// Creates an empty success response.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            fields: Map::new(),
        }
    }

    /// Creates an error response carrying `message`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            fields: Map::new(),
        }
        .with(ERROR_MESSAGE_KEY, message.into())
    }

    /// Adds a field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Returns `true` when `status` is success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Returns a string field.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns the failure reason of an error response.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.text(ERROR_MESSAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_flat() {
        let response = ToolResponse::success()
            .with("message", "done")
            .with("results", "text");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "success", "message": "done", "results": "text"})
        );
    }

    #[test]
    fn test_error_carries_message() {
        let response = ToolResponse::error("boom");
        assert!(!response.is_success());
        assert_eq!(response.error_message(), Some("boom"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "error", "error_message": "boom"})
        );
    }

    #[test]
    fn test_parses_server_payload() {
        let response: ToolResponse =
            serde_json::from_str(r#"{"status":"success","message":"Document 'a' added."}"#)
                .unwrap();
        assert!(response.is_success());
        assert_eq!(response.text("message"), Some("Document 'a' added."));
    }

    #[test]
    fn test_rejects_unknown_status() {
        assert!(serde_json::from_str::<ToolResponse>(r#"{"status":"pending"}"#).is_err());
    }
}
