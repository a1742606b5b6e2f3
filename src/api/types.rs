/*!
 * API Types
 * Response envelope returned to the agent tool layer
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool call response: a plain-text message for the agent plus optional data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a serializable payload; serialization failures leave `data` empty
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    /// Render for the LLM tool-call channel
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"message":"failed to encode tool response: {}"}}"#,
                e
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_omits_empty_data() {
        let json = ToolResponse::ok("done").to_json();
        assert_eq!(json, r#"{"success":true,"message":"done"}"#);
    }

    #[test]
    fn test_with_data() {
        let response = ToolResponse::error("nope").with_data(&vec![1, 2]);
        assert!(!response.success);
        assert_eq!(response.data, Some(serde_json::json!([1, 2])));
    }
}
