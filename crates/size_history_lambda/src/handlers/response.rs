use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `{statusCode, headers, body}` shape understood by API Gateway and Lambda callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl HandlerResponse {
    pub fn message(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            headers: json!({"Content-Type": "application/json"}),
            body: Value::String(message.to_string()).to_string(),
        }
    }

    pub fn json(status_code: u16, payload: Value) -> Self {
        Self {
            status_code,
            headers: json!({"Content-Type": "application/json"}),
            body: payload.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
