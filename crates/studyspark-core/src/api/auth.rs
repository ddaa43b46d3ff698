use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Error payload returned by the backend on rejected requests.
///
/// FastAPI answers with `{"detail": "..."}` or, for validation failures,
/// `{"detail": [{"msg": "...", ...}]}`; other stacks use `message` or `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        let detail = self.detail.as_ref().and_then(|detail| match detail {
            Value::String(text) => Some(text.clone()),
            Value::Array(items) => items
                .first()
                .and_then(|item| item.get("msg"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        });
        [detail, self.message.clone(), self.error.clone()]
            .into_iter()
            .flatten()
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
    }

    /// Extracts a reason from an arbitrary JSON response body.
    #[must_use]
    pub fn reason_from_value(body: &Value) -> Option<String> {
        serde_json::from_value::<ErrorBody>(body.clone())
            .ok()
            .and_then(|parsed| parsed.reason())
    }
}
