// src/message.rs
use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /chat`.
///
/// `text` may be omitted or `null`; both are treated as an empty prompt.
/// Any other non-string value is forwarded as its JSON text.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub text: Option<Value>,
}

impl ChatRequest {
    pub fn text(&self) -> Cow<'_, str> {
        match &self.text {
            None | Some(Value::Null) => Cow::Borrowed(""),
            Some(Value::String(s)) => Cow::Borrowed(s),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
