use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request, State},
};
use serde_json::Value;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

/// JSON body extractor that accepts any content type and rejects
/// anything that is not a JSON object with `AppError::InvalidBody`.
pub struct ChatPayload(pub ChatRequest);

impl<S> FromRequest<S> for ChatPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|err| {
            tracing::warn!(error = %err, "failed to read request body");
            AppError::InvalidBody
        })?;
        parse_chat_request(&bytes).map(ChatPayload)
    }
}

pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, AppError> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        tracing::warn!(error = %err, body = %String::from_utf8_lossy(body), "rejecting non-JSON body");
        AppError::InvalidBody
    })?;

    tracing::info!(payload = %value, "received chat payload");

    if !value.is_object() {
        tracing::warn!("rejecting JSON body that is not an object");
        return Err(AppError::InvalidBody);
    }

    serde_json::from_value(value).map_err(|err| {
        tracing::warn!(error = %err, "rejecting chat payload");
        AppError::InvalidBody
    })
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    ChatPayload(payload): ChatPayload,
) -> Result<Json<ChatResponse>, AppError> {
    let text = payload.text();
    match state.completions.complete(&text).await {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(err) => {
            tracing::error!(error = %err, "completion failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_null_text_default_to_empty() {
        assert_eq!(parse_chat_request(b"{}").unwrap().text(), "");
        assert_eq!(parse_chat_request(br#"{"text":null}"#).unwrap().text(), "");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let req = parse_chat_request(br#"{"text":"hi","lang":"en"}"#).unwrap();
        assert_eq!(req.text(), "hi");
    }

    #[test]
    fn rejects_non_objects() {
        let bodies: [&[u8]; 6] = [b"", b"not json", b"null", b"[\"hi\"]", b"\"hi\"", b"42"];
        for body in bodies {
            assert!(
                matches!(parse_chat_request(body), Err(AppError::InvalidBody)),
                "accepted {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn non_string_text_is_stringified() {
        assert_eq!(parse_chat_request(br#"{"text":123}"#).unwrap().text(), "123");
        assert_eq!(parse_chat_request(br#"{"text":true}"#).unwrap().text(), "true");
        assert_eq!(parse_chat_request(br#"{"text":["a"]}"#).unwrap().text(), r#"["a"]"#);
    }
}
