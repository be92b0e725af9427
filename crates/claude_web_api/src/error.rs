use serde::Deserialize;
use thiserror::Error;

/// Rejection message the web endpoint returns for a deprecated model identifier.
pub const INVALID_MODEL_MESSAGE: &str = "Invalid model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to fetch the organization id")]
    OrganizationUnresolved,
    #[error("failed to fetch the conversation id")]
    ConversationUnresolved,
}

#[derive(Debug, Error)]
pub enum ClaudeWebError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} rejected: {message}")]
    RemoteRejection {
        status: u16,
        kind: Option<String>,
        message: String,
    },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected HTTP {status} for message post: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("stream read failure: {0}")]
    StreamRead(String),

    #[error("response stream was cancelled")]
    Cancelled,

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClaudeWebError {
    /// True when the remote side rejected the request's model identifier.
    pub fn is_invalid_model(&self) -> bool {
        matches!(self, Self::RemoteRejection { message, .. } if message == INVALID_MODEL_MESSAGE)
    }

    /// HTTP status for errors that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejection { status, .. }
            | Self::Status { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClaudeWebError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub message: Option<String>,
}

/// Map the body of a failed (status >= 400) response to an error.
///
/// Structured `{"error": {...}}` bodies become [`ClaudeWebError::RemoteRejection`];
/// anything else keeps the raw body text.
pub fn rejection_from_body(status: u16, body: &[u8]) -> ClaudeWebError {
    if let Ok(ErrorPayload { value: Some(fields) }) = serde_json::from_slice::<ErrorPayload>(body)
    {
        return ClaudeWebError::RemoteRejection {
            status,
            kind: fields.type_.filter(|value| !value.is_empty()),
            message: fields.message.unwrap_or_default(),
        };
    }

    let body = String::from_utf8_lossy(body).trim().to_string();
    ClaudeWebError::Status {
        status,
        body: if body.is_empty() {
            "request failed".to_owned()
        } else {
            body
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_invalid_model_body_is_detected() {
        let error = rejection_from_body(
            400,
            br#"{"error":{"type":"invalid_request_error","message":"Invalid model"}}"#,
        );

        assert!(error.is_invalid_model());
        assert_eq!(error.status(), Some(400));
    }

    #[test]
    fn other_rejection_messages_are_not_invalid_model() {
        let error = rejection_from_body(
            403,
            br#"{"error":{"type":"permission_error","message":"Invalid model name"}}"#,
        );

        assert!(!error.is_invalid_model());
        assert!(matches!(
            error,
            ClaudeWebError::RemoteRejection { kind: Some(ref kind), .. } if kind == "permission_error"
        ));
    }

    #[test]
    fn unstructured_body_is_kept_verbatim() {
        let error = rejection_from_body(502, b"<html>bad gateway</html>");

        assert!(matches!(
            error,
            ClaudeWebError::Status { status: 502, ref body } if body == "<html>bad gateway</html>"
        ));
    }

    #[test]
    fn empty_body_uses_placeholder_text() {
        let error = rejection_from_body(500, b"");
        assert_eq!(error.to_string(), "HTTP 500: request failed");
    }
}
