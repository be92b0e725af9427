use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClaudeWebError;

/// Stop reason marking the end of a generated turn.
pub const STOP_SEQUENCE: &str = "stop_sequence";

/// Wire shape of one `data:` frame from `append_message`.
///
/// Every field is optional so an explicit `null` decodes like a missing key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletionFrame {
    #[serde(default)]
    pub completion: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub truncated: Option<bool>,
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub log_id: Option<String>,
    #[serde(default)]
    pub exception: Option<Value>,
    #[serde(rename = "messageLimit", default)]
    pub message_limit: Option<MessageLimit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageLimit {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Decoded form of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub completion: String,
    pub stop_reason: Option<String>,
    /// Frame JSON with the `data: ` marker stripped.
    pub raw: Vec<u8>,
}

impl StreamEvent {
    pub fn from_frame(frame: CompletionFrame, raw: Vec<u8>) -> Self {
        Self {
            completion: frame.completion.unwrap_or_default(),
            stop_reason: frame.stop_reason,
            raw,
        }
    }

    pub fn is_stop_sequence(&self) -> bool {
        self.stop_reason.as_deref() == Some(STOP_SEQUENCE)
    }
}

/// Unit delivered on the reply channel, in canonical arrival order.
#[derive(Debug)]
pub enum PartialResponse {
    Text { text: String, raw: Vec<u8> },
    /// Terminal; nothing follows it on the channel.
    Error(ClaudeWebError),
}

impl PartialResponse {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ClaudeWebError> {
        match self {
            Self::Error(error) => Some(error),
            Self::Text { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<StreamEvent> for PartialResponse {
    fn from(event: StreamEvent) -> Self {
        Self::Text {
            text: event.completion,
            raw: event.raw,
        }
    }
}
