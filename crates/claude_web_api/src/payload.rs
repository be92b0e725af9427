use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied attachment forwarded unmodified in the message post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attachment(pub Value);

impl From<Value> for Attachment {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Body of `POST organizations/{org}/chat_conversations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub name: String,
    pub uuid: String,
}

impl CreateConversationRequest {
    /// Unnamed conversation with a freshly generated v4 identifier.
    pub fn generated() -> Self {
        Self {
            name: String::new(),
            uuid: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Body of `POST append_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendMessageRequest {
    pub attachments: Vec<Attachment>,
    pub conversation_uuid: String,
    pub organization_uuid: String,
    pub text: String,
    pub completion: CompletionParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionParams {
    pub model: String,
    pub prompt: String,
    pub timezone: String,
}

impl AppendMessageRequest {
    pub fn new(
        organization_id: impl Into<String>,
        conversation_id: impl Into<String>,
        model: impl Into<String>,
        prompt: impl Into<String>,
        timezone: impl Into<String>,
        attachments: &[Attachment],
    ) -> Self {
        let prompt = prompt.into();
        Self {
            attachments: attachments.to_vec(),
            conversation_uuid: conversation_id.into(),
            organization_uuid: organization_id.into(),
            text: prompt.clone(),
            completion: CompletionParams {
                model: model.into(),
                prompt,
                timezone: timezone.into(),
            },
        }
    }
}

/// First organization's `uuid` from the `GET organizations` listing.
pub(crate) fn first_organization_id(body: &[u8]) -> Result<Option<String>, serde_json::Error> {
    let organizations = serde_json::from_slice::<Vec<Value>>(body)?;
    Ok(organizations.first().and_then(uuid_field))
}

/// `uuid` of a freshly created conversation.
pub(crate) fn created_conversation_id(body: &[u8]) -> Result<Option<String>, serde_json::Error> {
    let conversation = serde_json::from_slice::<Value>(body)?;
    Ok(uuid_field(&conversation))
}

fn uuid_field(value: &Value) -> Option<String> {
    value
        .get("uuid")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
