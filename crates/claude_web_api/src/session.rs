/// Per-client conversation state.
///
/// Identifiers are resolved at most once and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) organization_id: Option<String>,
    pub(crate) conversation_id: Option<String>,
    pub(crate) model: String,
}

impl Session {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            organization_id: None,
            conversation_id: None,
            model: model.into(),
        }
    }

    /// Resume under a known organization without the lookup call.
    pub fn with_organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = non_blank(organization_id.into());
        self
    }

    /// Resume a known remote conversation without the creation call.
    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = non_blank(conversation_id.into());
        self
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_resolved(&self) -> bool {
        self.organization_id.is_some() && self.conversation_id.is_some()
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
