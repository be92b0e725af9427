/// Default origin for the web chat endpoints.
pub const DEFAULT_BASE_URL: &str = "https://claude.ai/api";

/// Normalize a base URL so routes can be appended directly.
///
/// Blank input falls back to [`DEFAULT_BASE_URL`]; the result always ends in `/`.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

/// Join a normalized base URL with a relative route.
pub fn endpoint(base_url: &str, route: &str) -> String {
    format!(
        "{}{}",
        normalize_base_url(base_url),
        route.trim_start_matches('/')
    )
}

pub fn conversations_route(organization_id: &str) -> String {
    format!("organizations/{organization_id}/chat_conversations")
}

pub fn conversation_route(organization_id: &str, conversation_id: &str) -> String {
    format!("organizations/{organization_id}/chat_conversations/{conversation_id}")
}
