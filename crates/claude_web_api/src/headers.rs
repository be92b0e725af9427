use std::collections::BTreeMap;

use crate::config::ClaudeWebConfig;

pub const HEADER_USER_AGENT: &str = "user-agent";
pub const HEADER_REFERER: &str = "referer";
pub const HEADER_ACCEPT: &str = "accept";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36 Edg/114.0.1823.79";
pub const DEFAULT_REFERER: &str = "https://claude.ai";
pub const EVENT_STREAM: &str = "text/event-stream";

/// Which default header set a request starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Organization, conversation and deletion calls.
    Standard,
    /// The streamed message post.
    EventStream,
}

/// Build a deterministic header map; caller headers override the defaults.
pub fn build_headers(config: &ClaudeWebConfig, profile: HeaderProfile) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    let user_agent = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent.to_owned());

    if profile == HeaderProfile::EventStream {
        headers.insert(HEADER_REFERER.to_owned(), DEFAULT_REFERER.to_owned());
        headers.insert(HEADER_ACCEPT.to_owned(), EVENT_STREAM.to_owned());
    }

    for (key, value) in &config.headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value.trim().to_owned());
    }

    headers
}
