use std::collections::BTreeMap;

use crate::url::DEFAULT_BASE_URL;

/// Model requested first for every new organization.
pub const PRIMARY_MODEL: &str = "claude-2.0";
/// Model switched to once the primary is rejected as invalid.
pub const SECONDARY_MODEL: &str = "claude-2.1";
/// Minimum number of message-post attempts per reply.
pub const MIN_RETRY_BUDGET: u32 = 2;
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
/// Environment variable overriding the transport fingerprint.
pub const FINGERPRINT_ENV_VAR: &str = "JA3";
pub const DEFAULT_FINGERPRINT: &str = "771,4865-4866-4867-49195-49199-49196-49200-52393-52392-49171-49172-156-157-47-53,0-23-65281-10-11-35-16-5-13-18-51-45-43-27-17513-21,29-23-24,0";

/// Session and transport configuration for the web chat client.
#[derive(Debug, Clone)]
pub struct ClaudeWebConfig {
    /// Base URL for all routes; normalized to end in `/`.
    pub base_url: String,
    /// Optional `user-agent` override.
    pub user_agent: Option<String>,
    /// Caller headers layered over the defaults (cookies go here).
    pub headers: BTreeMap<String, String>,
    /// Optional proxy URL for the default transport.
    pub proxy: Option<String>,
    /// Opaque TLS fingerprint identifier attached to every request.
    pub fingerprint: String,
    pub timezone: String,
    /// Message-post attempts per reply, clamped to [`MIN_RETRY_BUDGET`].
    pub retry_budget: u32,
    pub primary_model: String,
    pub secondary_model: String,
}

impl Default for ClaudeWebConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            headers: BTreeMap::new(),
            proxy: None,
            fingerprint: default_fingerprint(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            retry_budget: MIN_RETRY_BUDGET,
            primary_model: PRIMARY_MODEL.to_string(),
            secondary_model: SECONDARY_MODEL.to_string(),
        }
    }
}

impl ClaudeWebConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_models(
        mut self,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Self {
        self.primary_model = primary.into();
        self.secondary_model = secondary.into();
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Retry budget after clamping; at least one fallback attempt always remains.
    pub fn effective_retry_budget(&self) -> u32 {
        self.retry_budget.max(MIN_RETRY_BUDGET)
    }
}

/// Fingerprint from the `JA3` environment variable, or the built-in default.
pub fn default_fingerprint() -> String {
    std::env::var(FINGERPRINT_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_FINGERPRINT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_budget_is_clamped_to_minimum() {
        assert_eq!(
            ClaudeWebConfig::new().with_retry_budget(0).effective_retry_budget(),
            2
        );
        assert_eq!(
            ClaudeWebConfig::new().with_retry_budget(1).effective_retry_budget(),
            2
        );
        assert_eq!(
            ClaudeWebConfig::new().with_retry_budget(5).effective_retry_budget(),
            5
        );
    }

    #[test]
    fn defaults_match_web_endpoint() {
        let config = ClaudeWebConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.primary_model, PRIMARY_MODEL);
        assert_eq!(config.secondary_model, SECONDARY_MODEL);
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
        assert!(!config.fingerprint.is_empty());
    }
}
