//! Environment configuration.

use std::env;

use claude_web_api::ClaudeWebConfig;

pub const COOKIE_ENV_VAR: &str = "CLAUDE_WEB_COOKIE";
pub const BASE_URL_ENV_VAR: &str = "CLAUDE_WEB_BASE_URL";
pub const PROXY_ENV_VAR: &str = "CLAUDE_WEB_PROXY";
pub const RETRY_ENV_VAR: &str = "CLAUDE_WEB_RETRY";
pub const KEEP_CONVERSATION_ENV_VAR: &str = "CLAUDE_WEB_KEEP_CONVERSATION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub cookie: String,
    pub base_url: Option<String>,
    pub proxy: Option<String>,
    pub retry_budget: Option<u32>,
    pub keep_conversation: bool,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, String> {
        let cookie = env_string_opt(COOKIE_ENV_VAR)
            .ok_or_else(|| format!("{COOKIE_ENV_VAR} must be set to the claude.ai cookie"))?;

        let retry_budget = match env_string_opt(RETRY_ENV_VAR) {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("{RETRY_ENV_VAR} must be a non-negative integer, got {value:?}"))?,
            ),
            None => None,
        };

        Ok(Self {
            cookie,
            base_url: env_string_opt(BASE_URL_ENV_VAR),
            proxy: env_string_opt(PROXY_ENV_VAR),
            retry_budget,
            keep_conversation: env_flag(KEEP_CONVERSATION_ENV_VAR),
        })
    }

    /// Client configuration; the fingerprint still comes from `JA3` via the library default.
    pub fn client_config(&self) -> ClaudeWebConfig {
        let mut config = ClaudeWebConfig::new().insert_header("cookie", self.cookie.clone());
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy.clone());
        }
        if let Some(retry_budget) = self.retry_budget {
            config = config.with_retry_budget(retry_budget);
        }
        config
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn missing_cookie_is_an_error() {
        let _lock = env_lock();
        let _g1 = set_env_guard(COOKIE_ENV_VAR, None);

        let error = EnvConfig::from_env().expect_err("cookie is required");
        assert!(error.contains(COOKIE_ENV_VAR));
    }

    #[test]
    fn optional_values_default_to_unset() {
        let _lock = env_lock();
        let _g1 = set_env_guard(COOKIE_ENV_VAR, Some("sessionKey=abc"));
        let _g2 = set_env_guard(BASE_URL_ENV_VAR, None);
        let _g3 = set_env_guard(PROXY_ENV_VAR, Some("  "));
        let _g4 = set_env_guard(RETRY_ENV_VAR, None);
        let _g5 = set_env_guard(KEEP_CONVERSATION_ENV_VAR, None);

        let config = EnvConfig::from_env().expect("valid environment");
        assert_eq!(
            config,
            EnvConfig {
                cookie: "sessionKey=abc".to_string(),
                base_url: None,
                proxy: None,
                retry_budget: None,
                keep_conversation: false,
            }
        );
    }

    #[test]
    fn values_flow_into_client_config() {
        let _lock = env_lock();
        let _g1 = set_env_guard(COOKIE_ENV_VAR, Some("sessionKey=abc"));
        let _g2 = set_env_guard(BASE_URL_ENV_VAR, Some("http://localhost:9000/api"));
        let _g3 = set_env_guard(PROXY_ENV_VAR, Some("http://127.0.0.1:8080"));
        let _g4 = set_env_guard(RETRY_ENV_VAR, Some("4"));
        let _g5 = set_env_guard(KEEP_CONVERSATION_ENV_VAR, Some("1"));

        let env_config = EnvConfig::from_env().expect("valid environment");
        assert!(env_config.keep_conversation);

        let config = env_config.client_config();
        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(config.retry_budget, 4);
        assert_eq!(
            config.headers.get("cookie").map(String::as_str),
            Some("sessionKey=abc")
        );
    }

    #[test]
    fn unparsable_retry_budget_is_rejected() {
        let _lock = env_lock();
        let _g1 = set_env_guard(COOKIE_ENV_VAR, Some("sessionKey=abc"));
        let _g2 = set_env_guard(RETRY_ENV_VAR, Some("many"));

        let error = EnvConfig::from_env().expect_err("retry must be numeric");
        assert!(error.contains(RETRY_ENV_VAR));
    }
}
