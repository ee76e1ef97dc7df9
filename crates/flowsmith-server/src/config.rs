//! Server configuration, read once from the environment at startup.
//!
//! Every setting is optional. Values that fail to parse are logged and the
//! default is kept.

use std::str::FromStr;
use std::time::Duration;

use flowsmith_llm::{LlmConfig, Locale};
use tracing::warn;

/// Directory for the JSON log file. Read before the rest of the config so
/// logging is up when config warnings are emitted.
pub const LOG_DIR_VAR: &str = "FLOWSMITH_LOG_DIR";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prompt language when a request does not name one.
    pub locale: Locale,
    pub llm: LlmConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            locale: Locale::En,
            llm: LlmConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("FLOWSMITH_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&get, "FLOWSMITH_PORT") {
            config.port = port;
        }
        if let Some(locale) = parse_var(&get, "FLOWSMITH_LOCALE") {
            config.locale = locale;
        }

        let llm = &mut config.llm;
        if let Some(base_url) = get("OPENAI_BASE_URL") {
            llm.base_url = base_url;
        }
        llm.api_key = get("OPENAI_API_KEY");
        if let Some(model) = get("OPENAI_MODEL") {
            llm.model = model;
        }
        if let Some(temperature) = parse_var(&get, "OPENAI_TEMPERATURE") {
            llm.temperature = Some(temperature);
        }
        if let Some(max_tokens) = parse_var(&get, "OPENAI_MAX_TOKENS") {
            llm.max_tokens = Some(max_tokens);
        }
        if let Some(enable_thinking) = parse_var(&get, "OPENAI_ENABLE_THINKING") {
            llm.enable_thinking = Some(enable_thinking);
        }
        if let Some(secs) = parse_var::<u64>(&get, "OPENAI_TIMEOUT_SECS") {
            llm.timeout = Some(Duration::from_secs(secs));
        }

        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Invalid {} value '{}': {}", key, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.temperature, Some(0.7));
        assert!(config.llm.api_key.is_none());
        assert!(config.llm.timeout.is_none());
    }

    #[test]
    fn reads_every_setting() {
        let config = config_from(&[
            ("FLOWSMITH_HOST", "127.0.0.1"),
            ("FLOWSMITH_PORT", "8080"),
            ("FLOWSMITH_LOCALE", "zh"),
            ("OPENAI_BASE_URL", "https://api-inference.modelscope.cn/v1"),
            ("OPENAI_API_KEY", "sk-123"),
            ("OPENAI_MODEL", "Qwen/Qwen3-32B"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("OPENAI_MAX_TOKENS", "2048"),
            ("OPENAI_ENABLE_THINKING", "false"),
            ("OPENAI_TIMEOUT_SECS", "30"),
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.locale, Locale::Zh);
        assert_eq!(config.llm.base_url, "https://api-inference.modelscope.cn/v1");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-123"));
        assert_eq!(config.llm.model, "Qwen/Qwen3-32B");
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.llm.max_tokens, Some(2048));
        assert_eq!(config.llm.enable_thinking, Some(false));
        assert_eq!(config.llm.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = config_from(&[
            ("FLOWSMITH_PORT", "eighty"),
            ("FLOWSMITH_LOCALE", "fr"),
            ("OPENAI_TEMPERATURE", "warm"),
            ("OPENAI_API_KEY", "  "),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.llm.temperature, Some(0.7));
        assert!(config.llm.api_key.is_none());
    }
}
