//! Configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_STREAM_MODEL: &str = "gpt-5-nano";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 100_000;
pub const DEFAULT_SUMMARY_MAX_TOKENS: u32 = 200;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Reasoning-effort hint forwarded to reasoning-capable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

impl std::str::FromStr for ReasoningEffort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(Error::Config(format!("unknown reasoning effort: {}", other))),
        }
    }
}

/// Default model names and token ceilings for each route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefaults {
    /// Model used by the streaming relay when the caller names none.
    pub stream_model: String,
    /// Model used by the buffered relay when the caller names none.
    pub chat_model: String,
    /// Model used by the diff summarizer.
    pub summary_model: String,
    /// Token budget for both relays when the caller gives none.
    pub max_tokens: u32,
    /// Token ceiling for the one-sentence diff summary.
    pub summary_max_tokens: u32,
    pub reasoning_effort: Option<ReasoningEffort>,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            stream_model: DEFAULT_STREAM_MODEL.into(),
            chat_model: DEFAULT_CHAT_MODEL.into(),
            summary_model: DEFAULT_SUMMARY_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            summary_max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
            reasoning_effort: None,
        }
    }
}

/// Where simulation records live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Local SQLite file (`<data_dir>/gist.db`).
    Sqlite { path: PathBuf },
    /// Hosted PostgREST endpoint (Supabase).
    Postgrest {
        url: String,
        #[serde(skip_serializing)]
        service_key: String,
    },
}

/// Top-level Gist configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistConfig {
    /// HTTP server port.
    pub port: u16,
    pub data_dir: PathBuf,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    /// Base URL of the Responses API, without a trailing slash.
    pub openai_base_url: String,
    pub models: ModelDefaults,
    /// Prepend the instruction bundle on the streaming route too.
    pub stream_instructions: bool,
    /// Replaces the bundled simulation schema when set.
    pub schema_path: Option<PathBuf>,
    pub http_timeout: Duration,
    pub store: StoreConfig,
}

impl GistConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| Error::Config(format!("invalid PORT: {}", p)))?,
            None => DEFAULT_PORT,
        };

        let data_dir = get("GIST_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let defaults = ModelDefaults::default();
        let models = ModelDefaults {
            stream_model: get("GIST_STREAM_MODEL").unwrap_or(defaults.stream_model),
            chat_model: get("GIST_CHAT_MODEL").unwrap_or(defaults.chat_model),
            summary_model: get("GIST_SUMMARY_MODEL").unwrap_or(defaults.summary_model),
            max_tokens: parse_or("GIST_MAX_TOKENS", get("GIST_MAX_TOKENS"), DEFAULT_MAX_TOKENS)?,
            summary_max_tokens: parse_or(
                "GIST_SUMMARY_MAX_TOKENS",
                get("GIST_SUMMARY_MAX_TOKENS"),
                DEFAULT_SUMMARY_MAX_TOKENS,
            )?,
            reasoning_effort: get("GIST_REASONING_EFFORT")
                .map(|v| v.parse())
                .transpose()?,
        };

        let stream_instructions = match get("GIST_STREAM_INSTRUCTIONS") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| Error::Config(format!("invalid GIST_STREAM_INSTRUCTIONS: {}", v)))?,
            None => false,
        };

        let http_timeout = Duration::from_secs(parse_or(
            "GIST_HTTP_TIMEOUT_SECS",
            get("GIST_HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let store = match (get("SUPABASE_URL"), get("SUPABASE_PRIVATE_KEY")) {
            (Some(url), Some(service_key)) => StoreConfig::Postgrest {
                url: url.trim_end_matches('/').to_string(),
                service_key,
            },
            (Some(_), None) => {
                return Err(Error::Config(
                    "SUPABASE_URL is set but SUPABASE_PRIVATE_KEY is missing".into(),
                ))
            }
            _ => StoreConfig::Sqlite {
                path: data_dir.join("gist.db"),
            },
        };

        Ok(Self {
            port,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            models,
            stream_instructions,
            schema_path: get("GIST_SCHEMA_PATH").map(PathBuf::from),
            http_timeout,
            store,
            data_dir,
        })
    }

    /// The API key, or a configuration error when it is absent.
    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".into()))
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid {}: {}", key, v))),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<GistConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GistConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.openai_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.models.stream_model, "gpt-5-nano");
        assert_eq!(config.models.chat_model, "gpt-5-mini");
        assert_eq!(config.models.summary_max_tokens, 200);
        assert!(!config.stream_instructions);
        assert!(config.openai_api_key.is_none());
        assert!(matches!(config.store, StoreConfig::Sqlite { ref path } if path.ends_with("gist.db")));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9100"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:4000/v1/"),
            ("GIST_REASONING_EFFORT", "Low"),
            ("GIST_STREAM_INSTRUCTIONS", "yes"),
            ("SUPABASE_URL", "https://example.supabase.co/"),
            ("SUPABASE_PRIVATE_KEY", "service"),
        ])
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.openai_base_url, "http://localhost:4000/v1");
        assert_eq!(config.models.reasoning_effort, Some(ReasoningEffort::Low));
        assert!(config.stream_instructions);
        match config.store {
            StoreConfig::Postgrest { url, .. } => assert_eq!(url, "https://example.supabase.co"),
            other => panic!("unexpected store: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(config_from(&[("PORT", "abc")]), Err(Error::Config(_))));
        assert!(matches!(
            config_from(&[("GIST_REASONING_EFFORT", "extreme")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_from(&[("SUPABASE_URL", "https://x.supabase.co")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_api_key() {
        let config = config_from(&[("OPENAI_API_KEY", "  ")]).unwrap();
        assert!(matches!(config.require_api_key(), Err(Error::Config(_))));
    }
}
