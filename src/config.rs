//! Runtime configuration read from the environment (and `.env`).

use crate::http::auth::{ApiKey, UrlParam};
use crate::http::{BasicClient, HttpClient};
use crate::llm::{ChatModel, DEFAULT_MAX_ATTEMPTS};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_PATH: &str =
    "data/MTA_Congestion_Relief_Zone_Vehicle_Entries__Beginning_2025.csv";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How the API key is attached to model requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `Authorization: Bearer <key>` header.
    Bearer,
    /// `?key=<key>` query parameter.
    Query,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_attempts: u32,
    pub timeout: Duration,
    pub auth: AuthMode,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub llm: LlmConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset and blank values
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_attempts = match get("LLM_MAX_ATTEMPTS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("LLM_MAX_ATTEMPTS must be a positive integer, got '{v}'"))?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        if max_attempts == 0 {
            bail!("LLM_MAX_ATTEMPTS must be at least 1");
        }

        let timeout_secs = match get("LLM_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("LLM_TIMEOUT_SECS must be a number of seconds, got '{v}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let auth = match get("LLM_AUTH").map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("bearer") => AuthMode::Bearer,
            Some("query") => AuthMode::Query,
            Some(other) => bail!("LLM_AUTH must be 'bearer' or 'query', got '{other}'"),
        };

        Ok(Config {
            data_path: get("CRZ_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            llm: LlmConfig {
                base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                api_key: get("LLM_API_KEY"),
                model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_attempts,
                timeout: Duration::from_secs(timeout_secs),
                auth,
            },
        })
    }
}

impl LlmConfig {
    /// Builds the chat model, wrapping the transport with the configured
    /// authentication. Without a key requests go out unauthenticated, as a
    /// local server expects.
    pub fn chat_model(&self) -> Result<ChatModel> {
        let basic = BasicClient::new(self.timeout).context("failed to build HTTP client")?;

        let client: Box<dyn HttpClient> = match (&self.api_key, self.auth) {
            (None, _) => Box::new(basic),
            (Some(key), AuthMode::Bearer) => Box::new(ApiKey::bearer(basic, key)?),
            (Some(key), AuthMode::Query) => Box::new(UrlParam::key(basic, key.as_str())),
        };

        Ok(ChatModel::new(client, &self.base_url, self.model.clone()))
    }
}
