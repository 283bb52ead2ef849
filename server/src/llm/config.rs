//! LLM configuration parsed from environment variables.

use super::types::LlmError;

pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_BEDROCK_MODEL: &str = "anthropic.claude-3-5-haiku-20241022-v1:0";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Bedrock,
    Anthropic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Static AWS credentials used to sign Bedrock requests.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmCredentials {
    Aws(AwsCredentials),
    ApiKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub model: String,
    /// Endpoint root without trailing slash.
    pub base_url: String,
    /// Signing region. Only meaningful for Bedrock.
    pub region: String,
    pub credentials: LlmCredentials,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Optional:
    /// - `LLM_PROVIDER`: `bedrock` (default) or `anthropic`
    /// - `LLM_MODEL`: provider default when absent
    /// - `LLM_BASE_URL`: provider endpoint when absent
    /// - `AWS_REGION`: default `us-east-1`
    /// - `AWS_SESSION_TOKEN`: temporary credentials
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 120
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Required for `bedrock`: `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`.
    /// Required for `anthropic`: `LLM_API_KEY_ENV` (names the env var containing the key).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigParse`] for an unknown provider and
    /// [`LlmError::MissingCredentials`] when a required variable is unset.
    pub fn from_env() -> Result<Self, LlmError> {
        let provider = parse_provider(std::env::var("LLM_PROVIDER").ok().as_deref())?;
        let region = non_empty_var("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string());

        let credentials = match provider {
            LlmProviderKind::Bedrock => LlmCredentials::Aws(AwsCredentials {
                access_key_id: required_var("AWS_ACCESS_KEY_ID")?,
                secret_access_key: required_var("AWS_SECRET_ACCESS_KEY")?,
                session_token: non_empty_var("AWS_SESSION_TOKEN"),
            }),
            LlmProviderKind::Anthropic => {
                let key_var = required_var("LLM_API_KEY_ENV")?;
                LlmCredentials::ApiKey(required_var(&key_var)?)
            }
        };

        let model = non_empty_var("LLM_MODEL").unwrap_or_else(|| default_model(provider).to_string());
        let base_url = non_empty_var("LLM_BASE_URL")
            .unwrap_or_else(|| default_base_url(provider, &region))
            .trim_end_matches('/')
            .to_string();
        let timeouts = LlmTimeouts {
            request_secs: env_parse_u64("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { provider, model, base_url, region, credentials, timeouts })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required_var(key: &str) -> Result<String, LlmError> {
    non_empty_var(key).ok_or_else(|| LlmError::MissingCredentials { var: key.to_string() })
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_provider(raw: Option<&str>) -> Result<LlmProviderKind, LlmError> {
    match raw.unwrap_or("bedrock") {
        "bedrock" => Ok(LlmProviderKind::Bedrock),
        "anthropic" => Ok(LlmProviderKind::Anthropic),
        other => Err(LlmError::ConfigParse(format!("unknown LLM_PROVIDER: {other}"))),
    }
}

fn default_model(provider: LlmProviderKind) -> &'static str {
    match provider {
        LlmProviderKind::Bedrock => DEFAULT_BEDROCK_MODEL,
        LlmProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
    }
}

fn default_base_url(provider: LlmProviderKind, region: &str) -> String {
    match provider {
        LlmProviderKind::Bedrock => format!("https://bedrock-runtime.{region}.amazonaws.com"),
        LlmProviderKind::Anthropic => DEFAULT_ANTHROPIC_BASE_URL.to_string(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
