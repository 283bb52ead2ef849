//! LLM provider adapters for the chat gateway.
//!
//! DESIGN
//! ======
//! Configured from environment variables. The `LlmClient` enum dispatches to
//! Bedrock (SigV4-signed `InvokeModel`) or the Anthropic API based on
//! `LLM_PROVIDER`. Both speak the Claude messages envelope.

pub mod anthropic;
pub mod bedrock;
pub mod config;
pub mod sigv4;
pub mod types;

use config::{LlmConfig, LlmCredentials, LlmProviderKind};
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to either Bedrock or Anthropic.
///
/// Configured from environment variables by [`LlmClient::from_env`].
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Bedrock(bedrock::BedrockClient),
    Anthropic(anthropic::AnthropicClient),
}

impl LlmClient {
    /// Build an LLM client from environment variables.
    ///
    /// See [`LlmConfig::from_env`] for the variables read.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials do not match the provider or the
    /// provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model;
        let inner = match (config.provider, config.credentials) {
            (LlmProviderKind::Bedrock, LlmCredentials::Aws(creds)) => LlmProvider::Bedrock(
                bedrock::BedrockClient::new(&config.base_url, config.region, creds, config.timeouts)?,
            ),
            (LlmProviderKind::Anthropic, LlmCredentials::ApiKey(key)) => {
                LlmProvider::Anthropic(anthropic::AnthropicClient::new(&config.base_url, key, config.timeouts)?)
            }
            (provider, _) => {
                return Err(LlmError::ConfigParse(format!("credentials do not match provider {provider:?}")));
            }
        };
        Ok(Self { inner, model })
    }

    /// Return the configured model id (e.g. `"anthropic.claude-3-5-haiku-20241022-v1:0"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Provider label for logging.
    #[must_use]
    pub fn provider(&self) -> &'static str {
        match &self.inner {
            LlmProvider::Bedrock(_) => "bedrock",
            LlmProvider::Anthropic(_) => "anthropic",
        }
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            LlmProvider::Bedrock(c) => c.chat(&self.model, max_tokens, system, messages).await,
            LlmProvider::Anthropic(c) => c.chat(&self.model, max_tokens, system, messages).await,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
