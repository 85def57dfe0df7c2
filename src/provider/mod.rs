//! Chat backend trait and per-provider adapters.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "google")]
pub mod google;

#[cfg(feature = "groq")]
pub mod groq;

use async_trait::async_trait;
use futures::stream::BoxStream;
use strum::{Display, EnumString};

use crate::agent::ToolChoice;
use crate::config::Config;
use crate::error::{MurmurError, Result};
use crate::types::{Message, MessageDelta};

/// A normalized request sent to a chat backend.
///
/// `messages` carries the full orchestration view (system message in-band at
/// index 0, sender tags, tool-call bookkeeping); each adapter strips what its
/// wire format does not express.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<ToolChoice>,
    pub parallel_tool_calls: bool,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Core trait implemented by all chat backends.
///
/// Adapters normalize one provider's request/response shapes; the
/// orchestrator talks only to this contract. Absent tool calls normalize to
/// `None`, never an error.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g. "openai", "anthropic").
    fn name(&self) -> &str;

    /// One blocking completion, normalized to an assistant [`Message`].
    async fn complete(&self, request: &ChatRequest) -> Result<Message>;

    /// One streaming completion as incremental [`MessageDelta`]s.
    ///
    /// Backends with no native streaming fake it as a single full chunk.
    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<MessageDelta>>>;
}

/// Token selecting which backend adapter to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
    Groq,
}

/// Create a backend adapter for the given kind, using the provided config.
///
/// Fails immediately for a kind whose feature is disabled or whose API key
/// is missing.
#[allow(unused_variables)]
pub fn create_provider(kind: ProviderKind, config: &Config) -> Result<Box<dyn ChatProvider>> {
    match kind {
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => {
            let api_key = config
                .get_api_key("openai")
                .ok_or_else(|| MurmurError::Authentication("Missing OPENAI_API_KEY".into()))?;
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key,
                config.get_base_url("openai"),
            )))
        }
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => {
            let api_key = config
                .get_api_key("anthropic")
                .ok_or_else(|| MurmurError::Authentication("Missing ANTHROPIC_API_KEY".into()))?;
            Ok(Box::new(anthropic::AnthropicProvider::new(
                api_key,
                config.get_base_url("anthropic"),
            )))
        }
        #[cfg(feature = "google")]
        ProviderKind::Google => {
            let api_key = config
                .get_api_key("google")
                .ok_or_else(|| MurmurError::Authentication("Missing GOOGLE_API_KEY".into()))?;
            Ok(Box::new(google::GoogleProvider::new(
                api_key,
                config.get_base_url("google"),
            )))
        }
        #[cfg(feature = "groq")]
        ProviderKind::Groq => {
            let api_key = config
                .get_api_key("groq")
                .ok_or_else(|| MurmurError::Authentication("Missing GROQ_API_KEY".into()))?;
            Ok(Box::new(groq::GroqProvider::new(
                api_key,
                config.get_base_url("groq"),
            )))
        }
        #[allow(unreachable_patterns)]
        _ => Err(MurmurError::UnsupportedProvider(format!(
            "provider '{kind}' not enabled via feature flags"
        ))),
    }
}
