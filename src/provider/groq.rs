//! Groq adapter (OpenAI-compatible).

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{Message, MessageDelta};

use super::openai::OpenAiProvider;
use super::{ChatProvider, ChatRequest};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    inner: OpenAiProvider,
}

impl GroqProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            inner: OpenAiProvider::compatible(
                "groq",
                api_key,
                base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ),
        }
    }
}

#[async_trait]
impl ChatProvider for GroqProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Message> {
        self.inner.complete(request).await
    }

    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<MessageDelta>>> {
        self.inner.stream(request).await
    }
}
