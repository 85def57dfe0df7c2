//! Google Gemini adapter.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Deserialize;
use tracing::debug;

use crate::agent::ToolChoice;
use crate::error::{MurmurError, Result};
use crate::types::{Message, MessageDelta, Role, ToolCall, ToolCallDelta};

use super::http::{shared_client, status_to_error};
use super::{ChatProvider, ChatRequest};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    api_key: String,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut system_instruction = None;
        let mut contents = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => {
                    system_instruction = Some(serde_json::json!({
                        "parts": [{"text": msg.text()}]
                    }));
                }
                Role::User => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{"text": msg.text()}],
                    }));
                }
                Role::Assistant => {
                    let mut parts = Vec::new();
                    let text = msg.text();
                    if !text.is_empty() {
                        parts.push(serde_json::json!({"text": text}));
                    }
                    for tc in msg.tool_calls() {
                        parts.push(serde_json::json!({
                            "functionCall": {
                                "name": tc.name,
                                "args": decode_arguments(&tc.arguments),
                            }
                        }));
                    }
                    if parts.is_empty() {
                        parts.push(serde_json::json!({"text": ""}));
                    }
                    contents.push(serde_json::json!({
                        "role": "model",
                        "parts": parts,
                    }));
                }
                Role::Tool => {
                    let name = msg.tool_name.as_deref().unwrap_or_default();
                    contents.push(serde_json::json!({
                        "role": "function",
                        "parts": [{
                            "functionResponse": {
                                "name": name,
                                "response": {"result": msg.text()},
                            }
                        }]
                    }));
                }
            }
        }

        let mut body = serde_json::json!({ "contents": contents });
        let obj = body.as_object_mut().unwrap();

        if let Some(sys) = system_instruction {
            obj.insert("systemInstruction".into(), sys);
        }

        if !request.tools.is_empty() {
            let fn_decls: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            obj.insert(
                "tools".into(),
                serde_json::json!([{"functionDeclarations": fn_decls}]),
            );

            if let Some(ref choice) = request.tool_choice {
                let config = match choice {
                    ToolChoice::Auto => serde_json::json!({"mode": "AUTO"}),
                    ToolChoice::Required => serde_json::json!({"mode": "ANY"}),
                    ToolChoice::None => serde_json::json!({"mode": "NONE"}),
                    ToolChoice::Function(name) => serde_json::json!({
                        "mode": "ANY",
                        "allowedFunctionNames": [name],
                    }),
                };
                obj.insert(
                    "toolConfig".into(),
                    serde_json::json!({"functionCallingConfig": config}),
                );
            }
        }

        body
    }
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Message> {
        let body = self.build_request_body(request);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        debug!(provider = "google", model = %request.model, "chat completion");

        let resp = shared_client().post(&url).json(&body).send().await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: GeminiResponse = resp.json().await?;
        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| MurmurError::api(200, "No candidates in response"))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                let arguments = fc
                    .args
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "{}".to_string());
                // Gemini assigns no call id; synthesize one for correlation.
                tool_calls.push(ToolCall::new(
                    uuid::Uuid::new_v4().to_string(),
                    fc.name,
                    arguments,
                ));
            }
        }

        let content = if text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(text)
        };
        Ok(Message::assistant_with_tool_calls(content, tool_calls))
    }

    /// Gemini has no chunked path here; streaming is faked as one full chunk.
    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<MessageDelta>>> {
        let message = self.complete(request).await?;

        let tool_calls = message.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .enumerate()
                .map(|(index, tc)| ToolCallDelta {
                    index,
                    id: Some(tc.id.clone()),
                    name: Some(tc.name.clone()),
                    arguments: Some(tc.arguments.clone()),
                })
                .collect()
        });

        let delta = MessageDelta {
            role: Some(Role::Assistant),
            sender: None,
            content: message.content,
            tool_calls,
        };

        Ok(Box::pin(futures::stream::iter(vec![Ok(delta)])))
    }
}

fn decode_arguments(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({}))
}

// Gemini API response types (internal)

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<serde_json::Value>,
}
