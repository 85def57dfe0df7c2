//! Anthropic Messages API adapter.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::agent::ToolChoice;
use crate::error::{MurmurError, Result};
use crate::types::{Message, MessageDelta, Role, ToolCall, ToolCallDelta};

use super::http::{anthropic_headers, parse_sse_data, shared_client, status_to_error};
use super::{ChatProvider, ChatRequest};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TEMPERATURE: f64 = 0.7;

pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn build_request_body(&self, request: &ChatRequest, stream: bool) -> serde_json::Value {
        let mut system_parts = Vec::new();
        let mut messages = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => {
                    system_parts.push(msg.text().to_string());
                }
                Role::User => {
                    messages.push(serde_json::json!({
                        "role": "user",
                        "content": msg.text(),
                    }));
                }
                Role::Assistant => {
                    let tool_calls = msg.tool_calls();
                    if tool_calls.is_empty() {
                        let text = msg.text();
                        if !text.is_empty() {
                            messages.push(serde_json::json!({
                                "role": "assistant",
                                "content": text,
                            }));
                        }
                    } else {
                        let mut content: Vec<serde_json::Value> = Vec::new();
                        let text = msg.text();
                        if !text.is_empty() {
                            content.push(serde_json::json!({"type": "text", "text": text}));
                        }
                        for tc in tool_calls {
                            content.push(serde_json::json!({
                                "type": "tool_use",
                                "id": tc.id,
                                "name": tc.name,
                                "input": decode_arguments(&tc.arguments),
                            }));
                        }
                        messages.push(serde_json::json!({
                            "role": "assistant",
                            "content": content,
                        }));
                    }
                }
                // No tool-result role: re-injected as a user-side block.
                Role::Tool => {
                    messages.push(serde_json::json!({
                        "role": "user",
                        "content": [{
                            "type": "tool_result",
                            "tool_use_id": msg.tool_call_id,
                            "content": msg.text(),
                        }],
                    }));
                }
            }
        }

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "temperature": DEFAULT_TEMPERATURE,
            "stream": stream,
        });

        let obj = body.as_object_mut().unwrap();

        if !system_parts.is_empty() {
            obj.insert("system".into(), system_parts.join("\n").into());
        }

        // ToolChoice::None has no wire form here: tools are simply not sent.
        let suppress_tools = matches!(request.tool_choice, Some(ToolChoice::None));
        if !request.tools.is_empty() && !suppress_tools {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.parameters,
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());

            match request.tool_choice {
                Some(ToolChoice::Auto) => {
                    obj.insert("tool_choice".into(), serde_json::json!({"type": "auto"}));
                }
                Some(ToolChoice::Required) => {
                    obj.insert("tool_choice".into(), serde_json::json!({"type": "any"}));
                }
                Some(ToolChoice::Function(ref name)) => {
                    obj.insert(
                        "tool_choice".into(),
                        serde_json::json!({"type": "tool", "name": name}),
                    );
                }
                _ => {}
            }
        }

        body
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Message> {
        let body = self.build_request_body(request, false);
        let url = format!("{}/messages", self.base_url);

        debug!(provider = "anthropic", model = %request.model, "chat completion");

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(&self.api_key, API_VERSION))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: AnthropicResponse = resp.json().await?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in data.content {
            match block.kind.as_str() {
                "text" => {
                    if let Some(t) = block.text {
                        text.push_str(&t);
                    }
                }
                "tool_use" => {
                    let arguments = block
                        .input
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "{}".to_string());
                    tool_calls.push(ToolCall::new(
                        block.id.unwrap_or_default(),
                        block.name.unwrap_or_default(),
                        arguments,
                    ));
                }
                _ => {}
            }
        }

        let content = if text.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(text)
        };
        Ok(Message::assistant_with_tool_calls(content, tool_calls))
    }

    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<MessageDelta>>> {
        let body = self.build_request_body(request, true);
        let url = format!("{}/messages", self.base_url);

        debug!(provider = "anthropic", model = %request.model, "chat completion (stream)");

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(&self.api_key, API_VERSION))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = String::new();
            let mut first = true;
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(MurmurError::Network(e));
                        break;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with("event:") {
                        continue;
                    }

                    let Some(data) = parse_sse_data(&line) else {
                        continue;
                    };
                    let Ok(event) = serde_json::from_str::<AnthropicStreamEvent>(data) else {
                        continue;
                    };
                    if let Some(mut delta) = event_to_delta(event) {
                        if first {
                            delta.role = Some(Role::Assistant);
                            first = false;
                        }
                        yield Ok(delta);
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Map one Anthropic stream event to a message delta, if it carries content.
fn event_to_delta(event: AnthropicStreamEvent) -> Option<MessageDelta> {
    match event.kind.as_str() {
        "content_block_start" => {
            let block = event.content_block?;
            if block.kind != "tool_use" {
                return None;
            }
            Some(MessageDelta {
                role: None,
                sender: None,
                content: None,
                tool_calls: Some(vec![ToolCallDelta {
                    index: event.index.unwrap_or_default(),
                    id: block.id,
                    name: block.name,
                    arguments: None,
                }]),
            })
        }
        "content_block_delta" => {
            let delta = event.delta?;
            match delta.kind.as_deref() {
                Some("text_delta") => Some(MessageDelta {
                    role: None,
                    sender: None,
                    content: delta.text,
                    tool_calls: None,
                }),
                Some("input_json_delta") => Some(MessageDelta {
                    role: None,
                    sender: None,
                    content: None,
                    tool_calls: Some(vec![ToolCallDelta {
                        index: event.index.unwrap_or_default(),
                        id: None,
                        name: None,
                        arguments: delta.partial_json,
                    }]),
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn decode_arguments(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({}))
}

// Anthropic API response types (internal)

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    id: Option<String>,
    name: Option<String>,
    text: Option<String>,
    input: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct AnthropicStreamEvent {
    #[serde(rename = "type")]
    kind: String,
    index: Option<usize>,
    content_block: Option<AnthropicContentBlock>,
    delta: Option<AnthropicStreamDelta>,
}

#[derive(Deserialize)]
struct AnthropicStreamDelta {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
    partial_json: Option<String>,
}
