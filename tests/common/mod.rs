//! Shared test support: a scripted mock chat backend.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::BoxStream;

use murmur::error::Result;
use murmur::provider::{ChatProvider, ChatRequest};
use murmur::types::{Message, MessageDelta, Role, ToolCallDelta};

pub const DEFAULT_RESPONSE: &str = "This is a default response.";

/// Mock backend that pops queued responses and captures every request.
///
/// When the queue is exhausted it falls back to a plain default response
/// (or, for [`MockProvider::repeating`], the same scripted message forever).
pub struct MockProvider {
    responses: Mutex<VecDeque<Message>>,
    repeating: Option<Message>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeating: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every request with the same message.
    pub fn repeating(message: Message) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeating: Some(message),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Message {
        if let Some(message) = self.responses.lock().unwrap().pop_front() {
            return message;
        }
        self.repeating
            .clone()
            .unwrap_or_else(|| Message::assistant(DEFAULT_RESPONSE))
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Message> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.next_response())
    }

    async fn stream(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<MessageDelta>>> {
        self.requests.lock().unwrap().push(request.clone());
        let deltas = chunk_message(&self.next_response());
        Ok(Box::pin(futures::stream::iter(deltas.into_iter().map(Ok))))
    }
}

/// Split a message into realistic deltas: role first, content halved,
/// tool-call arguments fragmented in two.
fn chunk_message(message: &Message) -> Vec<MessageDelta> {
    let mut deltas = vec![MessageDelta {
        role: Some(Role::Assistant),
        ..Default::default()
    }];

    if let Some(ref content) = message.content {
        if !content.is_empty() {
            let (head, tail) = split_half(content);
            deltas.push(MessageDelta {
                content: Some(head),
                ..Default::default()
            });
            if !tail.is_empty() {
                deltas.push(MessageDelta {
                    content: Some(tail),
                    ..Default::default()
                });
            }
        }
    }

    for (index, call) in message.tool_calls().iter().enumerate() {
        let (head, tail) = split_half(&call.arguments);
        deltas.push(MessageDelta {
            tool_calls: Some(vec![ToolCallDelta {
                index,
                id: Some(call.id.clone()),
                name: Some(call.name.clone()),
                arguments: Some(head),
            }]),
            ..Default::default()
        });
        if !tail.is_empty() {
            deltas.push(MessageDelta {
                tool_calls: Some(vec![ToolCallDelta {
                    index,
                    id: None,
                    name: None,
                    arguments: Some(tail),
                }]),
                ..Default::default()
            });
        }
    }

    deltas
}

fn split_half(s: &str) -> (String, String) {
    let mid = s
        .char_indices()
        .nth(s.chars().count() / 2)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    (s[..mid].to_string(), s[mid..].to_string())
}
