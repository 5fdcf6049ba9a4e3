//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::{AssistantContent, Message};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// Wraps a rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

/// Split a request into (preamble, history, prompt).
///
/// System messages are joined into the preamble. The last user message is the
/// prompt; everything else becomes chat history.
fn split_messages(
    messages: &[ChatMessage],
) -> Result<(Option<String>, Vec<Message>, String), LlmError> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let preamble = (!system.is_empty()).then(|| system.join("\n\n"));

    let mut conversation: Vec<&ChatMessage> =
        messages.iter().filter(|m| m.role != Role::System).collect();
    let prompt = match conversation.pop() {
        Some(last) if last.role == Role::User => last.content.clone(),
        _ => {
            return Err(LlmError::InvalidResponse {
                provider: "rig".to_string(),
                reason: "request must end with a user message".to_string(),
            });
        }
    };

    let history = conversation
        .into_iter()
        .map(|m| match m.role {
            Role::Assistant => Message::assistant(m.content.clone()),
            _ => Message::user(m.content.clone()),
        })
        .collect();

    Ok((preamble, history, prompt))
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (preamble, history, prompt) = split_messages(&request.messages)?;

        let mut builder = self
            .model
            .completion_request(Message::user(prompt))
            .messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: e.to_string(),
        })?;

        let texts: Vec<&str> = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect();

        Ok(CompletionResponse {
            finish_reason: finish_reason(
                !texts.is_empty(),
                response.usage.output_tokens,
                request.max_tokens,
            ),
            content: texts.concat(),
        })
    }
}

/// Infer why generation stopped from the usage report.
///
/// Providers that report no usage read as zero output tokens, i.e. `Stop`.
fn finish_reason(has_text: bool, output_tokens: u64, max_tokens: Option<u32>) -> FinishReason {
    if !has_text {
        FinishReason::Unknown
    } else if max_tokens.is_some_and(|max| output_tokens >= u64::from(max)) {
        FinishReason::Length
    } else {
        FinishReason::Stop
    }
}
