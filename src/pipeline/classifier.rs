//! Ticket classification: maps a free-text description to a department.
//!
//! Classification fails closed: any error or unrecognised answer yields
//! [`Category::DEFAULT`] so a ticket is always routed somewhere.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};
use crate::pipeline::types::Category;

/// Temperature for classification (low randomness, one clean label).
const CLASSIFY_TEMPERATURE: f32 = 0.3;

/// A label is a couple of words; leave headroom for stray whitespace.
const CLASSIFY_MAX_TOKENS: u32 = 16;

/// Why classification fell back to the default category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The model call failed (auth, transport, rate limit).
    ModelError(String),
    /// The model call did not finish within the configured timeout.
    Timeout(Duration),
    /// The model answered, but not with a known label.
    UnrecognisedLabel(String),
    /// The answer hit the token cap before finishing.
    Truncated(String),
}

/// Outcome of a classification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The model answered with a known label.
    Model(Category),
    /// The default category was substituted.
    Fallback { reason: FallbackReason },
}

impl Classification {
    pub fn category(&self) -> Category {
        match self {
            Classification::Model(category) => *category,
            Classification::Fallback { .. } => Category::DEFAULT,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback { .. })
    }
}

/// Classifies ticket descriptions through an LLM.
pub struct TicketClassifier {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl TicketClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Classify a description. Never fails.
    pub async fn classify(&self, description: &str) -> Category {
        self.classify_detailed(description).await.category()
    }

    /// Classify a description, reporting whether the default was substituted.
    pub async fn classify_detailed(&self, description: &str) -> Classification {
        debug!(model = self.llm.model_name(), "Classifying ticket description");

        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_user_prompt(description)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let result = match tokio::time::timeout(self.timeout, self.llm.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.timeout,
            }),
        };

        let classification = match result {
            Ok(response) if response.finish_reason == FinishReason::Length => {
                Classification::Fallback {
                    reason: FallbackReason::Truncated(response.content.trim().to_string()),
                }
            }
            Ok(response) => match parse_category(&response.content) {
                Some(category) => Classification::Model(category),
                None => Classification::Fallback {
                    reason: FallbackReason::UnrecognisedLabel(response.content.trim().to_string()),
                },
            },
            Err(LlmError::Timeout { timeout, .. }) => Classification::Fallback {
                reason: FallbackReason::Timeout(timeout),
            },
            Err(e) => Classification::Fallback {
                reason: FallbackReason::ModelError(e.to_string()),
            },
        };

        match &classification {
            Classification::Model(category) => {
                info!(category = %category, "Ticket classified");
            }
            Classification::Fallback { reason } => {
                warn!(
                    reason = ?reason,
                    fallback = %Category::DEFAULT,
                    "Classification fell back to default category"
                );
            }
        }

        classification
    }
}

/// Exact match of the trimmed answer against a category label.
pub fn parse_category(raw: &str) -> Option<Category> {
    Category::from_label(raw.trim())
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_prompt() -> String {
    let labels: Vec<String> = Category::ALL
        .iter()
        .map(|c| format!("- {}", c.label()))
        .collect();

    format!(
        "You are an AI assistant for a support ticket system. \
         Classify employee issues into one of these categories:\n\
         {}\n\n\
         Answer with exactly one category name from the list and nothing else.",
        labels.join("\n")
    )
}

fn build_user_prompt(description: &str) -> String {
    format!("Description: {description}\n\nCategory:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::provider::CompletionResponse;

    /// Mock LLM that returns a fixed answer and records requests.
    struct MockClassifierLlm {
        answer: Result<String, String>,
        finish_reason: FinishReason,
        delay: Option<Duration>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockClassifierLlm {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                finish_reason: FinishReason::Stop,
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                answer: Err(reason.to_string()),
                finish_reason: FinishReason::Stop,
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockClassifierLlm {
        fn model_name(&self) -> &str {
            "mock-classifier"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.answer {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    finish_reason: self.finish_reason,
                }),
                Err(reason) => Err(LlmError::RequestFailed {
                    provider: "mock-classifier".to_string(),
                    reason: reason.clone(),
                }),
            }
        }
    }

    fn classifier(llm: MockClassifierLlm) -> (TicketClassifier, Arc<MockClassifierLlm>) {
        let llm = Arc::new(llm);
        let classifier = TicketClassifier::new(llm.clone(), Duration::from_secs(5));
        (classifier, llm)
    }

    #[tokio::test]
    async fn known_label_is_returned() {
        let (classifier, _) = classifier(MockClassifierLlm::answering("Finance"));
        assert_eq!(classifier.classify("my expense claim").await, Category::Finance);
    }

    #[tokio::test]
    async fn answer_is_trimmed_before_matching() {
        let (classifier, _) = classifier(MockClassifierLlm::answering("  IT Operations\n"));
        let result = classifier.classify_detailed("vpn is down").await;
        assert_eq!(result, Classification::Model(Category::ItOperations));
    }

    #[tokio::test]
    async fn unknown_label_falls_back_to_training() {
        let (classifier, _) = classifier(MockClassifierLlm::answering("Facilities"));
        let result = classifier.classify_detailed("the lights flicker").await;
        assert!(result.is_fallback());
        assert_eq!(result.category(), Category::Training);
        assert_eq!(
            result,
            Classification::Fallback {
                reason: FallbackReason::UnrecognisedLabel("Facilities".to_string())
            }
        );
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_training() {
        let (classifier, _) = classifier(MockClassifierLlm::failing("mock"));
        assert_eq!(classifier.classify("anything").await, Category::Training);
        let result = classifier.classify_detailed("anything").await;
        assert!(matches!(
            result,
            Classification::Fallback {
                reason: FallbackReason::ModelError(_)
            }
        ));
    }

    #[tokio::test]
    async fn truncated_answer_falls_back_even_if_prefix_is_a_label() {
        let llm = Arc::new(MockClassifierLlm {
            finish_reason: FinishReason::Length,
            ..MockClassifierLlm::answering("Sales")
        });
        let classifier = TicketClassifier::new(llm, Duration::from_secs(5));

        let result = classifier.classify_detailed("quote for a customer").await;
        assert_eq!(result.category(), Category::Training);
        assert_eq!(
            result,
            Classification::Fallback {
                reason: FallbackReason::Truncated("Sales".to_string())
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out_to_training() {
        let llm = Arc::new(MockClassifierLlm {
            delay: Some(Duration::from_secs(60)),
            ..MockClassifierLlm::answering("Sales")
        });
        let classifier = TicketClassifier::new(llm, Duration::from_secs(1));

        let result = classifier.classify_detailed("quote for a customer").await;
        assert_eq!(
            result,
            Classification::Fallback {
                reason: FallbackReason::Timeout(Duration::from_secs(1))
            }
        );
    }

    #[tokio::test]
    async fn request_embeds_description_and_all_labels() {
        let (classifier, llm) = classifier(MockClassifierLlm::answering("HR"));
        classifier.classify("payroll question about leave").await;

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.temperature, Some(CLASSIFY_TEMPERATURE));
        assert_eq!(request.max_tokens, Some(CLASSIFY_MAX_TOKENS));

        let system = &request.messages[0].content;
        for category in Category::ALL {
            assert!(system.contains(category.label()), "missing {category}");
        }
        assert!(request.messages[1].content.contains("payroll question about leave"));
    }

    #[test]
    fn parse_category_requires_exact_label() {
        assert_eq!(parse_category("Sales"), Some(Category::Sales));
        assert_eq!(parse_category("sales"), None);
        assert_eq!(parse_category("Category: Sales"), None);
        assert_eq!(parse_category(""), None);
    }
}
