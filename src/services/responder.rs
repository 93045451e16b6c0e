use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::models::ChatMessage;

/// Fixed reply used whenever text generation fails. The customer must never
/// be left without an answer because the external call broke.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble processing that. Would you like to speak with a human agent?";

const ESCALATION_KEYWORDS: &[&str] = &[
    "speak to human",
    "real person",
    "agent",
    "representative",
    "not helpful",
    "doesn't work",
    "frustrated",
    "angry",
    "manager",
    "supervisor",
    "human help",
    "talk to someone",
];

/// Case-insensitive keyword scan of the customer's own words. Independent
/// of whatever the generation call returns: a generated reply and an
/// escalation signal can co-occur.
pub fn needs_escalation(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ESCALATION_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("malformed response")]
    MalformedResponse,
}

/// External text-completion call: prompt in, reply text out. May fail or
/// time out; `ResponderService` absorbs both.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;

    fn generator_name(&self) -> &'static str;
}

/// Gemini-style HTTP generator. Constructed by the composition root and
/// injected; never a module-level global.
pub struct HttpTextGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpTextGenerator {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let api_key = self.api_key.as_deref().ok_or(GeneratorError::NotConfigured)?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(GeneratorError::Status(response.status().as_u16()));
        }

        let payload: serde_json::Value = response.json().await?;
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or(GeneratorError::MalformedResponse)
    }

    fn generator_name(&self) -> &'static str {
        "gemini-http"
    }
}

/// Scripted generator for tests: either a canned reply or a forced failure.
pub struct MockTextGenerator {
    pub reply: Option<String>,
}

impl MockTextGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(GeneratorError::MalformedResponse),
        }
    }

    fn generator_name(&self) -> &'static str {
        "mock"
    }
}

/// Produces the bot's conversational turn from recent room history.
pub struct ResponderService {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl ResponderService {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Generate a reply to the latest customer message. `context` is recent
    /// history in chronological order. Returns `None` only when the
    /// generator produced an empty reply; every failure path yields the
    /// fixed fallback instead of propagating.
    pub async fn generate_reply(
        &self,
        context: &[ChatMessage],
        latest_customer_text: &str,
    ) -> Option<String> {
        let prompt = build_prompt(context, latest_customer_text);

        let reply = match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(
                    generator = self.generator.generator_name(),
                    error = %e,
                    "responder: generation failed, using fallback"
                );
                return Some(FALLBACK_REPLY.to_string());
            }
            Err(_) => {
                warn!(
                    generator = self.generator.generator_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "responder: generation timed out, using fallback"
                );
                return Some(FALLBACK_REPLY.to_string());
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            debug!("responder: generator returned empty reply");
            None
        } else {
            Some(reply.to_string())
        }
    }
}

fn build_prompt(context: &[ChatMessage], latest_customer_text: &str) -> String {
    let history = context
        .iter()
        .map(|m| format!("{}: {}", m.sender_type, m.body))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a helpful customer support bot for an online store.\n\n\
         Previous conversation:\n{history}\n\n\
         Current customer message: {latest_customer_text}\n\n\
         Provide a helpful, concise response about:\n\
         - Order status and tracking\n\
         - Product information\n\
         - Returns and refunds\n\
         - Account issues\n\
         - General inquiries\n\n\
         If you cannot fully resolve the issue or the customer seems frustrated,\n\
         politely suggest they can speak to a human agent. Keep responses under 100 words."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_match_is_case_insensitive() {
        assert!(needs_escalation("I want to SPEAK TO a Manager"));
        assert!(needs_escalation("this is not helpful"));
        assert!(!needs_escalation("where is my order?"));
    }

    #[tokio::test]
    async fn failing_generator_yields_fallback_not_error() {
        let responder = ResponderService::new(
            Arc::new(MockTextGenerator::failing()),
            Duration::from_secs(1),
        );
        let reply = responder.generate_reply(&[], "hello").await;
        assert_eq!(reply.as_deref(), Some(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn slow_generator_times_out_to_fallback() {
        struct SlowGenerator;

        #[async_trait]
        impl TextGenerator for SlowGenerator {
            async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("too late".to_string())
            }

            fn generator_name(&self) -> &'static str {
                "slow"
            }
        }

        let responder =
            ResponderService::new(Arc::new(SlowGenerator), Duration::from_millis(100));
        let reply = responder.generate_reply(&[], "hello").await;
        assert_eq!(reply.as_deref(), Some(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn empty_generation_yields_none() {
        let responder = ResponderService::new(
            Arc::new(MockTextGenerator::replying("   ")),
            Duration::from_secs(1),
        );
        assert_eq!(responder.generate_reply(&[], "hello").await, None);
    }
}
