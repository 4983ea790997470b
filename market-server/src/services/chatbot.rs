//! Chatbot
//!
//! Keyword-matched dairy and livestock knowledge base, with an optional
//! OpenAI-compatible HTTP backend. Upstream failures always fall back to
//! the knowledge base, so the endpoint never depends on the LLM being up.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::utils::AppResult;

/// Exchanges kept per user session
const SESSION_CAPACITY: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ChatExchange {
    pub question: String,
    pub answer: String,
}

/// Bounded per-user chat history
///
/// Owned by `ServerState`; only the last [`SESSION_CAPACITY`] exchanges
/// per user are retained.
#[derive(Clone, Default)]
pub struct ChatSessions {
    sessions: Arc<DashMap<String, VecDeque<ChatExchange>>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, user: &str, question: String, answer: String) {
        let mut session = self.sessions.entry(user.to_string()).or_default();
        if session.len() >= SESSION_CAPACITY {
            session.pop_front();
        }
        session.push_back(ChatExchange { question, answer });
    }

    pub fn history(&self, user: &str) -> Vec<ChatExchange> {
        self.sessions
            .get(user)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self, user: &str) {
        self.sessions.remove(user);
    }
}

/// Keyword-matched answers; first matching topic wins
const KNOWLEDGE_BASE: &[(&[&str], &str)] = &[
    (
        &["store", "storage", "fresh", "spoil"],
        "Raw milk should be refrigerated at 4°C immediately and consumed within 48 hours. \
         Boil it before drinking and avoid leaving it at room temperature.",
    ),
    (
        &["fat", "percentage", "cream"],
        "Cow milk typically has 3.5-5% fat; buffalo milk 6-8%. Our listings show the fat \
         percentage measured at the farm for every raw milk product.",
    ),
    (
        &["a2", "desi", "indigenous"],
        "A2 milk comes from indigenous breeds like Gir, Sahiwal and Red Sindhi, which \
         produce only the A2 beta-casein protein. Look for the breed in the product details.",
    ),
    (
        &["subscription", "subscribe", "daily"],
        "Daily subscriptions deliver a fixed quantity every day. You can pause, resume or \
         cancel any time from your subscriptions page; deliveries skip automatically when \
         the farmer is out of stock.",
    ),
    (
        &["deliver", "delivery", "shipping", "when"],
        "Orders above ₹500 ship free; below that a flat ₹40 applies. Subscription \
         deliveries arrive in your chosen morning or evening slot.",
    ),
    (
        &["payment", "pay", "refund", "upi"],
        "We accept cash on delivery, UPI and online payments. Prepaid amounts for \
         cancelled orders are refunded to the original payment method.",
    ),
    (
        &["cow", "breed", "gir", "sahiwal", "jersey"],
        "Gir and Sahiwal are hardy indigenous breeds yielding 8-12 liters of A2 milk per \
         day; Jersey and Holstein Friesian crosses yield more but produce A1 milk. Check a \
         listing's health records before buying.",
    ),
    (
        &["ghee", "butter", "paneer"],
        "Traditional bilona ghee is churned from curd rather than cream. Our farmers list \
         the method on each ghee product; paneer and butter are made fresh on order.",
    ),
];

const FALLBACK_ANSWER: &str =
    "I can help with questions about milk quality and storage, subscriptions, deliveries, \
     payments and cattle breeds. Could you rephrase your question?";

#[derive(Debug, Serialize)]
struct LlmRequest {
    model: String,
    messages: Vec<LlmMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LlmMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct LlmResponse {
    choices: Vec<LlmChoice>,
}

#[derive(Debug, Deserialize)]
struct LlmChoice {
    message: LlmMessage,
}

#[derive(Clone)]
pub struct ChatService {
    sessions: ChatSessions,
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
    model: String,
}

impl ChatService {
    pub fn new(
        sessions: ChatSessions,
        api_url: Option<String>,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            sessions,
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }

    /// Answer a user message and record the exchange
    pub async fn answer(&self, user: &str, message: &str) -> AppResult<String> {
        let answer = match self.knowledge_base_answer(message) {
            Some(answer) => answer.to_string(),
            None => match self.llm_answer(user, message).await {
                Some(answer) => answer,
                None => FALLBACK_ANSWER.to_string(),
            },
        };
        self.sessions
            .record(user, message.to_string(), answer.clone());
        Ok(answer)
    }

    pub fn clear_history(&self, user: &str) {
        self.sessions.clear(user);
    }

    fn knowledge_base_answer(&self, message: &str) -> Option<&'static str> {
        let lowered = message.to_lowercase();
        KNOWLEDGE_BASE
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(_, answer)| *answer)
    }

    /// Optional LLM backend; any failure returns None
    async fn llm_answer(&self, user: &str, message: &str) -> Option<String> {
        let api_url = self.api_url.as_ref()?;

        let mut messages = vec![LlmMessage {
            role: "system".to_string(),
            content: "You are a helpful assistant for a dairy and livestock marketplace. \
                      Answer briefly and factually."
                .to_string(),
        }];
        for exchange in self.sessions.history(user) {
            messages.push(LlmMessage {
                role: "user".to_string(),
                content: exchange.question,
            });
            messages.push(LlmMessage {
                role: "assistant".to_string(),
                content: exchange.answer,
            });
        }
        messages.push(LlmMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });

        let request = LlmRequest {
            model: self.model.clone(),
            messages,
        };
        let mut builder = self.client.post(api_url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        match builder.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<LlmResponse>().await {
                    Ok(body) => body.choices.into_iter().next().map(|c| c.message.content),
                    Err(e) => {
                        tracing::warn!(error = %e, "LLM response decode failed");
                        None
                    }
                }
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "LLM backend returned an error");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM backend unreachable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ChatService {
        ChatService::new(ChatSessions::new(), None, None, "test-model".into())
    }

    #[tokio::test]
    async fn keyword_match_answers_from_knowledge_base() {
        let service = service();
        let answer = service
            .answer("user:c", "How long can I store raw milk?")
            .await
            .unwrap();
        assert!(answer.contains("refrigerated"));
    }

    #[tokio::test]
    async fn unknown_topic_falls_back() {
        let service = service();
        let answer = service
            .answer("user:c", "What is the weather like?")
            .await
            .unwrap();
        assert_eq!(answer, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn sessions_are_bounded_and_clearable() {
        let service = service();
        for i in 0..8 {
            service
                .answer("user:c", &format!("question about ghee {i}"))
                .await
                .unwrap();
        }
        let history = service.sessions.history("user:c");
        assert_eq!(history.len(), SESSION_CAPACITY);
        assert!(history[0].question.contains("ghee 3"));

        service.clear_history("user:c");
        assert!(service.sessions.history("user:c").is_empty());
    }

    #[tokio::test]
    async fn sessions_are_per_user() {
        let service = service();
        service.answer("user:a", "about ghee").await.unwrap();
        assert!(service.sessions.history("user:b").is_empty());
    }
}
