use crate::error::{HavenError, Result};
use crate::types::{ChatMessage, Role};
use std::time::Duration;

/// Default OpenAI-compatible endpoint (Groq)
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Messages of history sent per request
const HISTORY_WINDOW: usize = 20;

const SYSTEM_PROMPT: &str = "\
You are an empathetic, supportive AI assistant focused on mental health and \
emotional well-being.

ONLY respond specifically to the user's query.
Avoid giving generic disclaimers like \"I'm not a therapist\" or \"consult a professional\".
Be warm, concise, and directly helpful.";

/// Client for an OpenAI-compatible chat completions API.
///
/// Synchronous by design: one request per call, no streaming.
pub struct SupportClient {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl SupportClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| HavenError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Send the conversation plus the new user message, return the
    /// assistant reply text.
    pub fn chat(&self, history: &[ChatMessage], user_input: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0.7,
            "messages": build_messages(history, user_input),
        });

        tracing::debug!(url = %url, model = %self.model, "llm request");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|e| HavenError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .map_err(|e| HavenError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(HavenError::Http(format!(
                "chat API error {}: {}",
                status, resp_body
            )));
        }

        parse_reply(&resp_body)
    }
}

/// Assemble the request messages: system prompt, a bounded window of
/// history, then the new user message.
fn build_messages(history: &[ChatMessage], user_input: &str) -> Vec<serde_json::Value> {
    let mut messages = vec![serde_json::json!({
        "role": "system",
        "content": SYSTEM_PROMPT,
    })];

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for m in &history[start..] {
        messages.push(serde_json::json!({
            "role": match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            "content": m.content,
        }));
    }

    messages.push(serde_json::json!({
        "role": "user",
        "content": user_input,
    }));

    messages
}

fn parse_reply(body: &serde_json::Value) -> Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HavenError::Http("empty completion".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
            timestamp: "2024-03-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_build_messages_shape() {
        let history = vec![
            msg(Role::User, "hello"),
            msg(Role::Assistant, "hi, how are you feeling?"),
        ];
        let messages = build_messages(&history, "a bit low");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["role"], "user");
        assert_eq!(messages[3]["content"], "a bit low");
    }

    #[test]
    fn test_build_messages_windows_history() {
        let history: Vec<ChatMessage> = (0..50)
            .map(|i| msg(Role::User, &format!("message {}", i)))
            .collect();
        let messages = build_messages(&history, "latest");

        // system + window + new input
        assert_eq!(messages.len(), 1 + HISTORY_WINDOW + 1);
        assert_eq!(messages[1]["content"], "message 30");
    }

    #[test]
    fn test_parse_reply() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": " take a breath "}}]
        });
        assert_eq!(parse_reply(&body).unwrap(), "take a breath");
    }

    #[test]
    fn test_parse_reply_empty_is_error() {
        let body = serde_json::json!({"choices": []});
        assert!(parse_reply(&body).is_err());

        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": ""}}]
        });
        assert!(parse_reply(&body).is_err());
    }
}
