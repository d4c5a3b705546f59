//! Wire adapters for the supported provider dialects.
//!
//! Each adapter owns a blocking HTTP client with the per-provider timeout
//! baked in and normalizes its provider's reply into [`ChatResponse`].
//! Dialect selection happens once, from [`ProviderKind`], when the
//! adapter is built.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ProviderConfig, ProviderKind};

use super::types::{ChatChoice, ChatClient, ChatMessage, ChatRequest, ChatResponse, TokenUsage};
use super::ParseError;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_DASHSCOPE_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";

/// Build the adapter matching the provider's declared dialect.
pub fn build_client(
    config: &ProviderConfig,
) -> Result<Box<dyn ChatClient + Send + Sync>, ParseError> {
    let kind = ProviderKind::from_name(&config.name)
        .ok_or_else(|| ParseError::UnknownProvider(config.name.clone()))?;

    match kind {
        ProviderKind::Qwen => Ok(Box::new(QwenClient::from_config(config)?)),
        ProviderKind::OpenAi => Ok(Box::new(OpenAiClient::from_config(config)?)),
    }
}

fn build_http(timeout_ms: u64) -> Result<reqwest::blocking::Client, ParseError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| ParseError::HttpClient(e.to_string()))
}

fn require_api_key(config: &ProviderConfig) -> Result<String, ParseError> {
    if config.api_key.trim().is_empty() {
        return Err(ParseError::MissingApiKey(config.name.clone()));
    }
    Ok(config.api_key.clone())
}

fn map_transport(provider: &str, err: reqwest::Error) -> ParseError {
    if err.is_timeout() {
        ParseError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: "request timed out".into(),
        }
    } else if err.is_connect() {
        ParseError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: "connection failed".into(),
        }
    } else {
        ParseError::HttpClient(err.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────
// OpenAI-compatible dialect
// ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OpenAiRequestWire<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

/// Bearer-authenticated chat-completion call. The reply is already in
/// the normalized shape.
pub struct OpenAiClient {
    provider: String,
    url: String,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ParseError> {
        Ok(Self {
            provider: config.name.clone(),
            url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            api_key: require_api_key(config)?,
            http: build_http(config.timeout_ms)?,
        })
    }
}

impl ChatClient for OpenAiClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ParseError> {
        let wire = OpenAiRequestWire {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&wire)
            .send()
            .map_err(|e| map_transport(&self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ParseError::Api {
                provider: self.provider.clone(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ChatResponse>()
            .map_err(|e| ParseError::HttpClient(e.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────
// DashScope-native dialect (Qwen family)
// ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct QwenRequestWire<'a> {
    model: &'a str,
    input: QwenInput<'a>,
    parameters: QwenParameters,
}

#[derive(Serialize)]
struct QwenInput<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Serialize)]
struct QwenParameters {
    temperature: f64,
    max_tokens: u32,
    result_format: &'static str,
}

#[derive(Deserialize)]
struct QwenResponseWire {
    output: QwenOutput,
    #[serde(default)]
    usage: Option<QwenUsage>,
}

#[derive(Deserialize)]
struct QwenOutput {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct QwenUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}

/// DashScope text-generation call, normalized into [`ChatResponse`].
pub struct QwenClient {
    provider: String,
    url: String,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl QwenClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ParseError> {
        Ok(Self {
            provider: config.name.clone(),
            url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DASHSCOPE_URL.to_string()),
            api_key: require_api_key(config)?,
            http: build_http(config.timeout_ms)?,
        })
    }
}

impl ChatClient for QwenClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ParseError> {
        let wire = QwenRequestWire {
            model: &request.model,
            input: QwenInput {
                messages: &request.messages,
            },
            parameters: QwenParameters {
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                result_format: "message",
            },
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&wire)
            .send()
            .map_err(|e| map_transport(&self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ParseError::Api {
                provider: self.provider.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let wire: QwenResponseWire = response
            .json()
            .map_err(|e| ParseError::HttpClient(e.to_string()))?;

        Ok(ChatResponse {
            choices: wire.output.choices,
            usage: wire.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

// ────────────────────────────────────────────────────────────────────
// Test double
// ────────────────────────────────────────────────────────────────────

/// Scriptable client: replies are consumed front to back, `Err` entries
/// become provider failures. Running out of script is also a failure.
pub struct MockChatClient {
    provider: String,
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl MockChatClient {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn reply(self, content: impl Into<String>) -> Self {
        self.replies
            .lock()
            .expect("mock lock")
            .push_back(Ok(content.into()));
        self
    }

    pub fn failure(self, reason: impl Into<String>) -> Self {
        self.replies
            .lock()
            .expect("mock lock")
            .push_back(Err(reason.into()));
        self
    }
}

impl ChatClient for MockChatClient {
    fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, ParseError> {
        let next = self.replies.lock().expect("mock lock").pop_front();
        match next {
            Some(Ok(content)) => Ok(ChatResponse {
                choices: vec![ChatChoice {
                    message: ChatMessage::assistant(content),
                }],
                usage: Some(TokenUsage {
                    prompt_tokens: 100,
                    completion_tokens: 50,
                    total_tokens: 150,
                }),
            }),
            Some(Err(reason)) => Err(ParseError::ProviderUnavailable {
                provider: self.provider.clone(),
                reason,
            }),
            None => Err(ParseError::ProviderUnavailable {
                provider: self.provider.clone(),
                reason: "no scripted reply".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, base_url: &str) -> ProviderConfig {
        ProviderConfig {
            name: name.into(),
            base_url: Some(base_url.into()),
            api_key: "sk-test".into(),
            model: "test-model".into(),
            ..ProviderConfig::default()
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("明天开会")],
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    #[test]
    fn missing_api_key_is_rejected_at_build() {
        let mut cfg = config("openai", "http://localhost/unused");
        cfg.api_key = "  ".into();
        assert!(matches!(
            OpenAiClient::from_config(&cfg),
            Err(ParseError::MissingApiKey(_))
        ));
    }

    #[test]
    fn unknown_provider_is_rejected_at_build() {
        let cfg = config("claude", "http://localhost/unused");
        assert!(matches!(
            build_client(&cfg),
            Err(ParseError::UnknownProvider(_))
        ));
    }

    #[test]
    fn openai_dialect_sends_bearer_and_decodes_reply() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "temperature": 0.3,
                "max_tokens": 500
            })))
            .with_status(200)
            .with_body(
                r#"{
                    "choices": [{"message": {"role": "assistant", "content": "{\"title\": \"开会\"}"}}],
                    "usage": {"prompt_tokens": 9, "completion_tokens": 4, "total_tokens": 13}
                }"#,
            )
            .create();

        let client =
            OpenAiClient::from_config(&config("openai", &format!("{}/v1/chat/completions", server.url())))
                .unwrap();
        let response = client.chat(&request()).unwrap();

        mock.assert();
        assert_eq!(response.choices[0].message.content, "{\"title\": \"开会\"}");
        assert_eq!(response.usage.unwrap().total_tokens, 13);
    }

    #[test]
    fn openai_non_success_status_maps_to_api_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create();

        let client =
            OpenAiClient::from_config(&config("openai", &format!("{}/v1/chat/completions", server.url())))
                .unwrap();
        let err = client.chat(&request()).unwrap_err();

        match err {
            ParseError::Api { status, body, .. } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn qwen_dialect_wraps_messages_and_normalizes_output() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/generation")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "input": {"messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "明天开会"}
                ]},
                "parameters": {"result_format": "message"}
            })))
            .with_status(200)
            .with_body(
                r#"{
                    "output": {"choices": [{"message": {"role": "assistant", "content": "ok"}}]},
                    "usage": {"input_tokens": 20, "output_tokens": 10, "total_tokens": 30},
                    "request_id": "abc"
                }"#,
            )
            .create();

        let client =
            QwenClient::from_config(&config("qwen", &format!("{}/generation", server.url()))).unwrap();
        let response = client.chat(&request()).unwrap();

        mock.assert();
        assert_eq!(response.choices[0].message.content, "ok");
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 20);
        assert_eq!(usage.completion_tokens, 10);
    }

    #[test]
    fn connection_failure_maps_to_provider_unavailable() {
        // Nothing listens on this port.
        let mut cfg = config("openai", "http://127.0.0.1:9/v1/chat/completions");
        cfg.timeout_ms = 500;
        let client = OpenAiClient::from_config(&cfg).unwrap();

        assert!(matches!(
            client.chat(&request()),
            Err(ParseError::ProviderUnavailable { .. })
        ));
    }

    #[test]
    fn mock_client_consumes_script_in_order() {
        let mock = MockChatClient::new("mock")
            .reply("first")
            .failure("boom");

        assert_eq!(mock.chat(&request()).unwrap().choices[0].message.content, "first");
        assert!(matches!(
            mock.chat(&request()),
            Err(ParseError::ProviderUnavailable { .. })
        ));
        // Script exhausted
        assert!(mock.chat(&request()).is_err());
    }
}
