use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ParseError;

/// One inbound parse call. Built per request, discarded after use.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    /// Raw natural-language input, possibly mixing Chinese and English.
    pub utterance: String,
    /// Anchor for prompt rendering and relative-date resolution.
    pub reference_time: NaiveDateTime,
    /// Opaque caller id, forwarded to the call log for attribution.
    pub requester_id: Option<String>,
}

impl ParseRequest {
    pub fn new(utterance: impl Into<String>, reference_time: NaiveDateTime) -> Self {
        Self {
            utterance: utterance.into(),
            reference_time,
            requester_id: None,
        }
    }

    pub fn with_requester(mut self, requester_id: impl Into<String>) -> Self {
        self.requester_id = Some(requester_id.into());
        self
    }
}

/// Task lifecycle state, as the model is asked to emit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
    Pending,
}

impl TaskStatus {
    /// Lenient decode of a wire status string. Unrecognized values fall
    /// back to `Todo` rather than failing the whole task.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            "PENDING" => Self::Pending,
            _ => Self::Todo,
        }
    }
}

/// A single structured task, produced by either the AI path or the
/// deterministic fallback. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub category: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    /// Estimated effort in minutes.
    pub estimated_duration: Option<u32>,
    /// Insertion-ordered, deduplicated.
    pub tags: Vec<String>,
    /// 0..=100.
    pub priority: u8,
    /// 0.0..=1.0; fixed at 0.3 on the fallback path.
    pub confidence: f64,
}

/// Normalized output unifying single- and multi-task model replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchParseResult {
    pub tasks: Vec<ParsedTask>,
    pub overall_confidence: f64,
    pub is_single_task: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Success,
    Failed,
}

/// Diagnostic record of one provider attempt within an orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallAttempt {
    pub provider: String,
    pub model: String,
    /// Caller id from the originating request, if any.
    pub requester: Option<String>,
    pub latency_ms: u64,
    pub tokens_used: Option<u32>,
    pub status: CallStatus,
    pub error: Option<String>,
}

/// One message in a chat-completion exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Provider-agnostic chat-completion request built by the orchestrator.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// The shape every wire adapter normalizes its provider's reply into.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Wire adapter abstraction (allows mocking).
pub trait ChatClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ParseError>;
}

/// Call-logging collaborator. Every provider attempt, success or failure,
/// is handed to this sink; storage of the log is outside the core.
pub trait CallLog {
    fn record(&self, attempt: &CallAttempt);
}

/// Default observer: emits each attempt as a structured tracing event.
pub struct TracingCallLog;

impl CallLog for TracingCallLog {
    fn record(&self, attempt: &CallAttempt) {
        match attempt.status {
            CallStatus::Success => tracing::info!(
                provider = %attempt.provider,
                model = %attempt.model,
                requester = ?attempt.requester,
                latency_ms = attempt.latency_ms,
                tokens = ?attempt.tokens_used,
                "ai call succeeded"
            ),
            CallStatus::Failed => tracing::warn!(
                provider = %attempt.provider,
                model = %attempt.model,
                requester = ?attempt.requester,
                latency_ms = attempt.latency_ms,
                error = ?attempt.error,
                "ai call failed"
            ),
        }
    }
}
