//! Provider orchestration.
//!
//! Providers are tried strictly in configured order; the first one whose
//! reply survives extraction and normalization wins. A reply that fails
//! to parse counts as a provider failure and triggers failover just like
//! a transport error. Every attempt, successful or not, is handed to the
//! call log.

use std::time::Instant;

use crate::config::AiSettings;
use crate::fallback;

use super::client::build_client;
use super::extract::{extract_content, normalize_batch};
use super::prompt::build_system_prompt;
use super::types::{
    BatchParseResult, CallAttempt, CallLog, CallStatus, ChatClient, ChatMessage, ChatRequest,
    ParseRequest, TracingCallLog,
};
use super::ParseError;

pub const REQUEST_TEMPERATURE: f64 = 0.3;
pub const REQUEST_MAX_TOKENS: u32 = 500;

/// Provider name recorded for deterministic-parser attempts.
pub const FALLBACK_PROVIDER: &str = "fallback-local";

/// One ready-to-call entry in the chain.
pub struct ProviderSlot {
    pub name: String,
    pub model: String,
    pub client: Box<dyn ChatClient + Send + Sync>,
}

impl ProviderSlot {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        client: Box<dyn ChatClient + Send + Sync>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            client,
        }
    }
}

pub struct TaskParser {
    providers: Vec<ProviderSlot>,
    call_log: Box<dyn CallLog + Send + Sync>,
}

impl TaskParser {
    /// Build the chain from settings. Adapter construction is eager, so a
    /// misconfigured provider (unknown dialect, missing key) fails here
    /// rather than mid-request.
    pub fn from_settings(settings: &AiSettings) -> Result<Self, ParseError> {
        let mut providers = Vec::new();
        for config in settings.ordered_providers() {
            providers.push(ProviderSlot::new(
                config.name.clone(),
                config.model.clone(),
                build_client(&config)?,
            ));
        }
        Ok(Self::new(providers, Box::new(TracingCallLog)))
    }

    pub fn new(providers: Vec<ProviderSlot>, call_log: Box<dyn CallLog + Send + Sync>) -> Self {
        Self {
            providers,
            call_log,
        }
    }

    /// Run the provider chain. Returns the first normalized batch, or
    /// `AllProvidersFailed` carrying every attempt and the per-provider
    /// reasons joined with `" | "`.
    pub fn parse(&self, request: &ParseRequest) -> Result<BatchParseResult, ParseError> {
        let system_prompt = build_system_prompt(request.reference_time);
        let mut attempts = Vec::with_capacity(self.providers.len());
        let mut reasons = Vec::with_capacity(self.providers.len());

        for slot in &self.providers {
            tracing::debug!(provider = %slot.name, model = %slot.model, "trying provider");

            let chat_request = ChatRequest {
                model: slot.model.clone(),
                messages: vec![
                    ChatMessage::system(system_prompt.clone()),
                    ChatMessage::user(request.utterance.clone()),
                ],
                temperature: REQUEST_TEMPERATURE,
                max_tokens: REQUEST_MAX_TOKENS,
            };

            let started = Instant::now();
            let outcome = slot
                .client
                .chat(&chat_request)
                .and_then(|response| {
                    let tokens = response.usage.as_ref().map(|u| u.total_tokens);
                    let content = extract_content(&response, &slot.name)?;
                    normalize_batch(&content).map(|batch| (batch, tokens))
                });
            let latency_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok((batch, tokens_used)) => {
                    let attempt = CallAttempt {
                        provider: slot.name.clone(),
                        model: slot.model.clone(),
                        requester: request.requester_id.clone(),
                        latency_ms,
                        tokens_used,
                        status: CallStatus::Success,
                        error: None,
                    };
                    self.call_log.record(&attempt);
                    return Ok(batch);
                }
                Err(err) => {
                    let reason = err.to_string();
                    let attempt = CallAttempt {
                        provider: slot.name.clone(),
                        model: slot.model.clone(),
                        requester: request.requester_id.clone(),
                        latency_ms,
                        tokens_used: None,
                        status: CallStatus::Failed,
                        error: Some(reason.clone()),
                    };
                    self.call_log.record(&attempt);
                    reasons.push(format!("{}: {}", slot.name, reason));
                    attempts.push(attempt);
                }
            }
        }

        let message = if reasons.is_empty() {
            "no providers configured".to_string()
        } else {
            reasons.join(" | ")
        };
        tracing::error!(%message, "all providers failed");
        Err(ParseError::AllProvidersFailed { message, attempts })
    }

    /// Deterministic single-task parse, bypassing the provider chain.
    /// Recorded in the call log under [`FALLBACK_PROVIDER`].
    pub fn fallback_parse(&self, request: &ParseRequest) -> Result<BatchParseResult, ParseError> {
        let started = Instant::now();
        let outcome = fallback::parse(&request.utterance, request.reference_time);
        let latency_ms = started.elapsed().as_millis() as u64;

        let attempt = CallAttempt {
            provider: FALLBACK_PROVIDER.into(),
            model: "rule-based".into(),
            requester: request.requester_id.clone(),
            latency_ms,
            tokens_used: None,
            status: if outcome.is_ok() {
                CallStatus::Success
            } else {
                CallStatus::Failed
            },
            error: outcome.as_ref().err().map(|e| e.to_string()),
        };
        self.call_log.record(&attempt);

        let task = outcome?;
        let overall_confidence = task.confidence;
        Ok(BatchParseResult {
            tasks: vec![task],
            overall_confidence,
            is_single_task: true,
        })
    }

    /// Chain first, deterministic parser if the whole chain fails.
    pub fn parse_with_fallback(&self, request: &ParseRequest) -> Result<BatchParseResult, ParseError> {
        match self.parse(request) {
            Err(ParseError::AllProvidersFailed { message, .. }) => {
                tracing::warn!(%message, "falling back to deterministic parser");
                self.fallback_parse(request)
            }
            other => other,
        }
    }
}
