//! Model-output extraction and normalization.
//!
//! Models are told to emit bare JSON but frequently wrap it in markdown
//! fences anyway, and the object comes in two shapes: a batch envelope
//! with a `tasks` array, or a single task object at the top level. Both
//! are normalized into [`BatchParseResult`]. Any undecodable task item
//! rejects the whole reply, so the orchestrator fails over instead of
//! returning a truncated batch.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use super::types::{BatchParseResult, ChatResponse, ParsedTask, TaskStatus};
use super::ParseError;

/// Confidence assumed when the model omits one.
const DEFAULT_CONFIDENCE: f64 = 0.8;
const DEFAULT_PRIORITY: u8 = 50;

const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Assistant text of the first choice, with markdown fences stripped.
/// A reply with no choices or nothing but fences means the provider
/// answered without content.
pub fn extract_content(response: &ChatResponse, provider: &str) -> Result<String, ParseError> {
    let content = response
        .choices
        .first()
        .map(|choice| choice.message.content.as_str())
        .ok_or_else(|| ParseError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: "reply contains no choices".into(),
        })?;

    let stripped = strip_fences(content);
    if stripped.is_empty() {
        return Err(ParseError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: "reply content is empty".into(),
        });
    }
    Ok(stripped.to_string())
}

/// Remove a leading ```` ```json ```` or ```` ``` ```` fence and a
/// trailing ```` ``` ```` fence, if present.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[derive(Deserialize)]
struct BatchWire {
    tasks: Vec<Value>,
    #[serde(default, alias = "overallConfidence")]
    overall_confidence: Option<f64>,
    #[serde(default, alias = "isSingleTask")]
    is_single_task: Option<bool>,
}

#[derive(Deserialize)]
struct TaskWire {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default, alias = "estimatedDuration")]
    estimated_duration: Option<u32>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Normalize extracted JSON into a batch result. Accepts both the batch
/// envelope and a bare single-task object.
pub fn normalize_batch(content: &str) -> Result<BatchParseResult, ParseError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| ParseError::ParseFailed(format!("invalid JSON: {e}")))?;

    let (raw_tasks, declared_confidence, declared_single) =
        if value.get("tasks").is_some_and(Value::is_array) {
            let batch: BatchWire = serde_json::from_value(value)
                .map_err(|e| ParseError::ParseFailed(format!("invalid batch envelope: {e}")))?;
            (batch.tasks, batch.overall_confidence, batch.is_single_task)
        } else {
            (vec![value], None, None)
        };

    if raw_tasks.is_empty() {
        return Err(ParseError::ParseFailed("reply contains no tasks".into()));
    }

    let mut tasks = Vec::with_capacity(raw_tasks.len());
    for raw in raw_tasks {
        let task = decode_task(raw)
            .map_err(|reason| ParseError::ParseFailed(format!("undecodable task item: {reason}")))?;
        tasks.push(task);
    }

    let overall_confidence = declared_confidence.unwrap_or_else(|| {
        tasks.iter().map(|t| t.confidence).sum::<f64>() / tasks.len() as f64
    });
    let is_single_task = declared_single.unwrap_or(tasks.len() == 1);

    Ok(BatchParseResult {
        tasks,
        overall_confidence,
        is_single_task,
    })
}

fn decode_task(raw: Value) -> Result<ParsedTask, String> {
    let wire: TaskWire = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    if wire.title.trim().is_empty() {
        return Err("empty title".into());
    }

    let deadline = match wire.deadline.as_deref().filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => Some(
            NaiveDateTime::parse_from_str(raw, DEADLINE_FORMAT)
                .map_err(|e| format!("bad deadline {raw:?}: {e}"))?,
        ),
        None => None,
    };

    Ok(ParsedTask {
        title: wire.title.trim().to_string(),
        description: wire.description.unwrap_or_default(),
        status: wire
            .status
            .as_deref()
            .map(TaskStatus::from_wire)
            .unwrap_or_default(),
        category: wire.category.filter(|c| !c.trim().is_empty()),
        deadline,
        estimated_duration: wire.estimated_duration,
        tags: wire.tags.unwrap_or_default(),
        priority: wire
            .priority
            .unwrap_or(DEFAULT_PRIORITY as i64)
            .clamp(0, 100) as u8,
        confidence: wire.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
    })
}
