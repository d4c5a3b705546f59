//! Natural-language task parsing core.
//!
//! Turns free-form Chinese/English utterances ("明天下午3点开会，2小时")
//! into structured tasks. Two paths produce the same output shape:
//!
//! - the AI path: an ordered chain of LLM providers tried in sequence,
//!   with the first usable reply normalized into a task batch;
//! - the deterministic fallback: a regex-and-keyword parser that needs
//!   no network and always returns a single low-confidence task.
//!
//! All relative-date resolution is anchored on a caller-supplied
//! reference time, so parsing is reproducible.

pub mod config;
pub mod fallback;
pub mod parse;
pub mod store;

pub use config::{AiSettings, ProviderConfig, ProviderKind};
pub use parse::orchestrator::TaskParser;
pub use parse::types::{BatchParseResult, ParseRequest, ParsedTask, TaskStatus};
pub use parse::ParseError;
pub use store::{persist_batch, TaskStore};
