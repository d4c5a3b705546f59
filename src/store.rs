//! Persistence seam for parsed tasks.
//!
//! The core never talks to a database directly; callers supply a
//! [`TaskStore`] and the batch-persist helper drives it. Ownership is
//! checked at the store boundary so a caller can only read back tasks
//! it created.

use thiserror::Error;
use uuid::Uuid;

use crate::parse::types::{BatchParseResult, ParsedTask};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(Uuid),

    #[error("task {task} is not owned by {owner}")]
    Forbidden { task: Uuid, owner: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A parsed task bound to its owner and the utterance it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub task: ParsedTask,
    pub source_utterance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

pub trait TaskStore {
    fn create_task(&self, record: &TaskRecord) -> Result<(), StoreError>;

    fn save_history(
        &self,
        task_id: Uuid,
        action: HistoryAction,
        actor: &str,
    ) -> Result<(), StoreError>;

    /// Fetch a task only if `owner_id` created it.
    fn get_owned_task(&self, id: Uuid, owner_id: &str) -> Result<TaskRecord, StoreError>;
}

/// Persist every task in a normalized batch for `owner_id`, writing a
/// creation history entry per task. Returns the new ids in batch order.
pub fn persist_batch(
    store: &dyn TaskStore,
    owner_id: &str,
    utterance: &str,
    batch: &BatchParseResult,
) -> Result<Vec<Uuid>, StoreError> {
    let mut ids = Vec::with_capacity(batch.tasks.len());

    for task in &batch.tasks {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            task: task.clone(),
            source_utterance: utterance.to_string(),
        };
        store.create_task(&record)?;
        store.save_history(record.id, HistoryAction::Create, owner_id)?;
        ids.push(record.id);
    }

    tracing::info!(owner = %owner_id, count = ids.len(), "persisted parsed batch");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::parse::types::TaskStatus;

    #[derive(Default)]
    struct MemoryStore {
        tasks: Mutex<HashMap<Uuid, TaskRecord>>,
        history: Mutex<Vec<(Uuid, HistoryAction, String)>>,
    }

    impl TaskStore for MemoryStore {
        fn create_task(&self, record: &TaskRecord) -> Result<(), StoreError> {
            self.tasks
                .lock()
                .unwrap()
                .insert(record.id, record.clone());
            Ok(())
        }

        fn save_history(
            &self,
            task_id: Uuid,
            action: HistoryAction,
            actor: &str,
        ) -> Result<(), StoreError> {
            self.history
                .lock()
                .unwrap()
                .push((task_id, action, actor.to_string()));
            Ok(())
        }

        fn get_owned_task(&self, id: Uuid, owner_id: &str) -> Result<TaskRecord, StoreError> {
            let tasks = self.tasks.lock().unwrap();
            let record = tasks.get(&id).ok_or(StoreError::NotFound(id))?;
            if record.owner_id != owner_id {
                return Err(StoreError::Forbidden {
                    task: id,
                    owner: owner_id.to_string(),
                });
            }
            Ok(record.clone())
        }
    }

    fn sample_task(title: &str) -> ParsedTask {
        ParsedTask {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            category: None,
            deadline: None,
            estimated_duration: None,
            tags: vec![],
            priority: 50,
            confidence: 0.9,
        }
    }

    fn sample_batch() -> BatchParseResult {
        BatchParseResult {
            tasks: vec![sample_task("开会"), sample_task("写周报")],
            overall_confidence: 0.9,
            is_single_task: false,
        }
    }

    #[test]
    fn persist_batch_stores_each_task_with_history() {
        let store = MemoryStore::default();
        let ids = persist_batch(&store, "user-1", "明天开会然后写周报", &sample_batch()).unwrap();

        assert_eq!(ids.len(), 2);
        let first = store.get_owned_task(ids[0], "user-1").unwrap();
        assert_eq!(first.task.title, "开会");
        assert_eq!(first.source_utterance, "明天开会然后写周报");

        let history = store.history.lock().unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|(_, action, actor)| {
            *action == HistoryAction::Create && actor == "user-1"
        }));
    }

    #[test]
    fn ownership_is_enforced_on_read() {
        let store = MemoryStore::default();
        let ids = persist_batch(&store, "user-1", "开会", &sample_batch()).unwrap();

        assert!(matches!(
            store.get_owned_task(ids[0], "user-2"),
            Err(StoreError::Forbidden { .. })
        ));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(
            store.get_owned_task(Uuid::new_v4(), "user-1"),
            Err(StoreError::NotFound(_))
        ));
    }
}
