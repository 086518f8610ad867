//! In-memory store implementations for development and testing.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use async_trait::async_trait;

use caravel_core::store::{ScrapedDataStore, StepStore, StoreError, TaskStore};
use caravel_core::types::{ExecutionStep, ScrapedData, Task, TaskId};

const DEFAULT_IN_MEMORY_TASK_LIMIT: usize = 5_000;

/// In-memory task store with a hard capacity limit (oldest evicted first).
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
    order: RwLock<VecDeque<String>>,
    max_tasks: usize,
}

impl InMemoryTaskStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::with_max_tasks(DEFAULT_IN_MEMORY_TASK_LIMIT)
    }

    /// Create a new in-memory store with a hard capacity limit.
    pub fn with_max_tasks(max_tasks: usize) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            order: RwLock::new(VecDeque::new()),
            max_tasks: max_tasks.max(1),
        }
    }

    fn touch_order(order: &mut VecDeque<String>, task_id: &str) {
        order.retain(|id| id != task_id);
        order.push_back(task_id.to_string());
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let mut order = self
            .order
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        if !tasks.contains_key(task.id.as_str()) && tasks.len() >= self.max_tasks {
            if let Some(oldest_id) = order.pop_front() {
                tasks.remove(&oldest_id);
            }
        }
        tasks.insert(task.id.clone(), task.clone());
        Self::touch_order(&mut order, task.id.as_str());
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Result<Option<Task>, StoreError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(tasks.get(task_id).cloned())
    }
}

/// In-memory step store, ordered per task by step number.
#[derive(Default)]
pub struct InMemoryStepStore {
    steps: RwLock<HashMap<TaskId, Vec<ExecutionStep>>>,
}

impl InMemoryStepStore {
    /// Create a new in-memory step store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StepStore for InMemoryStepStore {
    async fn upsert(&self, step: &ExecutionStep) -> Result<(), StoreError> {
        let mut steps = self
            .steps
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let task_steps = steps.entry(step.task_id.clone()).or_default();
        match task_steps
            .iter_mut()
            .find(|s| s.step_number == step.step_number)
        {
            Some(existing) => *existing = step.clone(),
            None => {
                task_steps.push(step.clone());
                task_steps.sort_by_key(|s| s.step_number);
            }
        }
        Ok(())
    }

    async fn list_for_task(&self, task_id: &TaskId) -> Result<Vec<ExecutionStep>, StoreError> {
        let steps = self
            .steps
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(steps.get(task_id).cloned().unwrap_or_default())
    }
}

/// In-memory append-only scrape artifact store.
#[derive(Default)]
pub struct InMemoryScrapedDataStore {
    records: RwLock<HashMap<TaskId, Vec<ScrapedData>>>,
}

impl InMemoryScrapedDataStore {
    /// Create a new in-memory scraped-data store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScrapedDataStore for InMemoryScrapedDataStore {
    async fn append(&self, record: &ScrapedData) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        records
            .entry(record.task_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn list_for_task(&self, task_id: &TaskId) -> Result<Vec<ScrapedData>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(records.get(task_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_memory_task_store_limit() {
        tokio_test::block_on(async {
            let store = InMemoryTaskStore::with_max_tasks(2);
            let t1 = Task::new("intent-a");
            let t2 = Task::new("intent-b");
            let t3 = Task::new("intent-c");
            store.save(&t1).await.unwrap();
            store.save(&t2).await.unwrap();
            store.save(&t3).await.unwrap();

            assert!(store.load(t1.id.as_str()).await.unwrap().is_none());
            assert!(store.load(t2.id.as_str()).await.unwrap().is_some());
            assert!(store.load(t3.id.as_str()).await.unwrap().is_some());
        });
    }

    #[test]
    fn test_step_store_upsert_replaces_same_step_number() {
        tokio_test::block_on(async {
            let store = InMemoryStepStore::new();
            let mut step = ExecutionStep::begin("task-1", 1, "apify_scrape", json!({}));
            store.upsert(&step).await.unwrap();

            step.fail("job ended FAILED");
            store.upsert(&step).await.unwrap();

            let steps = store.list_for_task(&"task-1".to_string()).await.unwrap();
            assert_eq!(steps.len(), 1);
            assert_eq!(steps[0].error.as_deref(), Some("job ended FAILED"));
        });
    }

    #[test]
    fn test_step_store_lists_in_step_number_order() {
        tokio_test::block_on(async {
            let store = InMemoryStepStore::new();
            store
                .upsert(&ExecutionStep::begin("task-1", 2, "apify_scrape", json!({})))
                .await
                .unwrap();
            store
                .upsert(&ExecutionStep::begin("task-1", 1, "tavily_search", json!({})))
                .await
                .unwrap();

            let steps = store.list_for_task(&"task-1".to_string()).await.unwrap();
            let numbers: Vec<u32> = steps.iter().map(|s| s.step_number).collect();
            assert_eq!(numbers, vec![1, 2]);
        });
    }

    #[test]
    fn test_scraped_data_store_appends_per_task() {
        tokio_test::block_on(async {
            let store = InMemoryScrapedDataStore::new();
            store
                .append(&ScrapedData::new(
                    "task-1",
                    Some("https://example.com".to_string()),
                    json!([{"price": 10}]),
                    None,
                ))
                .await
                .unwrap();
            store
                .append(&ScrapedData::new("task-2", None, json!([]), None))
                .await
                .unwrap();

            let records = store.list_for_task(&"task-1".to_string()).await.unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].url.as_deref(), Some("https://example.com"));
        });
    }
}
