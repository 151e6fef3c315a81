//! Per-caller sessions. Each session owns at most one table, replaced wholesale
//! by the next successful generation or import.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::research::search_client::Snippet;
use crate::research::ResearchSummary;
use crate::topic_map::error::ValidationError;
use crate::topic_map::record::TopicRecord;
use crate::topic_map::table::TopicTable;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub topic: String,
    pub research: Option<ResearchSummary>,
    /// Search snippets the current map was synthesized from.
    pub sources: Vec<Snippet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    table: Option<TopicTable>,
}

impl Session {
    pub fn new(topic: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            research: None,
            sources: Vec::new(),
            created_at: now,
            updated_at: now,
            table: None,
        }
    }

    pub fn table(&self) -> Option<&TopicTable> {
        self.table.as_ref()
    }

    /// Replaces the current table. On failure the previous table is left untouched.
    pub fn load(&mut self, records: Vec<TopicRecord>) -> Result<&TopicTable, ValidationError> {
        let table = TopicTable::load(records)?;
        self.updated_at = Utc::now();
        Ok(&*self.table.insert(table))
    }
}

/// In-memory session registry shared by all handlers.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) -> Uuid {
        let id = session.id;
        self.inner.write().await.insert(id, session);
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Runs `f` against the session under the write lock. `None` if the id is unknown.
    pub async fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        self.inner.write().await.get_mut(&id).map(f)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic_map::validation::fixtures::content_marketing;

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let mut session = Session::new("Content Marketing");
        session.load(content_marketing()).unwrap();

        let mut broken = content_marketing();
        broken[1].priority_score = 6;
        assert!(session.load(broken).is_err());

        let table = session.table().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[1].priority_score, 4);
    }

    #[test]
    fn test_load_replaces_table_wholesale() {
        let mut session = Session::new("Content Marketing");
        session.load(content_marketing()).unwrap();
        let mut smaller = content_marketing();
        smaller.truncate(1);
        session.load(smaller).unwrap();
        assert_eq!(session.table().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_update_and_remove() {
        let store = SessionStore::new();
        let id = store.insert(Session::new("Content Marketing")).await;

        let loaded = store
            .update(id, |s| s.load(content_marketing()).map(|t| t.len()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(store.get(id).await.unwrap().table().unwrap().len(), 3);

        assert!(store.update(Uuid::new_v4(), |_| ()).await.is_none());
        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert_eq!(store.len().await, 0);
    }
}
