use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::resume::{ResumeDocument, ResumeRecord, Revision, SaveResumeRequest};
use crate::store::{ResumeStore, StoreError};

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    resumes: RwLock<HashMap<Uuid, ResumeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn create(
        &self,
        title: &str,
        document: ResumeDocument,
    ) -> Result<ResumeRecord, StoreError> {
        let now = Utc::now();
        let record = ResumeRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            document,
            revision: Revision::from_counter(1),
            match_score: None,
            created_at: now,
            updated_at: now,
        };
        self.resumes
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<ResumeRecord, StoreError> {
        self.resumes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn save(
        &self,
        id: Uuid,
        request: SaveResumeRequest,
    ) -> Result<ResumeRecord, StoreError> {
        // Compare and swap under one write guard.
        let mut resumes = self.resumes.write().await;
        let record = resumes.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.revision != request.revision {
            debug!(
                "rejecting save of {id}: sent {}, stored {}",
                request.revision, record.revision
            );
            return Err(StoreError::Conflict {
                current: record.revision.clone(),
            });
        }

        let next = record.revision.counter().unwrap_or(0) + 1;
        record.document = request.document;
        record.revision = Revision::from_counter(next);
        if request.match_score.is_some() {
            record.match_score = request.match_score;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}
