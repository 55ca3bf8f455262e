//! Resume persistence. The save path is a compare-and-swap on the revision:
//! a write only lands when the caller's token matches the stored one.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::{ResumeDocument, ResumeRecord, Revision, SaveResumeRequest};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resume {0} not found")]
    NotFound(Uuid),

    #[error("stale revision: server is at {current}")]
    Conflict { current: Revision },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Carried in `AppState` as `Arc<dyn ResumeStore>`.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn create(&self, title: &str, document: ResumeDocument)
        -> Result<ResumeRecord, StoreError>;

    async fn get(&self, id: Uuid) -> Result<ResumeRecord, StoreError>;

    /// Stores `request.document` if `request.revision` is current and
    /// returns the record with its new revision.
    async fn save(&self, id: Uuid, request: SaveResumeRequest)
        -> Result<ResumeRecord, StoreError>;
}
