use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::{ResumeDocument, ResumeRecord, ResumeRow, SaveResumeRequest};
use crate::store::{ResumeStore, StoreError};

/// Postgres-backed store. Schema: `migrations/001_resumes.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn create(
        &self,
        title: &str,
        document: ResumeDocument,
    ) -> Result<ResumeRecord, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, title, document, revision)
            VALUES ($1, $2, $3, 1)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(Json(document))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get(&self, id: Uuid) -> Result<ResumeRecord, StoreError> {
        let row: Option<ResumeRow> = sqlx::query_as("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Into::into).ok_or(StoreError::NotFound(id))
    }

    async fn save(
        &self,
        id: Uuid,
        request: SaveResumeRequest,
    ) -> Result<ResumeRecord, StoreError> {
        // Tokens this server did not issue can never match.
        let Some(expected) = request.revision.counter() else {
            return Err(self.conflict(id).await);
        };

        let row: Option<ResumeRow> = sqlx::query_as(
            r#"
            UPDATE resumes
            SET document = $3,
                revision = revision + 1,
                match_score = COALESCE($4, match_score),
                updated_at = NOW()
            WHERE id = $1 AND revision = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(Json(request.document))
        .bind(request.match_score)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(self.conflict(id).await),
        }
    }
}

impl PgStore {
    /// Zero rows updated: either the id is unknown or the token is stale.
    async fn conflict(&self, id: Uuid) -> StoreError {
        match self.get(id).await {
            Ok(current) => StoreError::Conflict {
                current: current.revision,
            },
            Err(e) => e,
        }
    }
}
