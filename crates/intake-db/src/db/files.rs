//! PostgreSQL repository for the stored_files table.

use async_trait::async_trait;
use intake_core::{NewStoredFile, StoredFile, UploadError};
use sqlx::{PgPool, Postgres};

use super::repository::{FileRepository, LookupField};

const COLUMNS: &str = "id, name, path, disk, mime_type, size, user_id, created_at";

/// Repository for stored_files table.
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    #[tracing::instrument(skip(self, file), fields(db.table = "stored_files", path = %file.path))]
    async fn create(&self, file: NewStoredFile) -> Result<StoredFile, UploadError> {
        let record = sqlx::query_as::<Postgres, StoredFile>(&format!(
            r#"
            INSERT INTO stored_files (name, path, disk, mime_type, size, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&file.name)
        .bind(&file.path)
        .bind(&file.disk)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(file.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "stored_files", db.record_id = id))]
    async fn find(&self, id: i64) -> Result<Option<StoredFile>, UploadError> {
        let record = sqlx::query_as::<Postgres, StoredFile>(&format!(
            "SELECT {} FROM stored_files WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "stored_files"))]
    async fn find_by(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<StoredFile>, UploadError> {
        // Column names come from the closed LookupField set, never from input.
        let record = sqlx::query_as::<Postgres, StoredFile>(&format!(
            "SELECT {} FROM stored_files WHERE {} = $1 ORDER BY id LIMIT 1",
            COLUMNS,
            field.column()
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "stored_files"))]
    async fn total_size_for_owner(&self, user_id: i64) -> Result<u64, UploadError> {
        let total: i64 = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COALESCE(SUM(size), 0)::BIGINT FROM stored_files WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.max(0) as u64)
    }

    #[tracing::instrument(skip(self), fields(db.table = "stored_files", db.record_id = id))]
    async fn delete(&self, id: i64) -> Result<bool, UploadError> {
        let result = sqlx::query("DELETE FROM stored_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
