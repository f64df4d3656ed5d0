use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Postgres;
use tracing::{debug, error};

use super::{EmbeddingStore, StoreError, StoreResult};
use crate::types::{decode_embedding, AttendanceRecord, EmbeddingRecord};

/// Connection settings for [`PgStore`].
#[derive(Debug, Clone)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PgConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

#[derive(sqlx::FromRow)]
struct StudentRow {
    student_id: String,
    name: String,
    class: String,
    face_embedding: String,
}

impl StudentRow {
    fn into_record(self) -> StoreResult<EmbeddingRecord> {
        let embedding = decode_embedding(&self.face_embedding).map_err(|error| {
            error!(student_id = %self.student_id, %error, "malformed face_embedding row");
            StoreError::MalformedEmbedding {
                student_id: self.student_id.clone(),
                error,
            }
        })?;

        Ok(EmbeddingRecord {
            student_id: self.student_id,
            name: self.name,
            class: self.class,
            embedding,
        })
    }
}

/// An [`EmbeddingStore`] backed by the `students` and `attendance` tables in PostgreSQL.
///
/// Every operation checks a connection out of the pool and hands it back when the
/// connection guard drops, whichever way the operation exits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool with the given settings.
    pub async fn new(config: &PgConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|error| StoreError::ConnectionError { error })?;

        Ok(Self { pool })
    }

    pub fn new_from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the SQL files under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../migrations").run(&self.pool).await
    }

    async fn connection(&self) -> StoreResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|error| StoreError::ConnectionError { error })
    }
}

#[async_trait]
impl EmbeddingStore for PgStore {
    async fn insert_student(&self, record: &EmbeddingRecord) -> StoreResult<()> {
        let mut conn = self.connection().await?;

        sqlx::query(
            r#"
INSERT INTO students
    (student_id, name, class, face_embedding)
VALUES
    ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.student_id)
        .bind(&record.name)
        .bind(&record.class)
        .bind(sqlx::types::Json(&record.embedding))
        .execute(&mut *conn)
        .await
        .map_err(|error| StoreError::QueryError {
            command: "INSERT".to_owned(),
            error,
        })?;

        Ok(())
    }

    async fn list_students(&self) -> StoreResult<Vec<EmbeddingRecord>> {
        let mut conn = self.connection().await?;

        // Read the column back as text: it may hold a JSON array or a JSON string wrapping one.
        let rows: Vec<StudentRow> = sqlx::query_as(
            r#"
SELECT
    student_id,
    name,
    class,
    face_embedding::text AS face_embedding
FROM
    students
ORDER BY
    created_at, student_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|error| StoreError::QueryError {
            command: "SELECT".to_owned(),
            error,
        })?;

        debug!(rows = rows.len(), "loaded student embeddings");
        rows.into_iter().map(StudentRow::into_record).collect()
    }

    async fn record_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        let mut conn = self.connection().await?;

        sqlx::query("INSERT INTO attendance (student_id, date, time) VALUES ($1, $2, $3)")
            .bind(&record.student_id)
            .bind(record.date)
            .bind(record.time)
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::QueryError {
                command: "INSERT".to_owned(),
                error,
            })?;

        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;

        sqlx::query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::QueryError {
                command: "SELECT".to_owned(),
                error,
            })?;

        Ok(())
    }
}
