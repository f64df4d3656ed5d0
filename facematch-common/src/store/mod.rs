mod postgres;

pub use postgres::{PgConfig, PgStore};

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{AttendanceRecord, EmbeddingRecord};

/// Enumeration of errors for operations against the embedding store.
/// Errors can originate from sqlx and are wrapped by us to provide additional context.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed with: {error}")]
    ConnectionError { error: sqlx::Error },
    #[error("{command} query failed with: {error}")]
    QueryError {
        command: String,
        error: sqlx::Error,
    },
    #[error("embedding for student {student_id} is malformed: {error}")]
    MalformedEmbedding {
        student_id: String,
        error: serde_json::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence used by the request handlers.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn insert_student(&self, record: &EmbeddingRecord) -> StoreResult<()>;

    /// Every registered student, in registration order.
    async fn list_students(&self) -> StoreResult<Vec<EmbeddingRecord>>;

    async fn record_attendance(&self, record: &AttendanceRecord) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
}
