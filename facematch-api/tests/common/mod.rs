use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tower::ServiceExt;

use facematch_api::{router, AppState};
use facematch_common::store::{EmbeddingStore, StoreError, StoreResult};
use facematch_common::types::{AttendanceRecord, EmbeddingRecord};

pub const MAX_BODY_SIZE: usize = 1_000_000;

/// In-memory stand-in for the postgres store. Counts every call so tests can
/// assert that rejected requests never reached it.
#[derive(Default)]
pub struct MockStore {
    students: Mutex<Vec<EmbeddingRecord>>,
    attendance: Mutex<Vec<AttendanceRecord>>,
    calls: AtomicUsize,
    failing: bool,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_students(students: Vec<EmbeddingRecord>) -> Arc<Self> {
        Arc::new(Self {
            students: Mutex::new(students),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            failing: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn students(&self) -> Vec<EmbeddingRecord> {
        self.students.lock().clone()
    }

    pub fn attendance(&self) -> Vec<AttendanceRecord> {
        self.attendance.lock().clone()
    }

    fn enter(&self, command: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(StoreError::QueryError {
                command: command.to_owned(),
                error: sqlx::Error::PoolTimedOut,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingStore for MockStore {
    async fn insert_student(&self, record: &EmbeddingRecord) -> StoreResult<()> {
        self.enter("INSERT")?;

        let mut students = self.students.lock();
        if students.iter().any(|s| s.student_id == record.student_id) {
            return Err(StoreError::QueryError {
                command: "INSERT".to_owned(),
                error: sqlx::Error::Protocol(
                    "duplicate key value violates unique constraint \"students_pkey\"".to_owned(),
                ),
            });
        }
        students.push(record.clone());

        Ok(())
    }

    async fn list_students(&self) -> StoreResult<Vec<EmbeddingRecord>> {
        self.enter("SELECT")?;
        Ok(self.students.lock().clone())
    }

    async fn record_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        self.enter("INSERT")?;
        self.attendance.lock().push(record.clone());
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.enter("SELECT")
    }
}

pub struct TestHarness {
    pub store: Arc<MockStore>,
    app: Router,
}

impl TestHarness {
    pub fn new(store: Arc<MockStore>) -> Self {
        Self::with_body_limit(store, MAX_BODY_SIZE)
    }

    pub fn with_body_limit(store: Arc<MockStore>, max_body_size: usize) -> Self {
        let state = AppState {
            store: store.clone(),
        };

        Self {
            store,
            app: router(state, max_body_size),
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.post_raw(uri, serde_json::to_string(&body).unwrap())
            .await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> Response<Body> {
        self.post_with(uri, Some("application/json"), body).await
    }

    pub async fn post_with(
        &self,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> Response<Body> {
        let mut request = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }

        self.app
            .clone()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }
}

pub fn student(id: &str, name: &str, class: &str, embedding: Vec<f64>) -> EmbeddingRecord {
    EmbeddingRecord::new(id, name, class, embedding)
}
