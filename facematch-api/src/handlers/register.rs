use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::{extract::State, Json};
use facematch_common::types::EmbeddingRecord;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::decode_body;
use crate::app::AppState;
use crate::error::ApiError;

/// The body of a request made to register a student's face.
#[derive(Deserialize, Debug, Default)]
pub struct RegisterRequest {
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_student_id")]
    pub student_id: Option<String>,

    #[serde(rename = "className")]
    pub class_name: Option<String>,

    pub embedding: Option<Vec<f64>>,
}

impl RegisterRequest {
    /// Build the record to store, or `None` when `student_id` or `embedding` is missing or empty.
    pub fn into_record(self) -> Option<EmbeddingRecord> {
        let student_id = self.student_id.filter(|id| !id.is_empty())?;
        let embedding = self.embedding.filter(|embedding| !embedding.is_empty())?;

        Some(EmbeddingRecord {
            student_id,
            name: self.name.unwrap_or_default(),
            class: self.class_name.unwrap_or_default(),
            embedding,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StudentId {
    Text(String),
    Number(serde_json::Number),
}

// Clients send ids both as strings and as bare numbers.
fn deserialize_student_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<StudentId>::deserialize(deserializer)?;

    Ok(id.map(|id| match id {
        StudentId::Text(text) => text,
        StudentId::Number(number) => number.to_string(),
    }))
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct RegisterResponse {
    pub message: String,
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let payload: RegisterRequest = decode_body(&headers, body)?;
    let record = payload.into_record().ok_or(ApiError::MissingFields)?;

    state.store.insert_student(&record).await?;

    info!(
        student_id = %record.student_id,
        dimensions = record.embedding.len(),
        "registered student"
    );

    Ok(Json(RegisterResponse {
        message: "Registered".to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> RegisterRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_full_request() {
        let record = parse(
            r#"{"name": "Ada", "student_id": "s-1", "className": "7B", "embedding": [0.1, 0.2]}"#,
        )
        .into_record()
        .unwrap();

        assert_eq!(
            record,
            EmbeddingRecord::new("s-1", "Ada", "7B", vec![0.1, 0.2])
        );
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let record = parse(r#"{"student_id": "s-1", "embedding": [1]}"#)
            .into_record()
            .unwrap();

        assert_eq!(record.name, "");
        assert_eq!(record.class, "");
    }

    #[test]
    fn test_numeric_student_id() {
        let record = parse(r#"{"student_id": 42, "embedding": [1]}"#)
            .into_record()
            .unwrap();

        assert_eq!(record.student_id, "42");
    }

    #[test]
    fn test_missing_required_fields() {
        let missing = [
            r#"{}"#,
            r#"{"student_id": "s-1"}"#,
            r#"{"embedding": [1, 2]}"#,
            r#"{"student_id": "", "embedding": [1, 2]}"#,
            r#"{"student_id": "s-1", "embedding": []}"#,
            r#"{"student_id": null, "embedding": [1, 2]}"#,
        ];

        for body in missing {
            assert!(parse(body).into_record().is_none(), "{body}");
        }
    }
}
