use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::{extract::State, Json};
use chrono::Utc;
use facematch_common::matcher::ATTENDANCE;
use facematch_common::types::{AttendanceRecord, EmbeddingRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{decode_body, run_scan, ProbeRequest};
use crate::app::AppState;
use crate::error::{ApiError, AttendanceError};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Success,
    Error,
}

/// Every `/attendance` response has this shape, whatever the status code.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub status: AttendanceStatus,
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub class_name: Option<String>,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AttendanceResponse {
    pub fn success(student: &EmbeddingRecord, dist: f64) -> Self {
        Self {
            status: AttendanceStatus::Success,
            student_id: Some(student.student_id.clone()),
            name: Some(student.name.clone()),
            class_name: Some(student.class.clone()).filter(|class| !class.is_empty()),
            message: "Attendance marked".to_owned(),
            dist: Some(dist),
            detail: None,
        }
    }

    pub fn failure(message: &str, dist: Option<f64>, detail: Option<String>) -> Self {
        Self {
            status: AttendanceStatus::Error,
            student_id: None,
            name: None,
            class_name: None,
            message: message.to_owned(),
            dist,
            detail,
        }
    }
}

pub async fn attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AttendanceResponse>, AttendanceError> {
    let payload: ProbeRequest = decode_body(&headers, body)?;
    let probe = payload.into_probe().ok_or(ApiError::MissingEmbedding)?;

    let students = state.store.list_students().await?;
    let best = run_scan("attendance", &probe, &students, ATTENDANCE)?;

    let Some(student) = best.accepted(ATTENDANCE.threshold) else {
        return Ok(Json(AttendanceResponse::failure(
            "No match",
            Some(best.score),
            None,
        )));
    };

    let record = AttendanceRecord::at(&student.student_id, Utc::now());
    state.store.record_attendance(&record).await?;

    info!(
        student_id = %record.student_id,
        date = %record.date,
        time = %record.time,
        dist = best.score,
        "attendance marked"
    );

    Ok(Json(AttendanceResponse::success(student, best.score)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let student = EmbeddingRecord::new("s-1", "Ada", "7B", vec![0.0]);

        assert_eq!(
            serde_json::to_value(AttendanceResponse::success(&student, 0.25)).unwrap(),
            json!({
                "status": "success",
                "studentId": "s-1",
                "name": "Ada",
                "className": "7B",
                "message": "Attendance marked",
                "dist": 0.25,
            })
        );
    }

    #[test]
    fn test_empty_class_is_null() {
        let student = EmbeddingRecord::new("s-1", "Ada", "", vec![0.0]);
        let response = AttendanceResponse::success(&student, 0.0);
        assert_eq!(response.class_name, None);
    }

    #[test]
    fn test_failure_shape() {
        assert_eq!(
            serde_json::to_value(AttendanceResponse::failure("Missing embedding", None, None))
                .unwrap(),
            json!({
                "status": "error",
                "studentId": null,
                "name": null,
                "className": null,
                "message": "Missing embedding",
            })
        );
    }

    #[test]
    fn test_infinite_distance_serializes_as_null() {
        let body =
            serde_json::to_value(AttendanceResponse::failure("No match", Some(f64::INFINITY), None))
                .unwrap();
        assert_eq!(body["dist"], serde_json::Value::Null);
        assert!(body.as_object().unwrap().contains_key("dist"));
    }
}
