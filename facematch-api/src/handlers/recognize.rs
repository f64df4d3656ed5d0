use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::{extract::State, Json};
use facematch_common::matcher::RECOGNIZE;
use facematch_common::types::EmbeddingRecord;
use serde::Serialize;
use tracing::info;

use super::{decode_body, run_scan, ProbeRequest};
use crate::app::AppState;
use crate::error::ApiError;

/// A miss is not an error: both shapes go out with 200 and differ in `success`,
/// which is derived from the outcome.
/// `score` is infinite when nothing is registered and serializes as `null`.
#[derive(Serialize, Debug, PartialEq)]
pub struct RecognizeResponse {
    success: bool,
    #[serde(flatten)]
    outcome: Recognition,
    score: f64,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
enum Recognition {
    Matched { student: EmbeddingRecord },
    Unmatched { message: &'static str },
}

impl RecognizeResponse {
    pub fn matched(student: EmbeddingRecord, score: f64) -> Self {
        Self {
            success: true,
            outcome: Recognition::Matched { student },
            score,
        }
    }

    pub fn unmatched(score: f64) -> Self {
        Self {
            success: false,
            outcome: Recognition::Unmatched {
                message: "No match",
            },
            score,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }
}

pub async fn recognize(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RecognizeResponse>, ApiError> {
    let payload: ProbeRequest = decode_body(&headers, body)?;
    let probe = payload.into_probe().ok_or(ApiError::MissingEmbedding)?;

    let students = state.store.list_students().await?;
    let best = run_scan("recognize", &probe, &students, RECOGNIZE)?;

    let response = match best.accepted(RECOGNIZE.threshold) {
        Some(student) => {
            info!(student_id = %student.student_id, score = best.score, "recognized student");
            RecognizeResponse::matched(student.clone(), best.score)
        }
        None => RecognizeResponse::unmatched(best.score),
    };

    Ok(Json(response))
}
