use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::http::{header, HeaderMap};
use axum::Json;
use facematch_common::matcher::{best_match, BestMatch, MatchError, MatchPolicy};
use facematch_common::metrics::{record_match_outcome, record_scan_duration};
use facematch_common::types::EmbeddingRecord;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

pub mod attendance;
pub mod recognize;
pub mod register;

/// Body of `/recognize` and `/attendance`.
#[derive(Deserialize, Debug, Default)]
pub struct ProbeRequest {
    pub embedding: Option<Vec<f64>>,
}

impl ProbeRequest {
    /// The probe vector, unless it is absent or empty.
    pub fn into_probe(self) -> Option<Vec<f64>> {
        self.embedding.filter(|embedding| !embedding.is_empty())
    }
}

/// Parse a request body as JSON. A body with no JSON content type, or no bytes at all,
/// reads as an empty object and is left to the missing-field checks.
fn decode_body<T>(
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    let body = body.map_err(JsonRejection::from)?;
    if body.is_empty() || !is_json(headers) {
        return Ok(T::default());
    }

    let Json(payload) = Json::<T>::from_bytes(&body)?;
    Ok(payload)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Scan `students` for the closest match to `probe` under `policy`, recording metrics for `endpoint`.
fn run_scan<'a>(
    endpoint: &'static str,
    probe: &[f64],
    students: &'a [EmbeddingRecord],
    policy: MatchPolicy,
) -> Result<BestMatch<'a>, MatchError> {
    let started = Instant::now();
    let best = best_match(probe, students, policy.metric)?;
    record_scan_duration(endpoint, students.len(), started);

    let matched = best.accepted(policy.threshold).is_some();
    record_match_outcome(endpoint, matched);

    debug!(
        endpoint,
        metric = policy.metric.as_str(),
        candidates = students.len(),
        score = best.score,
        matched,
        "scan complete"
    );

    Ok(best)
}
