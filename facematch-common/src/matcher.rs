//! Brute-force nearest-neighbour search over every registered embedding.

use thiserror::Error;

use crate::distance::Metric;
use crate::types::EmbeddingRecord;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("embedding for student {student_id} has {actual} dimensions, probe has {expected}")]
    DimensionMismatch {
        student_id: String,
        expected: usize,
        actual: usize,
    },
}

/// Acceptance rule applied to the best score of a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// Accept iff `score < limit`.
    Below(f64),
    /// Accept iff `score <= limit`.
    AtMost(f64),
}

impl Threshold {
    pub fn accepts(&self, score: f64) -> bool {
        match *self {
            Threshold::Below(limit) => score < limit,
            Threshold::AtMost(limit) => score <= limit,
        }
    }
}

/// A metric and the threshold its scores are judged against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    pub metric: Metric,
    pub threshold: Threshold,
}

/// Used by `/recognize`.
pub const RECOGNIZE: MatchPolicy = MatchPolicy {
    metric: Metric::Cosine,
    threshold: Threshold::Below(0.35),
};

/// Used by `/attendance`. Note the inclusive bound, unlike [`RECOGNIZE`].
pub const ATTENDANCE: MatchPolicy = MatchPolicy {
    metric: Metric::Euclidean,
    threshold: Threshold::AtMost(0.7),
};

/// Closest record found by a scan. `record` is `None` and `score` is infinite when nothing was scanned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch<'a> {
    pub record: Option<&'a EmbeddingRecord>,
    pub score: f64,
}

impl<'a> BestMatch<'a> {
    /// The matched record, if there is one and its score passes `threshold`.
    pub fn accepted(&self, threshold: Threshold) -> Option<&'a EmbeddingRecord> {
        self.record.filter(|_| threshold.accepts(self.score))
    }
}

/// Score `probe` against every record and keep the minimum.
///
/// The comparison is a strict `<`, so the earliest record wins a tie and a NaN score
/// (cosine against an all-zero vector) is never selected.
pub fn best_match<'a>(
    probe: &[f64],
    records: &'a [EmbeddingRecord],
    metric: Metric,
) -> Result<BestMatch<'a>, MatchError> {
    let mut best = BestMatch {
        record: None,
        score: f64::INFINITY,
    };

    for record in records {
        if record.embedding.len() != probe.len() {
            return Err(MatchError::DimensionMismatch {
                student_id: record.student_id.clone(),
                expected: probe.len(),
                actual: record.embedding.len(),
            });
        }

        let score = metric.distance(&record.embedding, probe);
        if score < best.score {
            best = BestMatch {
                record: Some(record),
                score,
            };
        }
    }

    Ok(best)
}
