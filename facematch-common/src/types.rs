use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A registered student and their face embedding.
/// Field names follow the `students` table so the record can be echoed back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub student_id: String,
    pub name: String,
    pub class: String,
    #[serde(rename = "face_embedding")]
    pub embedding: Vec<f64>,
}

impl EmbeddingRecord {
    pub fn new(student_id: &str, name: &str, class: &str, embedding: Vec<f64>) -> Self {
        Self {
            student_id: student_id.to_owned(),
            name: name.to_owned(),
            class: class.to_owned(),
            embedding,
        }
    }
}

/// One row of the append-only attendance log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    /// UTC calendar date.
    pub date: NaiveDate,
    /// UTC wall-clock time, not the server's local time, so it always agrees with `date`.
    pub time: NaiveTime,
}

impl AttendanceRecord {
    /// Stamp an attendance row for `student_id` at the UTC instant `now`, truncated to whole seconds.
    pub fn at(student_id: &str, now: DateTime<Utc>) -> Self {
        let time = now.time();
        Self {
            student_id: student_id.to_owned(),
            date: now.date_naive(),
            time: time.with_nanosecond(0).unwrap_or(time),
        }
    }
}

/// The two layouts an embedding column may hold: a JSON array, or a string
/// containing a JSON-encoded array (rows written by older clients).
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEmbedding {
    Native(Vec<f64>),
    Encoded(String),
}

/// Decode the JSON text of an embedding column in either layout.
pub fn decode_embedding(raw: &str) -> Result<Vec<f64>, serde_json::Error> {
    match serde_json::from_str(raw)? {
        StoredEmbedding::Native(vector) => Ok(vector),
        StoredEmbedding::Encoded(encoded) => serde_json::from_str(&encoded),
    }
}
