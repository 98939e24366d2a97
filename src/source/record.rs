use super::time::TimeParser;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A validated, normalized comment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CandidateRecord {
    pub comment_id: u64,
    pub movie_id: u64,
    pub rating: i64,
    pub unix_time: i64,
    pub text: String,
    pub agree: u64,
    pub disagree: u64,
}

impl CandidateRecord {
    /// The `(comment_id, unix_time)` pair used to fingerprint submissions.
    pub fn submission(&self) -> (u64, i64) {
        (self.comment_id, self.unix_time)
    }
}

#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    #[error("Record is not an object")]
    NotObject,
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid integer for {field}: {value}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// The outcome of parsing one source's raw records.
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub records: Vec<CandidateRecord>,
    pub errors: Vec<ParseError>,
    pub repeated: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecordParser {
    time: TimeParser,
}

impl RecordParser {
    pub fn new(time: TimeParser) -> RecordParser {
        RecordParser { time }
    }

    /// Drops structurally identical repeats and validates what remains.
    pub fn parse_source(&self, raw: &[Value]) -> ParsedSource {
        let mut seen = HashSet::with_capacity(raw.len());
        let mut parsed = ParsedSource::default();

        for value in raw {
            // serde_json's default map is ordered, so this is canonical.
            if !seen.insert(value.to_string()) {
                parsed.repeated += 1;
                continue;
            }

            match self.parse_record(value) {
                Ok(record) => parsed.records.push(record),
                Err(error) => parsed.errors.push(error),
            }
        }

        parsed
    }

    pub fn parse_record(&self, value: &Value) -> Result<CandidateRecord, ParseError> {
        let fields = value.as_object().ok_or(ParseError::NotObject)?;

        let comment_id = get_u64(fields, "idx")?;
        let movie_id = fields
            .get("movie_idx")
            .or_else(|| fields.get("movie"))
            .ok_or(ParseError::MissingField("movie_idx"))
            .and_then(|value| to_integer(value, "movie_idx"))
            .and_then(|value| non_negative(value, "movie_idx"))?;
        let rating = get_integer(fields, "score")?;

        let written_at = fields
            .get("written_at")
            .ok_or(ParseError::MissingField("written_at"))?;
        let written_at = written_at
            .as_str()
            .ok_or_else(|| ParseError::InvalidTimestamp(written_at.to_string()))?;
        let unix_time = self
            .time
            .parse(written_at)
            .ok_or_else(|| ParseError::InvalidTimestamp(written_at.to_string()))?;

        let text = fields
            .get("text")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(CandidateRecord {
            comment_id,
            movie_id,
            rating,
            unix_time,
            text,
            agree: get_optional_u64(fields, "agree")?,
            disagree: get_optional_u64(fields, "disagree")?,
        })
    }
}

fn to_integer(value: &Value, field: &'static str) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidInteger {
        field,
        value: value.to_string(),
    };

    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
                    .map(|v| v as i64)
            })
            .ok_or_else(invalid),
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn non_negative(value: i64, field: &'static str) -> Result<u64, ParseError> {
    if value >= 0 {
        Ok(value as u64)
    } else {
        Err(ParseError::InvalidInteger {
            field,
            value: value.to_string(),
        })
    }
}

fn get_integer(fields: &Map<String, Value>, field: &'static str) -> Result<i64, ParseError> {
    fields
        .get(field)
        .ok_or(ParseError::MissingField(field))
        .and_then(|value| to_integer(value, field))
}

fn get_u64(fields: &Map<String, Value>, field: &'static str) -> Result<u64, ParseError> {
    get_integer(fields, field).and_then(|value| non_negative(value, field))
}

fn get_optional_u64(fields: &Map<String, Value>, field: &'static str) -> Result<u64, ParseError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => to_integer(value, field).and_then(|value| non_negative(value, field)),
    }
}
