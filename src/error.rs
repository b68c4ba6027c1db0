use thiserror::Error;

/// A v1 input document that does not match the legacy schema.
///
/// Every variant carries enough context (the offending entry id or index, the
/// field name) for an operator to fix the source file and re-run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("{context}: expected a JSON object for {what}")]
    NotAnObject {
        what: &'static str,
        context: String,
    },
    #[error("{context}: missing required field `{field}`")]
    MissingField {
        context: String,
        field: &'static str,
    },
    #[error("{context}: unexpected field `{field}`")]
    UnexpectedField { context: String, field: String },
    #[error("{context}: field `{field}` must be {expected}")]
    WrongType {
        context: String,
        field: String,
        expected: &'static str,
    },
    #[error("{context}: malformed id `{id}` (expected 64 lowercase hex characters)")]
    MalformedId { context: String, id: String },
    #[error("{context}: `history` must contain at least one record")]
    EmptyHistory { context: String },
    #[error("{context}: history record has no fields")]
    EmptyRecord { context: String },
    #[error("`entries` is empty; refusing to fabricate a root directory for an empty vault")]
    EmptyEntries,
    #[error("{context}: timestamp {value} cannot be represented in nanoseconds")]
    TimestampOutOfRange { context: String, value: i64 },
}

/// Fatal conversion failures. A run either produces a complete v2 database or
/// one of these; there is no partial output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
    #[error("timestamp tie-break counter exhausted (at most 999999999 history records per run)")]
    CounterExhausted,
}
