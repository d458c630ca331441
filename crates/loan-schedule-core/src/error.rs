use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanScheduleError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Unsupported session version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Duplicate loan update id: {0}")]
    DuplicateUpdateId(String),

    #[error("Loan update not found: {0}")]
    UpdateNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanScheduleError {
    fn from(e: serde_json::Error) -> Self {
        LoanScheduleError::SerializationError(e.to_string())
    }
}
