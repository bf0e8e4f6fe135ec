use crate::structured::StructuredError;

pub const DECODE_FAILED_MESSAGE: &str = "decode structured error failed";

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// A decode failure as a first-class structured value: a warning whose cause
/// is the underlying parse failure.
impl From<DecodeError> for StructuredError {
    #[track_caller]
    fn from(err: DecodeError) -> Self {
        StructuredError::warning(DECODE_FAILED_MESSAGE).with_cause(err)
    }
}
