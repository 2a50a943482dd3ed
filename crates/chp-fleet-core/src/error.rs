use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChpFleetError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ChpFleetError {
    fn from(e: serde_json::Error) -> Self {
        ChpFleetError::SerializationError(e.to_string())
    }
}
