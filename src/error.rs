use thiserror::Error;

use crate::models::AgentRole;

/// Field-level failures caught before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("mobile number must be exactly 10 digits, got {value:?}")]
    MalformedMobile { value: String },

    #[error("ward {ward} is outside 1..={max} for this panchayath")]
    WardOutOfRange { ward: i32, max: i32 },

    #[error("rating {rating} is outside 1..=5")]
    RatingOutOfRange { rating: i32 },
}

/// Everything that can abort an agent-record submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("mobile number already registered in {table}")]
    DuplicateMobile { table: AgentRole },

    #[error("ward already assigned in this panchayath")]
    WardTaken,

    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
}
