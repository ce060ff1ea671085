use thiserror::Error;

/// Transport-level failure of a vote submission (the call itself failed).
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("vote service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("please select an option")]
    MissingOption,
    #[error("option {0} is not part of this poll")]
    UnknownOption(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid poll fixture: {0}")]
    Fixture(#[from] serde_json::Error),
    #[error("invalid timestamp {0}")]
    InvalidTimestamp(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("RESULTS_DELAY_MS must be a whole number of milliseconds, got {0:?}")]
    InvalidDelay(String),
}
