use thiserror::Error;

/// Errors surfaced by the linker core.
///
/// Matching itself never fails: degraded inputs (empty names, unparsable
/// kickoff tokens, empty fixture sets) produce low scores instead. Errors come
/// from configuration, alias mutations and the backing alias store.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    #[error("Alias store error: {0}")]
    Store(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
