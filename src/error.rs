use crate::phases::PhaseError;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
  #[error("{0}")]
  Validation(String),

  #[error("{0} not found")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("Invalid phase order: {0}")]
  Phase(#[from] PhaseError),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Failed to encode phases: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl StudioError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn not_found(what: impl Into<String>) -> Self {
    Self::NotFound(what.into())
  }

  /// Caller-side mistakes, as opposed to storage failures.
  pub fn is_client_error(&self) -> bool {
    !matches!(self, Self::Database(_) | Self::Serialization(_))
  }
}

pub type StudioResult<T> = Result<T, StudioError>;
