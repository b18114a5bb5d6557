//! Error types for `aiflow-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A key the workflow cannot proceed without is absent from the AI payload.
  #[error("{0}")]
  MissingField(String),

  #[error("invalid number {value:?} for {field}")]
  InvalidNumber { field: &'static str, value: String },

  #[error("unknown document status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown docstatus: {0}")]
  UnknownDocStatus(i64),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
