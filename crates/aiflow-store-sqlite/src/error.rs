//! Error type for `aiflow-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] aiflow_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An update addressed a record that does not exist.
  #[error("{doctype} not found: {name}")]
  NotFound { doctype: &'static str, name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
