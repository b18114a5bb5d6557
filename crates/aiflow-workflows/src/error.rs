//! Error types for `aiflow-workflows`.

use aiflow_core::invoice::DocStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{doctype} '{name}' does not exist.")]
  NotFound { doctype: &'static str, name: String },

  #[error("Invalid JSON format")]
  InvalidJson,

  /// A value the workflow cannot proceed without is absent.
  #[error("{0}")]
  MissingField(String),

  /// The invoice is not in the state the event moves it out of.
  #[error("Purchase Invoice '{invoice}' is {current}; it cannot become {requested}.")]
  InvalidTransition {
    invoice:   String,
    current:   DocStatus,
    requested: DocStatus,
  },

  #[error("no payment term matches payment method {0:?}")]
  UnmatchedPaymentTerm(String),

  #[error("unsupported AI interface: {0}")]
  UnsupportedInterface(String),

  #[error("LLM error: {0}")]
  Llm(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Core(aiflow_core::Error),
}

impl From<aiflow_core::Error> for Error {
  fn from(e: aiflow_core::Error) -> Self {
    match e {
      aiflow_core::Error::MissingField(m) => Self::MissingField(m),
      other => Self::Core(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
