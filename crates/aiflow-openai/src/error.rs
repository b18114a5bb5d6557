use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("chat completion failed with status {status}: {body}")]
  Status { status: u16, body: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
