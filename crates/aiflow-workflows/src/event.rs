//! Realtime events published by background jobs.

use serde::Serialize;
use uuid::Uuid;

pub const MSGPRINT_END: &str = "msgprint_end";
pub const JOB_FAILED: &str = "job_failed";

#[derive(Debug, Clone, Serialize)]
pub struct Event {
  /// Event name, e.g. [`MSGPRINT_END`].
  pub event:   &'static str,
  pub message: String,
  pub job_id:  Option<Uuid>,
}

impl Event {
  pub fn response_received(job_id: Uuid) -> Self {
    Self {
      event:   MSGPRINT_END,
      message: "Response received successfully, fields updated!".to_owned(),
      job_id:  Some(job_id),
    }
  }

  pub fn job_failed(job_id: Uuid, error: &impl std::fmt::Display) -> Self {
    Self {
      event:   JOB_FAILED,
      message: error.to_string(),
      job_id:  Some(job_id),
    }
  }
}
