//! OpenAI chat-completions client implementing [`aiflow_core::model::ChatModel`].

mod client;
pub mod error;

pub use client::{OpenAiClient, OpenAiConfig};
pub use error::{Error, Result};
