//! The `ChatModel` trait: the seam between workflows and an LLM provider.
//!
//! Implemented by `aiflow-openai`; tests substitute a scripted model.

use std::future::Future;

/// A function the model is forced to call, whose arguments carry the
/// structured answer.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
  /// System message sent ahead of the prompt.
  pub system:      String,
  pub name:        String,
  pub description: String,
  /// JSON schema of the function's parameters.
  pub parameters:  serde_json::Value,
}

/// Abstraction over a chat-completion provider.
///
/// Both methods return `Ok(None)` when the provider answered but produced no
/// usable content (no choices, or no function call).
pub trait ChatModel: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Send `prompt` as a single user message; return the reply text.
  fn chat<'a>(
    &'a self,
    api_key: &'a str,
    prompt: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Force a call to `function`; return the raw JSON arguments string.
  fn call_function<'a>(
    &'a self,
    api_key: &'a str,
    prompt: &'a str,
    function: &'a FunctionSpec,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;
}
