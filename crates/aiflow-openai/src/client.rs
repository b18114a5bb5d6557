//! Async HTTP client for an OpenAI-compatible `/chat/completions` endpoint.

use std::time::Duration;

use aiflow_core::model::{ChatModel, FunctionSpec};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_base_url() -> String { "https://api.openai.com/v1".to_owned() }
fn default_chat_model() -> String { "chatgpt-4o-latest".to_owned() }
fn default_structured_model() -> String { "gpt-4o-2024-08-06".to_owned() }
fn default_timeout_secs() -> u64 { 120 }

/// Endpoint and model settings. The API key travels per call, since it is
/// stored on the AI config record rather than in server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
  #[serde(default = "default_base_url")]
  pub base_url:         String,
  /// Model for plain chat prompts.
  #[serde(default = "default_chat_model")]
  pub chat_model:       String,
  /// Model for schema-constrained function calls.
  #[serde(default = "default_structured_model")]
  pub structured_model: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:     u64,
}

impl Default for OpenAiConfig {
  fn default() -> Self {
    Self {
      base_url:         default_base_url(),
      chat_model:       default_chat_model(),
      structured_model: default_structured_model(),
      timeout_secs:     default_timeout_secs(),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model:         &'a str,
  messages:      Vec<ChatMessage<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  functions:     Option<Vec<FunctionDef<'a>>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  function_call: Option<FunctionChoice<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Debug, Serialize)]
struct FunctionDef<'a> {
  name:        &'a str,
  description: &'a str,
  parameters:  &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct FunctionChoice<'a> {
  name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
  #[serde(default)]
  content:       Option<String>,
  #[serde(default)]
  function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
  #[serde(default)]
  arguments: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Chat-completions client.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client: Client,
  config: OpenAiConfig,
}

impl OpenAiClient {
  pub fn new(config: OpenAiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &OpenAiConfig { &self.config }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  async fn complete(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<ChatResponse> {
    tracing::debug!(model = request.model, "sending chat completion");

    let resp = self
      .client
      .post(self.url())
      .bearer_auth(api_key)
      .json(request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      tracing::warn!(status = status.as_u16(), "chat completion rejected");
      return Err(Error::Status { status: status.as_u16(), body });
    }
    Ok(resp.json().await?)
  }
}

impl ChatModel for OpenAiClient {
  type Error = Error;

  async fn chat(&self, api_key: &str, prompt: &str) -> Result<Option<String>> {
    let request = ChatRequest {
      model:         &self.config.chat_model,
      messages:      vec![ChatMessage { role: "user", content: prompt }],
      functions:     None,
      function_call: None,
    };
    let response = self.complete(api_key, &request).await?;
    Ok(response.choices.into_iter().next().and_then(|c| c.message.content))
  }

  async fn call_function(
    &self,
    api_key:  &str,
    prompt:   &str,
    function: &FunctionSpec,
  ) -> Result<Option<String>> {
    let request = ChatRequest {
      model:         &self.config.structured_model,
      messages:      vec![
        ChatMessage { role: "system", content: &function.system },
        ChatMessage { role: "user", content: prompt },
      ],
      functions:     Some(vec![FunctionDef {
        name:        &function.name,
        description: &function.description,
        parameters:  &function.parameters,
      }]),
      function_call: Some(FunctionChoice { name: &function.name }),
    };
    let response = self.complete(api_key, &request).await?;
    Ok(
      response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.function_call)
        .map(|f| f.arguments),
    )
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
  };

  use super::*;

  fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(OpenAiConfig {
      base_url: server.uri(),
      ..OpenAiConfig::default()
    })
    .unwrap()
  }

  fn invoice_function() -> FunctionSpec {
    FunctionSpec {
      system:      "You are a wizard.".into(),
      name:        "generate_invoice".into(),
      description: "Generates an invoice.".into(),
      parameters:  json!({ "type": "object" }),
    }
  }

  #[tokio::test]
  async fn chat_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(header("authorization", "Bearer sk-test"))
      .and(body_partial_json(json!({ "model": "chatgpt-4o-latest" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let reply = client(&server).chat("sk-test", "hi").await.unwrap();
    assert_eq!(reply.as_deref(), Some("hello"));
  }

  #[tokio::test]
  async fn function_call_returns_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .and(body_partial_json(json!({
        "model": "gpt-4o-2024-08-06",
        "function_call": { "name": "generate_invoice" }
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": {
          "role": "assistant",
          "content": null,
          "function_call": { "name": "generate_invoice", "arguments": "{\"a\":1}" }
        } }]
      })))
      .mount(&server)
      .await;

    let args = client(&server)
      .call_function("sk-test", "extract", &invoice_function())
      .await
      .unwrap();
    assert_eq!(args.as_deref(), Some("{\"a\":1}"));
  }

  #[tokio::test]
  async fn no_choices_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
      .mount(&server)
      .await;

    let c = client(&server);
    assert!(c.chat("sk", "hi").await.unwrap().is_none());
    assert!(c.call_function("sk", "hi", &invoice_function()).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
      .mount(&server)
      .await;

    let err = client(&server).chat("sk", "hi").await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 401, ref body } if body == "bad key"));
  }
}
