//! Handlers for the `/api/method/*` endpoints.
//!
//! Each response is the workflow outcome with a top-level `message` key
//! added, e.g. `{"status":"completed","message":"AI query successful…",…}`.

use aiflow_core::{model::ChatModel, store::ErpStore};
use aiflow_workflows::{QueryDocument, SourceDocumentPayload};
use axum::extract::State;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::Json,
};

/// Accept `T` either as a JSON object or as a string holding its JSON
/// encoding.
fn object_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  match Value::deserialize(deserializer)? {
    Value::String(s) => serde_json::from_str(&s).map_err(serde::de::Error::custom),
    other => serde_json::from_value(other).map_err(serde::de::Error::custom),
  }
}

/// Accept a boolean, `"true"`/`"false"`, or `0`/`1`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
  }

  match Flag::deserialize(deserializer)? {
    Flag::Bool(b) => Ok(b),
    Flag::Int(i) => Ok(i != 0),
    Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
      "true" | "1" => Ok(true),
      "false" | "0" | "" => Ok(false),
      other => Err(serde::de::Error::custom(format!("invalid flag: {other}"))),
    },
  }
}

fn default_background() -> bool { true }

fn with_message<T: Serialize>(message: String, outcome: &T) -> Result<Json<Value>, ApiError> {
  let mut body = serde_json::to_value(outcome)?;
  if let Value::Object(map) = &mut body {
    map.insert("message".to_owned(), Value::String(message));
  }
  Ok(Json(body))
}

// ─── call_ai ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallAiBody {
  pub ai:         String,
  pub prompt:     String,
  #[serde(deserialize_with = "object_or_string")]
  pub doc:        SourceDocumentPayload,
  #[serde(default = "default_background", deserialize_with = "flag")]
  pub background: bool,
}

/// `POST /api/method/call_ai`
pub async fn call_ai<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Json(body): Json<CallAiBody>,
) -> Result<Json<Value>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let outcome = state
    .workflows
    .call_ai(&body.ai, &body.prompt, body.doc, body.background)
    .await?;
  with_message(outcome.message(), &outcome)
}

// ─── create_supplier / create_purchase_invoice ───────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryBody {
  #[serde(deserialize_with = "object_or_string")]
  pub doc: QueryDocument,
}

/// `POST /api/method/create_supplier`
pub async fn create_supplier<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Json(body): Json<QueryBody>,
) -> Result<Json<Value>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let outcome = state.workflows.create_supplier(&body.doc).await?;
  with_message(outcome.message().to_owned(), &outcome)
}

/// `POST /api/method/create_purchase_invoice`
pub async fn create_purchase_invoice<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Json(body): Json<QueryBody>,
) -> Result<Json<Value>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let outcome = state.workflows.create_purchase_invoice(&body.doc).await?;
  with_message(outcome.message(), &outcome)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn doc_accepts_object_or_encoded_string() {
    let as_object: CallAiBody = serde_json::from_value(json!({
      "ai": "gpt", "prompt": "invoice", "doc": { "name": "DOC-1" }
    }))
    .unwrap();
    let as_string: CallAiBody = serde_json::from_value(json!({
      "ai": "gpt", "prompt": "invoice", "doc": "{\"name\": \"DOC-1\"}"
    }))
    .unwrap();
    assert_eq!(as_object.doc.name, "DOC-1");
    assert_eq!(as_string.doc.name, "DOC-1");
  }

  #[test]
  fn background_defaults_on_and_accepts_strings() {
    let body: CallAiBody = serde_json::from_value(json!({
      "ai": "gpt", "prompt": "invoice", "doc": { "name": "DOC-1" }
    }))
    .unwrap();
    assert!(body.background);

    let body: CallAiBody = serde_json::from_value(json!({
      "ai": "gpt", "prompt": "invoice", "doc": { "name": "DOC-1" }, "background": "false"
    }))
    .unwrap();
    assert!(!body.background);

    let err = serde_json::from_value::<CallAiBody>(json!({
      "ai": "gpt", "prompt": "invoice", "doc": { "name": "DOC-1" }, "background": "later"
    }));
    assert!(err.is_err());
  }
}
