//! Handlers for `/api/resource/*`: maintaining the records the workflows
//! read, and reading back the ones they write.
//!
//! `PUT` bodies take their `name` from the path; a `name` in the body is
//! overwritten.

use aiflow_core::{
  invoice::{PurchaseInvoice, TaxTemplate},
  model::ChatModel,
  party::Supplier,
  record::{AiConfig, AiInterface, AiPrompt, AiQuery, SourceDocument},
  store::ErpStore,
};
use axum::extract::State;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  extract::{Json, Path},
};

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> ApiError {
  ApiError::Store(Box::new(e))
}

fn not_found(doctype: &str, name: &str) -> ApiError {
  ApiError::NotFound(format!("{doctype} '{name}' does not exist."))
}

/// Deserialize a `PUT` body as `T`, with `name` taken from the path.
fn named<T: DeserializeOwned>(name: &str, mut body: Value) -> Result<T, ApiError> {
  let Value::Object(map) = &mut body else {
    return Err(ApiError::BadRequest("expected a JSON object".to_owned()));
  };
  map.insert("name".to_owned(), Value::String(name.to_owned()));
  serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ─── AI ───────────────────────────────────────────────────────────────────────

/// An AI config as returned to callers: the API key is never echoed.
#[derive(Debug, Serialize)]
pub struct AiView {
  pub name:      String,
  pub interface: AiInterface,
}

impl From<AiConfig> for AiView {
  fn from(ai: AiConfig) -> Self { Self { name: ai.name, interface: ai.interface } }
}

/// `PUT /api/resource/ai/{name}`, body: `{"api_key":"…","interface":"openAI"}`
pub async fn put_ai<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
  Json(body): Json<Value>,
) -> Result<Json<AiView>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let ai: AiConfig = named(&name, body)?;
  state.store().upsert_ai(ai.clone()).await.map_err(store_err)?;
  tracing::info!(ai = %name, "AI config saved");
  Ok(Json(ai.into()))
}

/// `GET /api/resource/ai/{name}`
pub async fn get_ai<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
) -> Result<Json<AiView>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let ai = state
    .store()
    .get_ai(&name)
    .await
    .map_err(store_err)?
    .ok_or_else(|| not_found("AI", &name))?;
  Ok(Json(ai.into()))
}

// ─── Prompts ──────────────────────────────────────────────────────────────────

/// `PUT /api/resource/ai-prompt/{name}`
pub async fn put_prompt<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
  Json(body): Json<Value>,
) -> Result<Json<AiPrompt>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let prompt: AiPrompt = named(&name, body)?;
  state.store().upsert_prompt(prompt.clone()).await.map_err(store_err)?;
  Ok(Json(prompt))
}

/// `GET /api/resource/ai-prompt/{name}`
pub async fn get_prompt<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
) -> Result<Json<AiPrompt>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  state
    .store()
    .get_prompt(&name)
    .await
    .map_err(store_err)?
    .map(Json)
    .ok_or_else(|| not_found("AI Prompt", &name))
}

// ─── Source documents ─────────────────────────────────────────────────────────

/// `PUT /api/resource/source-document/{name}`
pub async fn put_source_document<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
  Json(body): Json<Value>,
) -> Result<Json<SourceDocument>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let doc: SourceDocument = named(&name, body)?;
  state
    .store()
    .upsert_source_document(doc.clone())
    .await
    .map_err(store_err)?;
  Ok(Json(doc))
}

/// `GET /api/resource/source-document/{name}`
pub async fn get_source_document<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
) -> Result<Json<SourceDocument>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  state
    .store()
    .get_source_document(&name)
    .await
    .map_err(store_err)?
    .map(Json)
    .ok_or_else(|| not_found("Source Document", &name))
}

// ─── Tax templates ────────────────────────────────────────────────────────────

/// `PUT /api/resource/tax-template/{name}`
pub async fn put_tax_template<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
  Json(body): Json<Value>,
) -> Result<Json<TaxTemplate>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  let template: TaxTemplate = named(&name, body)?;
  state
    .store()
    .upsert_tax_template(template.clone())
    .await
    .map_err(store_err)?;
  Ok(Json(template))
}

// ─── Read-back ────────────────────────────────────────────────────────────────

/// `GET /api/resource/ai-query/{name}`
pub async fn get_query<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
) -> Result<Json<AiQuery>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  state
    .store()
    .get_query(&name)
    .await
    .map_err(store_err)?
    .map(Json)
    .ok_or_else(|| not_found("AI Query", &name))
}

/// `GET /api/resource/supplier/{name}`
pub async fn get_supplier<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
) -> Result<Json<Supplier>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  state
    .store()
    .get_supplier(&name)
    .await
    .map_err(store_err)?
    .map(Json)
    .ok_or_else(|| not_found("Supplier", &name))
}

/// `GET /api/resource/purchase-invoice/{name}`
pub async fn get_purchase_invoice<S, M>(
  _: Authenticated,
  State(state): State<AppState<S, M>>,
  Path(name): Path<String>,
) -> Result<Json<PurchaseInvoice>, ApiError>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  state
    .store()
    .get_purchase_invoice(&name)
    .await
    .map_err(store_err)?
    .map(Json)
    .ok_or_else(|| not_found("Purchase Invoice", &name))
}
