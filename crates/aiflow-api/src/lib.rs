//! JSON-over-HTTP surface for the AI workflows.
//!
//! Exposes an axum [`Router`] backed by any [`ErpStore`] and [`ChatModel`].
//! Every route requires HTTP Basic auth for the single configured user.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/api/method/call_ai` | [`rpc::call_ai`] |
//! | `POST` | `/api/method/create_supplier` | [`rpc::create_supplier`] |
//! | `POST` | `/api/method/create_purchase_invoice` | [`rpc::create_purchase_invoice`] |
//! | `POST` | `/api/hooks/purchase-invoice/{name}/{submit\|cancel}` | [`hooks::purchase_invoice`] |
//! | `PUT`/`GET` | `/api/resource/{ai,ai-prompt,source-document}/{name}` | [`records`] |
//! | `PUT` | `/api/resource/tax-template/{name}` | [`records::put_tax_template`] |
//! | `GET` | `/api/resource/{ai-query,supplier,purchase-invoice}/{name}` | [`records`] |

pub mod auth;
pub mod error;
pub mod extract;
pub mod hooks;
pub mod records;
pub mod rpc;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use aiflow_core::{model::ChatModel, payment::PaymentTermMapping, store::ErpStore};
use aiflow_openai::OpenAiConfig;
use aiflow_workflows::{
  Settings, Workflows,
  settings::{DEFAULT_ITEM_GROUP, DEFAULT_STOCK_UOM},
};
use axum::{
  Router,
  routing::{get, post, put},
};
use serde::Deserialize;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AIFLOW__*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  /// Public URL used in links returned to callers.
  #[serde(default = "default_base_url")]
  pub base_url:            String,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  pub auth_username:       String,
  pub auth_password_hash:  String,
  #[serde(default)]
  pub openai:              OpenAiConfig,
  #[serde(default)]
  pub document_server_url: Option<String>,
  #[serde(default = "default_item_group")]
  pub item_group:          String,
  #[serde(default = "default_stock_uom")]
  pub stock_uom:           String,
  #[serde(default)]
  pub payment_terms:       Vec<PaymentTermMapping>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_base_url() -> String { "http://localhost:8080".to_string() }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/aiflow/aiflow.db") }
fn default_item_group() -> String { DEFAULT_ITEM_GROUP.to_string() }
fn default_stock_uom() -> String { DEFAULT_STOCK_UOM.to_string() }

impl ServerConfig {
  /// The workflow settings carried by this configuration.
  pub fn settings(&self) -> Settings {
    Settings {
      base_url:            self.base_url.clone(),
      document_server_url: self.document_server_url.clone(),
      item_group:          self.item_group.clone(),
      stock_uom:           self.stock_uom.clone(),
      payment_terms:       self.payment_terms.clone(),
    }
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, M> {
  pub workflows: Workflows<S, M>,
  pub auth:      Arc<AuthConfig>,
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self { workflows: self.workflows.clone(), auth: self.auth.clone() }
  }
}

impl<S, M> AppState<S, M>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  pub fn new(workflows: Workflows<S, M>, auth: AuthConfig) -> Self {
    Self { workflows, auth: Arc::new(auth) }
  }

  pub fn store(&self) -> &S { self.workflows.store() }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  Router::new()
    // RPC
    .route("/api/method/call_ai", post(rpc::call_ai::<S, M>))
    .route("/api/method/create_supplier", post(rpc::create_supplier::<S, M>))
    .route(
      "/api/method/create_purchase_invoice",
      post(rpc::create_purchase_invoice::<S, M>),
    )
    // Document events
    .route(
      "/api/hooks/purchase-invoice/{name}/{event}",
      post(hooks::purchase_invoice::<S, M>),
    )
    // Records
    .route(
      "/api/resource/ai/{name}",
      get(records::get_ai::<S, M>).put(records::put_ai::<S, M>),
    )
    .route(
      "/api/resource/ai-prompt/{name}",
      get(records::get_prompt::<S, M>).put(records::put_prompt::<S, M>),
    )
    .route(
      "/api/resource/source-document/{name}",
      get(records::get_source_document::<S, M>).put(records::put_source_document::<S, M>),
    )
    .route("/api/resource/tax-template/{name}", put(records::put_tax_template::<S, M>))
    .route("/api/resource/ai-query/{name}", get(records::get_query::<S, M>))
    .route("/api/resource/supplier/{name}", get(records::get_supplier::<S, M>))
    .route(
      "/api/resource/purchase-invoice/{name}",
      get(records::get_purchase_invoice::<S, M>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
