//! Router tests against an in-memory SQLite store and a canned model.

use std::{convert::Infallible, sync::Arc};

use aiflow_core::{
  model::{ChatModel, FunctionSpec},
  payment::PaymentTermMapping,
};
use aiflow_store_sqlite::SqliteStore;
use aiflow_workflows::{Settings, Workflows};
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, auth::AuthConfig, router};

/// Answers every prompt with the same text.
struct CannedModel(String);

impl ChatModel for CannedModel {
  type Error = Infallible;

  async fn chat(&self, _api_key: &str, _prompt: &str) -> Result<Option<String>, Infallible> {
    Ok(Some(self.0.clone()))
  }

  async fn call_function(
    &self,
    _api_key: &str,
    _prompt: &str,
    _function: &FunctionSpec,
  ) -> Result<Option<String>, Infallible> {
    Ok(Some(self.0.clone()))
  }
}

fn invoice_json() -> Value {
  json!({
    "InvoiceDetails": {
      "InvoiceNumber": "4711",
      "InvoiceDate": "2024-03-01",
      "SupplierName": "ACME GmbH",
      "SupplierUstId": "DE123",
      "SupplierAddress": {
        "Street": "Hauptstr. 1",
        "City": "Berlin",
        "PostalCode": "10115",
        "Country": "DE"
      },
      "SupplierContactPerson": "Ada Lovelace"
    },
    "ItemsPurchased": {
      "ItemList": [
        { "ItemNumber": "A-1", "ItemName": "Widget", "Quantity": 2, "UnitPrice": 10, "Total": 18 },
        { "ItemNumber": "B-2", "ItemName": "Gadget", "Quantity": 1, "UnitPrice": 5.5, "Total": 5.5 }
      ]
    },
    "PaymentInformation": {
      "PaymentDueDate": "2024-03-31",
      "PaymentMethod": "Bank Transfer"
    }
  })
}

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let settings = Settings {
    base_url: "https://erp.example.com".into(),
    payment_terms: vec![PaymentTermMapping {
      method: "Bank Transfer".into(),
      term:   "Net 14".into(),
    }],
    ..Settings::default()
  };
  let model = CannedModel(invoice_json().to_string());
  let workflows = Workflows::new(Arc::new(store), Arc::new(model), settings);

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string();
  router(AppState::new(workflows, AuthConfig {
    username:      "erp".into(),
    password_hash: hash,
  }))
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
  let builder = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("erp:secret")));
  match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, body)
}

async fn seed(app: &Router) {
  let (status, _) = send(app, request(
    Method::PUT,
    "/api/resource/ai/gpt",
    Some(json!({ "api_key": "sk-test", "interface": "openAI" })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(app, request(
    Method::PUT,
    "/api/resource/ai-prompt/invoice",
    Some(json!({
      "text": "Extract the invoice.",
      "output_mode": "Structured Output (JSON)",
      "json_schema": { "type": "object" },
      "for_doctype": "Purchase Invoice"
    })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(app, request(
    Method::PUT,
    "/api/resource/source-document/DOC-1",
    Some(json!({ "fulltext": "Invoice 4711 from ACME", "external_id": 42 })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(app, request(
    Method::PUT,
    "/api/resource/tax-template/VAT%2020",
    Some(json!({
      "is_default": true,
      "rows": [{
        "charge_type": "On Net Total",
        "account_head": "VAT",
        "description": "VAT 20%",
        "rate": 20.0
      }]
    })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);
}

// ─── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
  let app = app().await;
  let req = Request::builder()
    .uri("/api/resource/ai/gpt")
    .body(Body::empty())
    .unwrap();
  let res = app.oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
}

// ─── Records ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ai_config_never_echoes_the_api_key() {
  let app = app().await;
  seed(&app).await;

  let (status, body) = send(&app, request(Method::GET, "/api/resource/ai/gpt", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "name": "gpt", "interface": "openAI" }));
}

#[tokio::test]
async fn missing_record_is_404() {
  let app = app().await;
  let (status, body) =
    send(&app, request(Method::GET, "/api/resource/supplier/SUP-09999", None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Supplier 'SUP-09999' does not exist.");
}

#[tokio::test]
async fn put_rejects_non_object_bodies() {
  let app = app().await;
  let (status, _) = send(&app, request(
    Method::PUT,
    "/api/resource/ai/gpt",
    Some(json!(["not", "an", "object"])),
  ))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── RPC ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_ai_is_a_message() {
  let app = app().await;
  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/call_ai",
    Some(json!({ "ai": "missing", "prompt": "invoice", "doc": { "name": "DOC-1" } })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "not_found");
  assert_eq!(body["message"], "AI not found!");
}

#[tokio::test]
async fn background_call_returns_a_job_id() {
  let app = app().await;
  seed(&app).await;
  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/call_ai",
    Some(json!({ "ai": "gpt", "prompt": "invoice", "doc": "{\"name\": \"DOC-1\"}" })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "enqueued");
  assert_eq!(body["message"], body["job_id"]);
}

#[tokio::test]
async fn supplier_from_non_json_response_is_a_message() {
  let app = app().await;
  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/create_supplier",
    Some(json!({ "doc": { "name": "AIQ-00001", "ai_response_json": "The content is not in JSON format" } })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "invalid_json");
  assert_eq!(body["message"], "Invalid JSON format");
}

#[tokio::test]
async fn invoice_without_supplier_is_unprocessable() {
  let app = app().await;
  let response = invoice_json().to_string();
  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/create_purchase_invoice",
    Some(json!({ "doc": { "name": "AIQ-00001", "ai_response_json": response } })),
  ))
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["error"], "Supplier name is missing in the request.");
}

// ─── Hooks ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn hook_for_unknown_invoice_is_404() {
  let app = app().await;
  let (status, _) = send(
    &app,
    request(Method::POST, "/api/hooks/purchase-invoice/PINV-09999/submit", None),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hook_rejects_unknown_events() {
  let app = app().await;
  let (status, body) = send(
    &app,
    request(Method::POST, "/api/hooks/purchase-invoice/PINV-00001/approve", None),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn malformed_body_is_a_json_error() {
  let app = app().await;
  let req = Request::builder()
    .method(Method::POST)
    .uri("/api/method/call_ai")
    .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("erp:secret")))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/call_ai",
    Some(json!({ "prompt": "invoice", "doc": { "name": "DOC-1" } })),
  ))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().is_some_and(|e| e.contains("ai")));
}

// ─── End to end ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn document_to_submitted_invoice() {
  let app = app().await;
  seed(&app).await;

  // Run the prompt synchronously.
  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/call_ai",
    Some(json!({ "ai": "gpt", "prompt": "invoice", "doc": { "name": "DOC-1" }, "background": false })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "completed");
  assert_eq!(
    body["message"],
    "AI query successful. Check out response: https://erp.example.com/app/ai-query/AIQ-00001"
  );
  assert_eq!(body["query"]["effective_prompt"], "Extract the invoice.\n\nInvoice 4711 from ACME");

  let (_, source) =
    send(&app, request(Method::GET, "/api/resource/source-document/DOC-1", None)).await;
  assert_eq!(source["status"], "AI-Response-Received");

  // Resolve the supplier from the stored query.
  let (status, query) =
    send(&app, request(Method::GET, "/api/resource/ai-query/AIQ-00001", None)).await;
  assert_eq!(status, StatusCode::OK);
  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/create_supplier",
    Some(json!({ "doc": query.to_string() })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "created");
  assert_eq!(body["message"], "Supplier created successfully");
  assert_eq!(body["supplier"]["supplier_name"], "ACME GmbH");

  // Build the invoice from the query, now linked to the supplier.
  let (_, query) =
    send(&app, request(Method::GET, "/api/resource/ai-query/AIQ-00001", None)).await;
  let supplier = query["supplier"].as_str().unwrap().to_owned();
  let (status, body) = send(&app, request(
    Method::POST,
    "/api/method/create_purchase_invoice",
    Some(json!({ "doc": query })),
  ))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "created");
  let invoice = body["message"].as_str().unwrap().to_owned();
  assert_eq!(body["invoice"]["name"], invoice.as_str());
  assert_eq!(body["invoice"]["supplier"], supplier.as_str());
  assert_eq!(body["invoice"]["grand_total"], json!(28.2));

  // A second run finds the live invoice.
  let (_, again) = send(&app, request(
    Method::POST,
    "/api/method/create_purchase_invoice",
    Some(json!({ "doc": query })),
  ))
  .await;
  assert_eq!(again["status"], "duplicate");

  // Submitting advances the source document.
  let uri = format!("/api/hooks/purchase-invoice/{invoice}/submit");
  let (status, body) = send(&app, request(Method::POST, &uri, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["docstatus"], "submitted");
  assert_eq!(body["source_document"], "DOC-1");
  assert_eq!(body["status"], "Workflow-Successful");

  let (_, source) =
    send(&app, request(Method::GET, "/api/resource/source-document/DOC-1", None)).await;
  assert_eq!(source["status"], "Workflow-Successful");

  // A submitted invoice cannot be submitted again.
  let (status, body) = send(&app, request(Method::POST, &uri, None)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(
    body["error"],
    format!("Purchase Invoice '{invoice}' is submitted; it cannot become submitted.")
  );
}
