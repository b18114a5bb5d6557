//! Documents handed to the workflows by callers.

use aiflow_core::record::AiQuery;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The source document a prompt runs against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocumentPayload {
  pub name:              String,
  /// Document text. When absent, the stored source document's text is used.
  #[serde(default)]
  pub document_fulltext: Option<String>,
}

/// A query record as sent by the caller, carrying the model's JSON answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryDocument {
  #[serde(default)]
  pub name:             String,
  /// Supplier already linked to the query.
  #[serde(default)]
  pub supplier:         Option<String>,
  #[serde(default)]
  pub source_doc:       Option<String>,
  /// Must be a string holding JSON; anything else is rejected.
  #[serde(default)]
  pub ai_response_json: Option<Value>,
}

impl QueryDocument {
  /// The parsed response JSON, or `None` when it is missing, not a string, or
  /// not valid JSON.
  pub fn response_json(&self) -> Option<Value> {
    match &self.ai_response_json {
      Some(Value::String(s)) => serde_json::from_str(s).ok(),
      _ => None,
    }
  }
}

impl From<&AiQuery> for QueryDocument {
  fn from(q: &AiQuery) -> Self {
    Self {
      name:             q.name.clone(),
      supplier:         q.supplier.clone(),
      source_doc:       Some(q.source_doc.clone()),
      ai_response_json: Some(Value::String(q.ai_response_json.clone())),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn response_json_requires_a_json_string() {
    let mut doc = QueryDocument {
      ai_response_json: Some(json!("{\"a\": 1}")),
      ..Default::default()
    };
    assert_eq!(doc.response_json(), Some(json!({ "a": 1 })));

    doc.ai_response_json = Some(json!({ "a": 1 }));
    assert!(doc.response_json().is_none());

    doc.ai_response_json = Some(json!("The content is not in JSON format"));
    assert!(doc.response_json().is_none());

    doc.ai_response_json = None;
    assert!(doc.response_json().is_none());
  }
}
