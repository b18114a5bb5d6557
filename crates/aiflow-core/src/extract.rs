//! Pull a JSON object out of a free-text model response.

use std::sync::LazyLock;

use regex::Regex;

/// Stored in place of JSON when the response contains no braces at all.
pub const NOT_JSON: &str = "The content is not in JSON format";

/// Greedy: spans from the first `{` to the last `}`, across newlines.
static JSON_OBJECT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

/// Outcome of looking for JSON in a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
  /// The object, re-serialised with two-space indentation.
  Json(String),
  /// Braces were found but the enclosed text did not parse.
  DecodeError(String),
  /// No brace-delimited span in the response.
  NotJson,
}

impl Extraction {
  /// The text persisted in a query's `ai_response_json` field.
  pub fn into_stored(self) -> String {
    match self {
      Self::Json(s) => s,
      Self::DecodeError(e) => format!("Error on decode JSON: {e}"),
      Self::NotJson => NOT_JSON.to_owned(),
    }
  }

  pub fn is_json(&self) -> bool { matches!(self, Self::Json(_)) }
}

pub fn extract_json(response: &str) -> Extraction {
  let Some(m) = JSON_OBJECT.find(response) else {
    return Extraction::NotJson;
  };

  match serde_json::from_str::<serde_json::Value>(m.as_str()) {
    Ok(value) => match serde_json::to_string_pretty(&value) {
      Ok(pretty) => Extraction::Json(pretty),
      Err(e) => Extraction::DecodeError(e.to_string()),
    },
    Err(e) => Extraction::DecodeError(e.to_string()),
  }
}
