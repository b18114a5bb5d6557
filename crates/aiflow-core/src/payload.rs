//! The invoice JSON the model is prompted to return.
//!
//! Every field is optional: the model's output is only loosely constrained,
//! so presence is checked by the workflow that needs a field, not here.
//! Scalars are accepted leniently, since models emit `"2"` as readily as `2`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoicePayload {
  #[serde(default)]
  pub invoice_details:     Option<InvoiceDetails>,
  #[serde(default)]
  pub items_purchased:     Option<ItemsPurchased>,
  #[serde(default)]
  pub payment_information: Option<PaymentInformation>,
}

impl InvoicePayload {
  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceDetails {
  #[serde(default, deserialize_with = "text")]
  pub invoice_number:         Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub invoice_date:           Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub supplier_name:          Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub supplier_ust_id:        Option<String>,
  #[serde(default)]
  pub supplier_address:       Option<SupplierAddress>,
  #[serde(default, deserialize_with = "text")]
  pub supplier_contact_person: Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub supplier_contact_phone: Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub supplier_contact_email: Option<String>,
}

impl InvoiceDetails {
  /// Read only the `InvoiceDetails` key of a model response. An absent key,
  /// `null` or `{}` yields `None`; any other object is parsed, even one with
  /// no recognised keys.
  pub fn from_response(json: &Value) -> Result<Option<Self>> {
    match json.get("InvoiceDetails") {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Object(map)) if map.is_empty() => Ok(None),
      Some(details) => Ok(Some(Self::deserialize(details)?)),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SupplierAddress {
  #[serde(default, deserialize_with = "text")]
  pub street:      Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub city:        Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub postal_code: Option<String>,
  /// Two-letter ISO country code.
  #[serde(default, deserialize_with = "text")]
  pub country:     Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsPurchased {
  #[serde(default)]
  pub item_list: Vec<PurchasedItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PurchasedItem {
  /// The supplier's item code.
  #[serde(default, deserialize_with = "text")]
  pub item_number: Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub item_name:   Option<String>,
  #[serde(default, deserialize_with = "text")]
  pub description: Option<String>,
  #[serde(default, deserialize_with = "number")]
  pub quantity:    Option<f64>,
  #[serde(default, deserialize_with = "number")]
  pub unit_price:  Option<f64>,
  #[serde(default, deserialize_with = "number")]
  pub total:       Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentInformation {
  #[serde(default, deserialize_with = "text")]
  pub payment_due_date: Option<String>,
  /// Free text such as `"Bank transfer"` or `"SEPA-Lastschrift"`.
  #[serde(default, deserialize_with = "text")]
  pub payment_method:   Option<String>,
}

/// Return the value or a [`Error::MissingField`] carrying `message`.
pub fn require<T>(value: Option<T>, message: impl Into<String>) -> Result<T> {
  value.ok_or_else(|| Error::MissingField(message.into()))
}

// ─── Lenient scalars ─────────────────────────────────────────────────────────

/// Strings pass through; numbers and booleans are stringified; `null` and
/// blank strings become `None`.
fn text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(de)?;
  Ok(match value {
    Value::String(s) if s.trim().is_empty() => None,
    Value::String(s) => Some(s),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  })
}

fn number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(de)?;
  match value {
    Value::Null => Ok(None),
    Value::Number(n) => Ok(n.as_f64()),
    Value::String(s) if s.trim().is_empty() => Ok(None),
    Value::String(s) => parse_number(&s)
      .map(Some)
      .ok_or_else(|| serde::de::Error::custom(format!("invalid number {s:?}"))),
    other => Err(serde::de::Error::custom(format!("invalid number {other}"))),
  }
}

/// Parse a number as written on an invoice: `"12.50"`, `"12,50"`,
/// `"1.234,56"`, `"1,234.56"`, `"€ 3"`, `"12 EUR"`, `"1e5"`.
///
/// Only leading and trailing text is dropped; anything left between the
/// digits other than `.` and `,` makes the value unparseable.
pub fn parse_number(raw: &str) -> Option<f64> {
  let raw = raw.trim();
  if let Ok(n) = raw.parse::<f64>() {
    return n.is_finite().then_some(n);
  }

  let is_part = |c: char| c.is_ascii_digit() || matches!(c, '.' | ',' | '-');
  let core = raw.trim_matches(|c: char| !is_part(c));
  let digits = core.strip_prefix('-').unwrap_or(core);
  if !digits.starts_with(|c: char| c.is_ascii_digit())
    || !digits.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
  {
    return None;
  }

  let normalised = match (core.rfind('.'), core.rfind(',')) {
    (Some(dot), Some(comma)) if comma > dot => core.replace('.', "").replace(',', "."),
    (Some(_), Some(_)) => core.replace(',', ""),
    (None, Some(_)) => core.replace(',', "."),
    _ => core.to_owned(),
  };

  normalised.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_typical_model_output() {
    let json = r#"{
      "InvoiceDetails": {
        "InvoiceNumber": 4711,
        "InvoiceDate": "2024-03-01",
        "SupplierName": "ACME GmbH",
        "SupplierUstId": "DE123456789",
        "SupplierAddress": {
          "Street": "Hauptstr. 1",
          "City": "Berlin",
          "PostalCode": 10115,
          "Country": "DE"
        }
      },
      "ItemsPurchased": {
        "ItemList": [
          { "ItemNumber": "A-1", "ItemName": "Widget", "Quantity": "2",
            "UnitPrice": "10,00", "Total": 18 }
        ]
      },
      "PaymentInformation": { "PaymentMethod": "Bank transfer" }
    }"#;

    let payload = InvoicePayload::from_json(json).unwrap();
    let details = payload.invoice_details.unwrap();
    assert_eq!(details.invoice_number.as_deref(), Some("4711"));
    assert_eq!(details.supplier_ust_id.as_deref(), Some("DE123456789"));
    assert_eq!(
      details.supplier_address.unwrap().postal_code.as_deref(),
      Some("10115")
    );

    let item = &payload.items_purchased.unwrap().item_list[0];
    assert_eq!(item.quantity, Some(2.0));
    assert_eq!(item.unit_price, Some(10.0));
    assert_eq!(item.total, Some(18.0));
    assert_eq!(item.description, None);
  }

  #[test]
  fn number_formats() {
    assert_eq!(parse_number("12.50"), Some(12.5));
    assert_eq!(parse_number("12,50"), Some(12.5));
    assert_eq!(parse_number("1.234,56"), Some(1234.56));
    assert_eq!(parse_number("1,234.56"), Some(1234.56));
    assert_eq!(parse_number("€ 3"), Some(3.0));
    assert_eq!(parse_number("12 EUR"), Some(12.0));
    assert_eq!(parse_number("-4,5"), Some(-4.5));
    assert_eq!(parse_number("n/a"), None);
  }

  #[test]
  fn text_inside_a_number_is_rejected() {
    assert_eq!(parse_number("1e5"), Some(100_000.0));
    assert_eq!(parse_number("1/2"), None);
    assert_eq!(parse_number("1 2"), None);
    assert_eq!(parse_number("12-3"), None);
    assert_eq!(parse_number("nan"), None);
    assert_eq!(parse_number("inf"), None);
  }

  #[test]
  fn garbage_number_fails_the_payload() {
    let json = r#"{"ItemsPurchased":{"ItemList":[{"Quantity":"lots"}]}}"#;
    assert!(InvoicePayload::from_json(json).is_err());
  }

  #[test]
  fn details_are_missing_only_when_absent_or_empty() {
    let details = |v: Value| InvoiceDetails::from_response(&v).unwrap();
    assert!(details(serde_json::json!({})).is_none());
    assert!(details(serde_json::json!({ "InvoiceDetails": null })).is_none());
    assert!(details(serde_json::json!({ "InvoiceDetails": {} })).is_none());

    let unknown = details(serde_json::json!({ "InvoiceDetails": { "Foo": 1 } })).unwrap();
    assert_eq!(unknown.invoice_number, None);
  }

  #[test]
  fn details_ignore_the_rest_of_the_response() {
    let json = serde_json::json!({
      "InvoiceDetails": { "SupplierName": "ACME GmbH" },
      "ItemsPurchased": { "ItemList": [{ "Quantity": "two" }] }
    });
    let details = InvoiceDetails::from_response(&json).unwrap().unwrap();
    assert_eq!(details.supplier_name.as_deref(), Some("ACME GmbH"));
  }
}
