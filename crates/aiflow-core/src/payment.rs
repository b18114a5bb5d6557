//! Matching a free-text payment method against configured payment terms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::invoice::PaymentScheduleEntry;

/// One row of the payment-method lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTermMapping {
  /// Payment method as it appears on invoices, e.g. `"Bank Transfer"`.
  pub method: String,
  /// The payment term to apply, e.g. `"Net 30"`.
  pub term:   String,
}

/// Lowercase with all whitespace removed.
pub fn normalize_method(s: &str) -> String {
  s.chars()
    .filter(|c| !c.is_whitespace())
    .flat_map(char::to_lowercase)
    .collect()
}

/// First mapping whose normalised method equals the normalised `method`.
pub fn match_payment_term<'a>(
  mappings: &'a [PaymentTermMapping],
  method: &str,
) -> Option<&'a PaymentTermMapping> {
  let wanted = normalize_method(method);
  if wanted.is_empty() {
    return None;
  }
  mappings.iter().find(|m| normalize_method(&m.method) == wanted)
}

/// A schedule that allocates the full invoice total to a single due date.
pub fn single_schedule(
  term: &str,
  due_date: NaiveDate,
  grand_total: f64,
) -> Vec<PaymentScheduleEntry> {
  vec![PaymentScheduleEntry {
    payment_term:    term.to_owned(),
    due_date,
    invoice_portion: 100.0,
    payment_amount:  grand_total,
  }]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table() -> Vec<PaymentTermMapping> {
    vec![
      PaymentTermMapping { method: "Bank Transfer".into(), term: "Net 14".into() },
      PaymentTermMapping { method: "SEPA Lastschrift".into(), term: "Direct Debit".into() },
    ]
  }

  #[test]
  fn matching_ignores_case_and_whitespace() {
    let table = table();
    assert_eq!(match_payment_term(&table, " bank  transfer\n").unwrap().term, "Net 14");
    assert_eq!(match_payment_term(&table, "SEPALASTSCHRIFT").unwrap().term, "Direct Debit");
  }

  #[test]
  fn unknown_or_blank_method_does_not_match() {
    let table = table();
    assert!(match_payment_term(&table, "PayPal").is_none());
    assert!(match_payment_term(&table, "   ").is_none());
  }

  #[test]
  fn schedule_takes_full_total() {
    let due = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let schedule = single_schedule("Net 14", due, 119.0);
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0].invoice_portion, 100.0);
    assert_eq!(schedule[0].payment_amount, 119.0);
  }
}
