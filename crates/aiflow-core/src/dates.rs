//! Invoice and due-date parsing with fallbacks.

use chrono::{DateTime, Datelike, NaiveDate};

const FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a date as models tend to write it. Years outside 1900–2199 are
/// treated as misreads.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  let parsed = FORMATS
    .iter()
    .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))?;

  (1900..2200).contains(&parsed.year()).then_some(parsed)
}

/// Posting and due date of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceDates {
  pub posting: NaiveDate,
  pub due:     NaiveDate,
}

impl InvoiceDates {
  /// Unparseable or missing dates fall back to `today`; a due date before the
  /// posting date is moved up to the posting date.
  pub fn resolve(invoice: Option<&str>, due: Option<&str>, today: NaiveDate) -> Self {
    let posting = invoice.and_then(parse_date).unwrap_or(today);
    let due = due.and_then(parse_date).unwrap_or(today).max(posting);
    Self { posting, due }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn accepts_common_formats() {
    assert_eq!(parse_date("2024-03-01"), Some(d(2024, 3, 1)));
    assert_eq!(parse_date("01.03.2024"), Some(d(2024, 3, 1)));
    assert_eq!(parse_date("01/03/2024"), Some(d(2024, 3, 1)));
    assert_eq!(parse_date("2024/03/01"), Some(d(2024, 3, 1)));
    assert_eq!(parse_date("2024-03-01T10:00:00+01:00"), Some(d(2024, 3, 1)));
    assert_eq!(parse_date("March 1st"), None);
    assert_eq!(parse_date("0024-03-01"), None);
  }

  #[test]
  fn due_before_invoice_is_clamped() {
    let dates = InvoiceDates::resolve(Some("2024-03-10"), Some("2024-03-01"), d(2025, 1, 1));
    assert_eq!(dates.posting, d(2024, 3, 10));
    assert_eq!(dates.due, d(2024, 3, 10));
  }

  #[test]
  fn missing_dates_fall_back_to_today() {
    let today = d(2025, 6, 15);
    let dates = InvoiceDates::resolve(None, Some("garbage"), today);
    assert_eq!(dates, InvoiceDates { posting: today, due: today });
  }

  #[test]
  fn later_due_date_is_kept() {
    let dates = InvoiceDates::resolve(Some("01.03.2024"), Some("31.03.2024"), d(2025, 1, 1));
    assert_eq!(dates.due, d(2024, 3, 31));
  }
}
