//! Line-item discount arithmetic and invoice totals.

use crate::invoice::{ChargeType, TaxRow};

/// Rate and discount derived from a line's quantity, list price and total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePricing {
  pub rate:                f64,
  pub discount_amount:     f64,
  pub discount_percentage: f64,
  pub amount:              f64,
}

impl LinePricing {
  /// A zero quantity or zero unit price yields an all-zero line; there is
  /// nothing to divide by.
  pub fn compute(qty: f64, unit_price: f64, total: f64) -> Self {
    if qty == 0.0 || unit_price == 0.0 {
      return Self {
        rate:                0.0,
        discount_amount:     0.0,
        discount_percentage: 0.0,
        amount:              0.0,
      };
    }

    let gross = unit_price * qty;
    let rate = total / qty;
    let discount_amount = gross - total;

    Self {
      rate,
      discount_amount,
      discount_percentage: discount_amount / gross * 100.0,
      amount: rate * qty,
    }
  }
}

/// Round to the two decimals currencies are stored with.
pub fn round_currency(v: f64) -> f64 { (v * 100.0).round() / 100.0 }

/// Fill `tax_amount` on each row against `net_total`.
pub fn apply_taxes(rows: &[TaxRow], net_total: f64) -> Vec<TaxRow> {
  rows
    .iter()
    .map(|row| {
      let tax_amount = match row.charge_type {
        ChargeType::OnNetTotal => round_currency(net_total * row.rate / 100.0),
        ChargeType::Actual => round_currency(row.tax_amount),
      };
      TaxRow { tax_amount, ..row.clone() }
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
  pub net_total:   f64,
  pub total_taxes: f64,
  pub grand_total: f64,
}

pub fn totals(line_amounts: impl IntoIterator<Item = f64>, taxes: &[TaxRow]) -> Totals {
  let net_total = round_currency(line_amounts.into_iter().sum());
  let total_taxes = round_currency(taxes.iter().map(|t| t.tax_amount).sum());
  Totals {
    net_total,
    total_taxes,
    grand_total: round_currency(net_total + total_taxes),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn discount_is_derived_from_total() {
    let p = LinePricing::compute(2.0, 10.0, 18.0);
    assert_eq!(p.rate, 9.0);
    assert_eq!(p.discount_amount, 2.0);
    assert_eq!(p.discount_percentage, 10.0);
    assert_eq!(p.amount, 18.0);
  }

  #[test]
  fn zero_quantity_or_price_zeroes_everything() {
    for (qty, price) in [(0.0, 10.0), (3.0, 0.0), (0.0, 0.0)] {
      let p = LinePricing::compute(qty, price, 30.0);
      assert_eq!(p.rate, 0.0);
      assert_eq!(p.discount_amount, 0.0);
      assert_eq!(p.discount_percentage, 0.0);
      assert!(p.rate.is_finite());
    }
  }

  #[test]
  fn surcharge_gives_negative_discount() {
    let p = LinePricing::compute(1.0, 10.0, 12.0);
    assert_eq!(p.discount_amount, -2.0);
    assert_eq!(p.discount_percentage, -20.0);
  }

  #[test]
  fn taxes_and_totals() {
    let rows = vec![
      TaxRow {
        charge_type:  ChargeType::OnNetTotal,
        account_head: "VAT 19%".into(),
        description:  "VAT".into(),
        rate:         19.0,
        tax_amount:   0.0,
      },
      TaxRow {
        charge_type:  ChargeType::Actual,
        account_head: "Freight".into(),
        description:  "Shipping".into(),
        rate:         0.0,
        tax_amount:   4.9,
      },
    ];
    let taxes = apply_taxes(&rows, 100.0);
    assert_eq!(taxes[0].tax_amount, 19.0);
    assert_eq!(taxes[1].tax_amount, 4.9);

    let t = totals([60.0, 40.0], &taxes);
    assert_eq!(t.net_total, 100.0);
    assert_eq!(t.total_taxes, 23.9);
    assert_eq!(t.grand_total, 123.9);
  }
}
