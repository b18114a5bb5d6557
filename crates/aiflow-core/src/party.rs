//! Suppliers and the address and contact records linked to them.

use serde::{Deserialize, Serialize};

pub const SUPPLIER_DOCTYPE: &str = "Supplier";

// ─── Links ───────────────────────────────────────────────────────────────────

/// A dynamic link from an address or contact to the record that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
  pub link_doctype: String,
  pub link_name:    String,
}

impl Link {
  pub fn supplier(name: impl Into<String>) -> Self {
    Self {
      link_doctype: SUPPLIER_DOCTYPE.to_owned(),
      link_name:    name.into(),
    }
  }
}

fn links_to(links: &[Link], name: &str) -> bool {
  links.iter().any(|l| l.link_name == name)
}

// ─── Supplier ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupplierType {
  #[default]
  Company,
  Individual,
}

impl SupplierType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Company => "Company",
      Self::Individual => "Individual",
    }
  }

  pub fn parse(s: &str) -> Self {
    if s == "Individual" { Self::Individual } else { Self::Company }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
  pub name:            String,
  pub supplier_name:   String,
  /// VAT / tax identifier; the preferred natural key.
  pub tax_id:          Option<String>,
  pub supplier_group:  String,
  pub supplier_type:   SupplierType,
  pub primary_address: Option<String>,
  pub primary_contact: Option<String>,
}

/// Input to [`crate::store::ErpStore::insert_supplier`].
#[derive(Debug, Clone)]
pub struct NewSupplier {
  pub supplier_name:  String,
  pub tax_id:         Option<String>,
  pub supplier_group: String,
  pub supplier_type:  SupplierType,
}

// ─── Address ─────────────────────────────────────────────────────────────────

/// The composite natural key an address is matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressKey {
  pub line1:   String,
  pub city:    String,
  pub pincode: String,
  /// Resolved country name; `None` when the code matched no country.
  pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
  pub name:    String,
  pub title:   String,
  pub line1:   String,
  pub city:    String,
  pub pincode: String,
  pub country: Option<String>,
  pub links:   Vec<Link>,
}

impl Address {
  pub fn is_linked_to(&self, name: &str) -> bool { links_to(&self.links, name) }
}

#[derive(Debug, Clone)]
pub struct NewAddress {
  pub title: String,
  pub key:   AddressKey,
  pub links: Vec<Link>,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPhone {
  pub phone:      String,
  pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEmail {
  pub email_id:   String,
  pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub name:         String,
  pub first_name:   String,
  pub last_name:    String,
  pub company_name: Option<String>,
  pub address:      Option<String>,
  pub phones:       Vec<ContactPhone>,
  pub emails:       Vec<ContactEmail>,
  pub links:        Vec<Link>,
}

impl Contact {
  pub fn is_linked_to(&self, name: &str) -> bool { links_to(&self.links, name) }

  /// Append `phone` unless already present. It becomes primary only when the
  /// contact had no phone numbers.
  pub fn add_phone(&mut self, phone: &str) {
    if self.phones.iter().any(|p| p.phone == phone) {
      return;
    }
    let is_primary = self.phones.is_empty();
    self.phones.push(ContactPhone { phone: phone.to_owned(), is_primary });
  }

  /// Append `email` unless already present. It becomes primary only when the
  /// contact had no email addresses.
  pub fn add_email(&mut self, email: &str) {
    if self.emails.iter().any(|e| e.email_id == email) {
      return;
    }
    let is_primary = self.emails.is_empty();
    self.emails.push(ContactEmail { email_id: email.to_owned(), is_primary });
  }
}

#[derive(Debug, Clone)]
pub struct NewContact {
  pub first_name:   String,
  pub last_name:    String,
  pub company_name: Option<String>,
  pub address:      Option<String>,
  pub phones:       Vec<ContactPhone>,
  pub emails:       Vec<ContactEmail>,
  pub links:        Vec<Link>,
}

/// Split a free-text person name into `(first, last)`.
///
/// Only the first two whitespace-separated tokens are used; a single token
/// yields an empty last name.
pub fn split_person_name(full: &str) -> (String, String) {
  let mut parts = full.split(' ');
  let first = parts.next().unwrap_or_default().to_owned();
  let last = parts.next().unwrap_or_default().to_owned();
  (first, last)
}
