//! Supplier resolution from the invoice JSON, with its address and contact.

use aiflow_core::{
  model::ChatModel,
  party::{
    Address, AddressKey, Contact, ContactEmail, ContactPhone, Link, NewAddress, NewContact,
    NewSupplier, Supplier, SupplierType, split_person_name,
  },
  payload::{InvoiceDetails, require},
  store::ErpStore,
};
use serde::Serialize;

use crate::{Error, Result, Workflows, payload::QueryDocument, store_err};

const INVALID_JSON: &str = "Invalid JSON format";
const CREATED: &str = "Supplier created successfully";
const UPDATED: &str = "Supplier already exists, updated successfully";

/// Result of [`Workflows::create_supplier`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SupplierOutcome {
  Created { supplier: Supplier, address: String, contact: String },
  Updated { supplier: Supplier, address: String, contact: String },
  /// The query's `ai_response_json` was not a JSON string; nothing changed.
  InvalidJson,
}

impl SupplierOutcome {
  pub fn message(&self) -> &'static str {
    match self {
      Self::Created { .. } => CREATED,
      Self::Updated { .. } => UPDATED,
      Self::InvalidJson => INVALID_JSON,
    }
  }
}

fn missing_key(key: &str) -> String { format!("Missing key in JSON data: {key}") }

impl<S, M> Workflows<S, M>
where
  S: ErpStore + 'static,
  M: ChatModel + 'static,
{
  /// Find or create the supplier named in the query's invoice JSON, link it
  /// to the query, and bring its main address and contact up to date.
  #[tracing::instrument(skip_all, fields(query = %doc.name))]
  pub async fn create_supplier(&self, doc: &QueryDocument) -> Result<SupplierOutcome> {
    let Some(json) = doc.response_json() else {
      tracing::warn!("query carries no parseable JSON");
      return Ok(SupplierOutcome::InvalidJson);
    };
    let details = require(
      InvoiceDetails::from_response(&json)?,
      "Invoice details are missing in the JSON data.",
    )?;
    let supplier_name = require(
      details.supplier_name.clone(),
      "SupplierName is missing in the InvoiceDetails.",
    )?;
    let tax_id = details.supplier_ust_id.clone();

    let (mut supplier, created) = self.resolve_supplier(&supplier_name, tax_id).await?;

    let linked = self
      .store
      .link_query_supplier(&doc.name, &supplier.name)
      .await
      .map_err(store_err)?;
    if !linked {
      return Err(Error::NotFound { doctype: "AI Query", name: doc.name.clone() });
    }

    let address = self.upsert_address(&supplier, &details).await?;
    let contact = self.upsert_contact(&supplier, &details, &address.name).await?;

    supplier.primary_address = Some(address.name.clone());
    supplier.primary_contact = Some(contact.name.clone());
    self.store.update_supplier(&supplier).await.map_err(store_err)?;

    tracing::info!(supplier = %supplier.name, created, "supplier resolved");
    let (address, contact) = (address.name, contact.name);
    Ok(if created {
      SupplierOutcome::Created { supplier, address, contact }
    } else {
      SupplierOutcome::Updated { supplier, address, contact }
    })
  }

  /// Match by tax id, then by name; create when neither matches. A matched
  /// supplier without a tax id gets it backfilled.
  async fn resolve_supplier(
    &self,
    supplier_name: &str,
    tax_id: Option<String>,
  ) -> Result<(Supplier, bool)> {
    let mut existing = None;
    if let Some(tax_id) = &tax_id {
      existing = self.store.find_supplier_by_tax_id(tax_id).await.map_err(store_err)?;
    }
    if existing.is_none() {
      existing = self
        .store
        .find_supplier_by_name(supplier_name)
        .await
        .map_err(store_err)?;
    }

    match existing {
      Some(mut supplier) => {
        if supplier.tax_id.is_none() && tax_id.is_some() {
          supplier.tax_id = tax_id;
          self.store.update_supplier(&supplier).await.map_err(store_err)?;
        }
        Ok((supplier, false))
      }
      None => {
        let supplier = self
          .store
          .insert_supplier(NewSupplier {
            supplier_name: supplier_name.to_owned(),
            tax_id,
            supplier_group: String::new(),
            supplier_type: SupplierType::Company,
          })
          .await
          .map_err(store_err)?;
        Ok((supplier, true))
      }
    }
  }

  async fn upsert_address(
    &self,
    supplier: &Supplier,
    details: &InvoiceDetails,
  ) -> Result<Address> {
    let postal = require(details.supplier_address.as_ref(), missing_key("SupplierAddress"))?;
    let line1 = require(postal.street.clone(), missing_key("Street"))?;
    let city = require(postal.city.clone(), missing_key("City"))?;
    let pincode = require(postal.postal_code.clone(), missing_key("PostalCode"))?;
    let code = require(postal.country.as_deref(), missing_key("Country"))?;
    let country = self.store.country_by_code(code).await.map_err(store_err)?;

    let key = AddressKey { line1, city, pincode, country };
    match self.store.find_address(&key).await.map_err(store_err)? {
      Some(mut address) => {
        if !address.is_linked_to(&supplier.name) {
          address.links.push(Link::supplier(&supplier.name));
          self.store.update_address(&address).await.map_err(store_err)?;
        }
        Ok(address)
      }
      None => Ok(
        self
          .store
          .insert_address(NewAddress {
            title: format!("{} - Main Address", supplier.supplier_name),
            key,
            links: vec![Link::supplier(&supplier.name)],
          })
          .await
          .map_err(store_err)?,
      ),
    }
  }

  async fn upsert_contact(
    &self,
    supplier: &Supplier,
    details: &InvoiceDetails,
    address: &str,
  ) -> Result<Contact> {
    let person = details
      .supplier_contact_person
      .as_deref()
      .unwrap_or(&supplier.supplier_name);
    let (first_name, last_name) = split_person_name(person);
    let phone = details.supplier_contact_phone.as_deref();
    let email = details.supplier_contact_email.as_deref();

    let existing = self
      .store
      .find_contact(&first_name, &last_name)
      .await
      .map_err(store_err)?;

    match existing {
      Some(mut contact) => {
        contact.company_name = Some(supplier.supplier_name.clone());
        contact.address = Some(address.to_owned());
        if let Some(phone) = phone {
          contact.add_phone(phone);
        }
        if let Some(email) = email {
          contact.add_email(email);
        }
        if !contact.is_linked_to(&supplier.name) {
          contact.links.push(Link::supplier(&supplier.name));
        }
        self.store.update_contact(&contact).await.map_err(store_err)?;
        Ok(contact)
      }
      None => Ok(
        self
          .store
          .insert_contact(NewContact {
            first_name,
            last_name,
            company_name: Some(supplier.supplier_name.clone()),
            address: Some(address.to_owned()),
            phones: phone
              .map(|p| vec![ContactPhone { phone: p.to_owned(), is_primary: true }])
              .unwrap_or_default(),
            emails: email
              .map(|e| vec![ContactEmail { email_id: e.to_owned(), is_primary: true }])
              .unwrap_or_default(),
            links: vec![Link::supplier(&supplier.name)],
          })
          .await
          .map_err(store_err)?,
      ),
    }
  }
}
