//! Core types and trait definitions for aiflow.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the records the workflows read and write, the pure business rules
//! (JSON extraction, line pricing, date clamping, payment-term matching) and
//! the two seams every other crate plugs into: [`store::ErpStore`] and
//! [`model::ChatModel`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod dates;
pub mod error;
pub mod extract;
pub mod invoice;
pub mod model;
pub mod party;
pub mod payload;
pub mod payment;
pub mod pricing;
pub mod record;
pub mod store;

pub use error::{Error, Result};
