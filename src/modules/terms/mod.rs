//! Terms module.
//!
//! Owns the per-term credit policy (minimum/maximum credit load) and
//! the committed-credit ledger the allocation engine consults and
//! updates while distributing students.

pub mod controller;
pub mod ledger;
pub mod model;
pub mod router;
pub mod service;
