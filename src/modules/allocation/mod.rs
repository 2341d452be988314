//! Enrollment allocation engine.
//!
//! Distributes eligible students across a course's sections, honoring
//! per-term credit policies, prerequisite rules and section capacity.
//! Each course runs in its own transaction; batch runs share an
//! in-memory credit ledger so later courses see earlier grants.

pub mod controller;
pub mod eligibility;
pub mod model;
pub mod router;
pub mod service;
