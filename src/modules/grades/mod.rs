//! Bulk process-score entry for sections.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
