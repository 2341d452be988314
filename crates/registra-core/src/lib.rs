//! # Registra Core
//!
//! Core types shared across the Registra API:
//!
//! - [`errors`]: application error type with HTTP response conversion
//! - [`pagination`]: pagination parameters and metadata for list endpoints

pub mod errors;
pub mod pagination;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
