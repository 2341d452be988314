//! Application configuration.
//!
//! - [`cors`]: allowed CORS origins from `ALLOWED_ORIGINS`
//! - [`database`]: PostgreSQL pool initialization from `DATABASE_URL`

pub mod cors;
pub mod database;
