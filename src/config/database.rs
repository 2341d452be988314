//! Database connection pool initialization.
//!
//! The PostgreSQL connection string is read from the `DATABASE_URL`
//! environment variable. The returned pool is cheaply cloneable and is
//! shared through [`crate::state::AppState`].
//!
//! # Panics
//!
//! [`init_db_pool`] panics if `DATABASE_URL` is unset or the database
//! cannot be reached; there is nothing useful the service can do
//! without a database.

use sqlx::PgPool;
use std::env;

/// Initializes the PostgreSQL connection pool from `DATABASE_URL`.
pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
