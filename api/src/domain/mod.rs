//! Postgres queries for the credential store
//!
//! Every function takes a generic `Executor`, so callers can pass either
//! `&PgPool` or `&mut *tx` from an open transaction.

pub mod schema;
pub mod tokens;
pub mod usages;
