pub mod credentials;
pub mod error;
pub mod memory_store;
pub mod pg_store;
pub mod rate_limit;
pub mod retention;
pub mod upload;
