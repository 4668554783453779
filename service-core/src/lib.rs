//! service-core: shared infrastructure for practice services.
pub mod config;
pub mod error;
pub mod observability;
