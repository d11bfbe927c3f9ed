//! Infrastructure layer for external integrations.
//!
//! Implements the interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Redirect cache (Redis, in-memory, and no-op backends)
//! - [`persistence`] - Link repository implementations

pub mod cache;
pub mod persistence;
