//! Repository implementations for durable link storage.
//!
//! - [`PgLinkRepository`] - PostgreSQL via SQLx (production)
//! - [`InMemoryLinkRepository`] - DashMap-backed (tests, single node)

pub mod memory;
pub mod pg_link_repository;

pub use memory::InMemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;
