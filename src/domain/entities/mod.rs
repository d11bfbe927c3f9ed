//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without business logic. Creation
//! input uses the separate [`NewLink`] struct; [`StatsView`] is the
//! read-only projection served by the stats operation.

pub mod link;

pub use link::{Link, NewLink, StatsView};
