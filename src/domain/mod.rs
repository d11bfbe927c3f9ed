//! Domain layer containing business entities and data-access contracts.
//!
//! This layer has no dependency on infrastructure or presentation concerns.
//! Repository traits defined here are implemented by the infrastructure
//! layer; business rules live in [`crate::application::services`].

pub mod entities;
pub mod repositories;
