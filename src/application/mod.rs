//! Application layer services implementing business logic.
//!
//! Services orchestrate repository and cache calls behind the traits the
//! domain layer defines; the transport boundary that maps their results to
//! status codes lives outside this crate.
//!
//! # Available Services
//!
//! - [`services::LinkService`] - create / delete / rotate / stats / search
//! - [`services::Resolver`] - cache-aside redirect resolution
//! - [`services::ExpirationReaper`] - periodic expiration sweep

pub mod services;
