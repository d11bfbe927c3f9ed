//! Business logic services for the application layer.

pub mod link_service;
pub mod reaper;
pub mod resolver;

pub use link_service::LinkService;
pub use reaper::{ExpirationReaper, ReaperState, SweepReport};
pub use resolver::Resolver;
