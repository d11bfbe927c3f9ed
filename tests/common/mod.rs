//! Shared helpers for the integration test suites.

use slink::prelude::*;
use std::sync::Arc;
use std::time::Duration;

pub type MemoryStack = (Arc<InMemoryLinkRepository>, Arc<MemoryCache>);

/// Fresh in-memory repository and cache, wired the way production wires
/// Postgres and Redis.
pub fn memory_stack() -> MemoryStack {
    (
        Arc::new(InMemoryLinkRepository::new()),
        Arc::new(MemoryCache::new(10_000, Duration::from_secs(60))),
    )
}

#[allow(dead_code)]
pub fn link_service(
    stack: &MemoryStack,
) -> LinkService<InMemoryLinkRepository, MemoryCache> {
    LinkService::new(stack.0.clone(), stack.1.clone())
}

#[allow(dead_code)]
pub fn resolver(stack: &MemoryStack) -> Resolver<InMemoryLinkRepository, MemoryCache> {
    Resolver::new(stack.0.clone(), stack.1.clone())
}
