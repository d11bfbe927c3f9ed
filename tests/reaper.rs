mod common;

use chrono::{Duration as ChronoDuration, Utc};
use slink::prelude::*;

async fn insert_expired(repo: &InMemoryLinkRepository, code: &str, alias: Option<&str>) -> Link {
    repo.insert(NewLink {
        owner_id: 1,
        long_url: format!("https://example.com/{code}"),
        short_code: code.to_string(),
        custom_alias: alias.map(String::from),
        expires_at: Some(Utc::now() - ChronoDuration::hours(1)),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_sweep_clears_expired_links_and_cache_entries() {
    let (repo, cache) = common::memory_stack();
    let resolver = Resolver::new(repo.clone(), cache.clone());

    insert_expired(&repo, "dead1", Some("deadalias")).await;
    // A live link must survive the sweep.
    repo.insert(NewLink {
        owner_id: 1,
        long_url: "https://example.com/live".to_string(),
        short_code: "alive1".to_string(),
        custom_alias: None,
        expires_at: Some(Utc::now() + ChronoDuration::hours(1)),
    })
    .await
    .unwrap();

    // Simulate a cache entry left over from before the expiry.
    cache.set_url("dead1", "https://example.com/dead1", None).await.unwrap();
    cache.set_url("deadalias", "https://example.com/dead1", None).await.unwrap();

    let reaper = ExpirationReaper::new(repo.clone(), cache.clone());
    let report = reaper.run_cycle().await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.swept, 1);
    assert_eq!(report.failed, 0);

    // Both keys are gone from cache and store.
    assert!(cache.get_url("dead1").await.unwrap().is_none());
    assert!(cache.get_url("deadalias").await.unwrap().is_none());
    assert!(matches!(
        resolver.resolve("dead1").await,
        Err(LinkError::NotFound(_))
    ));
    assert!(matches!(
        resolver.resolve("deadalias").await,
        Err(LinkError::NotFound(_))
    ));

    // The live link is untouched.
    assert_eq!(
        resolver.resolve("alive1").await.unwrap(),
        "https://example.com/live"
    );
}

#[tokio::test]
async fn test_resweeping_is_idempotent() {
    let (repo, cache) = common::memory_stack();

    insert_expired(&repo, "dead1", None).await;

    let reaper = ExpirationReaper::new(repo.clone(), cache.clone());

    let first = reaper.run_cycle().await.unwrap();
    assert_eq!(first.swept, 1);

    // The cleared link no longer matches the expired-with-code filter.
    let second = reaper.run_cycle().await.unwrap();
    assert_eq!(second.scanned, 0);
    assert_eq!(second.swept, 0);
}

#[tokio::test]
async fn test_cached_code_stops_resolving_within_one_cycle_of_clearing() {
    let (repo, cache) = common::memory_stack();
    let resolver = Resolver::new(repo.clone(), cache.clone());

    let link = insert_expired(&repo, "dead1", None).await;

    // The entry is still cached from before the deadline.
    cache.set_url("dead1", &link.long_url, None).await.unwrap();

    let reaper = ExpirationReaper::new(repo.clone(), cache.clone());
    reaper.run_cycle().await.unwrap();

    // After the sweep the cache entry is gone and resolution reports the
    // record as missing rather than serving the stale destination.
    assert!(cache.get_url("dead1").await.unwrap().is_none());
    assert!(matches!(
        resolver.resolve("dead1").await,
        Err(LinkError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_conditional_clear_resolves_reaper_races() {
    let (repo, cache) = common::memory_stack();

    let link = insert_expired(&repo, "dead1", None).await;

    // Race: a delete lands between the reaper's scan and its clear. The
    // conditional update sees the code already gone and does nothing.
    let scan = repo.list_expired(Utc::now()).await.unwrap();
    assert_eq!(scan.len(), 1);

    repo.update_short_code(link.id, None).await.unwrap();
    assert!(!repo.clear_expired_code(link.id, Utc::now()).await.unwrap());

    // The next full cycle sees nothing left to sweep.
    let reaper = ExpirationReaper::new(repo.clone(), cache.clone());
    let report = reaper.run_cycle().await.unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.swept, 0);
}
