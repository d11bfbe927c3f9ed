//! Background sweep that retires expired links.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, timeout};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{error, info, warn};

use crate::domain::repositories::LinkRepository;
use crate::error::LinkError;
use crate::infrastructure::cache::CacheService;

/// Default sweep interval.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// Default retry ceiling for a failed cycle.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default base delay for cycle retry backoff.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);
/// Default bound on the wall-clock duration of a single cycle attempt.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Phase of the sweep loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaperState {
    Idle = 0,
    Scanning = 1,
    Cleaning = 2,
}

/// Outcome of one sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired links returned by the scan.
    pub scanned: usize,
    /// Links whose keys this cycle actually cleared.
    pub swept: usize,
    /// Links whose clear failed (logged and skipped).
    pub failed: usize,
}

/// Periodic background task that clears expired links from the store and
/// evicts their cache entries.
///
/// Each cycle runs `Idle -> Scanning -> Cleaning -> Idle`. Clearing is
/// idempotent per link (the store's conditional update skips rows already
/// cleared or rotated), so re-sweeping is harmless. A failing link is
/// logged and the batch continues; a failing cycle is retried with
/// exponential backoff up to a ceiling and then abandoned until the next
/// tick. Expired links stay resolvable until the following successful
/// sweep, a bounded eventual-consistency window.
pub struct ExpirationReaper<R: LinkRepository, C: CacheService> {
    repository: Arc<R>,
    cache: Arc<C>,
    interval: Duration,
    max_retries: usize,
    retry_backoff: Duration,
    cycle_timeout: Duration,
    state: AtomicU8,
}

impl<R: LinkRepository, C: CacheService> ExpirationReaper<R, C> {
    /// Creates a reaper with default interval and retry policy.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            repository,
            cache,
            interval: DEFAULT_SWEEP_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
            state: AtomicU8::new(ReaperState::Idle as u8),
        }
    }

    /// Overrides the sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Overrides the per-cycle retry ceiling and backoff base.
    pub fn with_retry_policy(mut self, max_retries: usize, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    /// Overrides the wall-clock bound on a single cycle attempt. A store
    /// call that hangs cannot stall the sweep loop past this bound.
    pub fn with_cycle_timeout(mut self, cycle_timeout: Duration) -> Self {
        self.cycle_timeout = cycle_timeout;
        self
    }

    /// Current phase of the sweep loop.
    pub fn state(&self) -> ReaperState {
        match self.state.load(Ordering::Relaxed) {
            1 => ReaperState::Scanning,
            2 => ReaperState::Cleaning,
            _ => ReaperState::Idle,
        }
    }

    fn set_state(&self, state: ReaperState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    /// Runs the sweep loop forever, ticking at the configured interval.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "expiration reaper started (interval: {:?}, retry ceiling: {})",
            self.interval, self.max_retries
        );

        loop {
            ticker.tick().await;
            self.sweep_with_retry().await;
        }
    }

    /// Runs one cycle, retrying whole-cycle failures with backoff up to the
    /// retry ceiling. Each attempt is bounded by the cycle timeout, so an
    /// attempt that hangs counts as a failure rather than stalling the
    /// loop. An exhausted cycle is abandoned until the next tick.
    pub async fn sweep_with_retry(&self) -> Option<SweepReport> {
        // Delays double from the configured base: backoff, 2x, 4x, ...
        let factor = (self.retry_backoff.as_millis() as u64 / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(factor)
            .map(jitter)
            .take(self.max_retries);

        match Retry::spawn(strategy, || self.timed_cycle()).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("sweep cycle abandoned until next tick: {}", e);
                None
            }
        }
    }

    async fn timed_cycle(&self) -> Result<SweepReport, LinkError> {
        match timeout(self.cycle_timeout, self.run_cycle()).await {
            Ok(result) => result,
            Err(_) => {
                self.set_state(ReaperState::Idle);
                Err(LinkError::StoreUnavailable(format!(
                    "sweep cycle exceeded {:?}",
                    self.cycle_timeout
                )))
            }
        }
    }

    /// Runs a single sweep cycle: scan for expired links, clear each one,
    /// and evict its cache entries.
    ///
    /// # Errors
    ///
    /// Fails only when the scan itself fails (store unreachable); per-link
    /// clear failures are logged and counted in [`SweepReport::failed`].
    pub async fn run_cycle(&self) -> Result<SweepReport, LinkError> {
        let now = Utc::now();

        self.set_state(ReaperState::Scanning);
        let expired = match self.repository.list_expired(now).await {
            Ok(links) => links,
            Err(e) => {
                self.set_state(ReaperState::Idle);
                return Err(e);
            }
        };

        self.set_state(ReaperState::Cleaning);
        let mut report = SweepReport {
            scanned: expired.len(),
            ..SweepReport::default()
        };

        for link in &expired {
            match self.repository.clear_expired_code(link.id, now).await {
                Ok(true) => {
                    report.swept += 1;
                    if let Some(code) = &link.short_code {
                        let _ = self.cache.invalidate(code).await;
                    }
                    if let Some(alias) = &link.custom_alias {
                        if link.short_code.as_deref() != Some(alias.as_str()) {
                            let _ = self.cache.invalidate(alias).await;
                        }
                    }
                }
                // Already cleared by a previous sweep, or rotated/deleted
                // under us. Nothing to evict.
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!("failed to clear expired link {}: {}", link.id, e);
                }
            }
        }

        self.set_state(ReaperState::Idle);

        if report.scanned > 0 {
            info!(
                "expiration sweep: scanned {}, swept {}, failed {}",
                report.scanned, report.swept, report.failed
            );
        }

        Ok(report)
    }
}
