//! Recording loop
//!
//! Drives poll cycles at a fixed cadence, reconciles each batch into the
//! in-memory log, and persists a full snapshot every cycle whether or not
//! anything new arrived. Any error from the poll/reconcile/persist path
//! terminates the loop; there is deliberately no retry or backoff, so a
//! transport hiccup ends the run with the file valid up to the last
//! completed cycle. A production deployment that wants bounded retry must
//! add it here and document the change.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RecorderConfig;
use crate::error::StreamlogResult;
use crate::history::{HistoryLog, HistoryStorage};
use crate::poller::ChatPoller;
use crate::reconcile::reconcile;

/// How a recording run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The server stopped issuing continuation tokens: the session is
    /// over. Detected before issuing another request, so the loop never
    /// posts an empty token.
    ContinuationExhausted,
    /// The cancellation token fired between cycles
    Cancelled,
}

/// What a resume against an existing snapshot found.
#[derive(Debug, Clone)]
pub struct ResumeReport {
    /// Events recovered from the snapshot
    pub recovered: usize,
    /// Timestamp of the last recovered event
    pub last_timestamp_micros: Option<u64>,
    /// New events appended by the first fetch
    pub appended: usize,
    /// The first fetch overlapped recorded history: no gap
    pub overlap_detected: bool,
    /// Every fetched event was newer than the snapshot: messages may be
    /// missing between the recovery point and the resumption point
    pub gap_possible: bool,
}

/// A staleness transition worth telling the user about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StalenessNotice {
    /// The quiet period just exceeded the threshold
    WentStale,
    /// A nonempty batch arrived while the warning was in effect
    Recovered { appended: usize },
}

/// Tracks the quiet period between nonempty batches.
///
/// The warning fires once per quiet period; the next nonempty batch clears
/// the flag and yields a recovery notice, after which a fresh quiet period
/// may warn again.
struct StalenessTracker {
    threshold: Duration,
    last_activity: Instant,
    is_stale: bool,
}

impl StalenessTracker {
    fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_activity: Instant::now(),
            is_stale: false,
        }
    }

    fn observe(&mut self, appended: usize) -> Option<StalenessNotice> {
        if appended > 0 {
            let was_stale = self.is_stale;
            self.last_activity = Instant::now();
            self.is_stale = false;
            return was_stale.then_some(StalenessNotice::Recovered { appended });
        }

        if !self.is_stale && self.last_activity.elapsed() > self.threshold {
            self.is_stale = true;
            return Some(StalenessNotice::WentStale);
        }

        None
    }
}

/// Owns the continuation token and the in-memory log for one recording.
///
/// Strictly sequential: each cycle awaits request, reconcile and persist in
/// order, so at most one fetch is ever in flight.
pub struct Recorder {
    poller: ChatPoller,
    storage: Arc<dyn HistoryStorage>,
    config: RecorderConfig,
    log: HistoryLog,
    continuation: String,
    staleness: StalenessTracker,
}

impl Recorder {
    pub fn new(
        poller: ChatPoller,
        storage: Arc<dyn HistoryStorage>,
        config: RecorderConfig,
        initial_continuation: String,
    ) -> Self {
        let staleness = StalenessTracker::new(config.stale_after());
        Self {
            poller,
            storage,
            config,
            log: HistoryLog::new(),
            continuation: initial_continuation,
            staleness,
        }
    }

    /// Recorded events so far
    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    /// Whether the staleness warning is currently in effect
    pub fn is_stale(&self) -> bool {
        self.staleness.is_stale
    }

    /// Load a previous snapshot, if any, and reconcile one fetch against
    /// it. Returns `None` when there is nothing to resume; the first
    /// regular cycle then starts from an empty log.
    pub async fn resume(&mut self) -> StreamlogResult<Option<ResumeReport>> {
        let Some(persisted) = self.storage.load().await? else {
            return Ok(None);
        };

        let recovered = persisted.len();
        let last_timestamp_micros = persisted.last_timestamp_micros();
        self.log = persisted;

        let result = self.poller.poll(&self.continuation).await?;
        self.continuation = result.next_continuation;

        let outcome = reconcile(self.log.events(), result.events);
        let report = ResumeReport {
            recovered,
            last_timestamp_micros,
            appended: outcome.appended.len(),
            overlap_detected: outcome.overlap_detected,
            gap_possible: outcome.gap_possible,
        };

        // No notice possible here: the flag cannot be set before the
        // first regular cycle.
        let _ = self.staleness.observe(outcome.appended.len());
        self.log.extend(outcome.appended);
        self.storage.save(&self.log).await?;

        info!(
            "Resumed with {} recovered and {} new events",
            report.recovered, report.appended
        );
        Ok(Some(report))
    }

    /// Run poll cycles until the session ends, the token is cancelled, or
    /// an error propagates.
    pub async fn run(&mut self, shutdown: CancellationToken) -> StreamlogResult<RunOutcome> {
        loop {
            if shutdown.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }

            // Checked before polling so an exhausted session, including one
            // discovered during resume, never triggers a doomed request.
            if self.continuation.is_empty() {
                info!("Continuation exhausted; live chat ended");
                return Ok(RunOutcome::ContinuationExhausted);
            }

            let result = self.poller.poll(&self.continuation).await?;
            // Replaced unconditionally, empty included, so termination is
            // visible on the next pass.
            self.continuation = result.next_continuation;

            let outcome = reconcile(self.log.events(), result.events);
            let notice = self.staleness.observe(outcome.appended.len());
            self.log.extend(outcome.appended);

            match notice {
                // A slow chat, or a silently wedged session. Warned once
                // per quiet period.
                Some(StalenessNotice::WentStale) => warn!(
                    "No new chat messages have been seen for over {} seconds",
                    self.config.stale_after_secs
                ),
                Some(StalenessNotice::Recovered { appended }) => {
                    info!("{} new chat messages after going stale", appended)
                }
                None => {}
            }

            self.storage.save(&self.log).await?;
            debug!("Cycle complete: {} events total", self.log.len());

            tokio::select! {
                _ = shutdown.cancelled() => return Ok(RunOutcome::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn elapsed_tracker() -> StalenessTracker {
        let tracker = StalenessTracker::new(Duration::ZERO);
        // Let the quiet period measurably exceed the zero threshold.
        thread::sleep(Duration::from_millis(5));
        tracker
    }

    #[test]
    fn quiet_period_warns_exactly_once() {
        let mut tracker = elapsed_tracker();

        assert_eq!(tracker.observe(0), Some(StalenessNotice::WentStale));
        assert!(tracker.is_stale);

        thread::sleep(Duration::from_millis(5));
        assert_eq!(tracker.observe(0), None);
        assert!(tracker.is_stale);
    }

    #[test]
    fn nonempty_batch_after_going_stale_recovers() {
        let mut tracker = elapsed_tracker();
        tracker.observe(0);

        assert_eq!(
            tracker.observe(3),
            Some(StalenessNotice::Recovered { appended: 3 })
        );
        assert!(!tracker.is_stale);
    }

    #[test]
    fn recovery_clears_the_flag_so_a_new_quiet_period_warns_again() {
        let mut tracker = elapsed_tracker();
        tracker.observe(0);
        tracker.observe(1);

        thread::sleep(Duration::from_millis(5));
        assert_eq!(tracker.observe(0), Some(StalenessNotice::WentStale));
    }

    #[test]
    fn nonempty_batch_without_staleness_gives_no_notice() {
        let mut tracker = StalenessTracker::new(Duration::from_secs(120));

        assert_eq!(tracker.observe(2), None);
        assert_eq!(tracker.observe(0), None);
        assert!(!tracker.is_stale);
    }

    #[test]
    fn no_warning_before_the_threshold_elapses() {
        let mut tracker = StalenessTracker::new(Duration::from_secs(120));

        assert_eq!(tracker.observe(0), None);
        assert!(!tracker.is_stale);
    }
}
