//! Failure tracking and pause state for the price client
//!
//! Tracks consecutive failures, a user-initiated pause, and a timed
//! auto-pause window. The client records every request outcome here and
//! consults [`FailureTracker::should_skip`] before calling out at all:
//!
//! - **Active**: normal operation, requests are allowed.
//! - **Paused**: the user asked for no traffic until [`FailureTracker::resume`].
//! - **Auto-paused**: too many consecutive failures; requests are blocked
//!   until the window elapses or `resume` is called.
//!
//! The state is in-memory and resets on application restart. Every mutation
//! broadcasts an [`ApiStateSnapshot`] so UI layers can mirror the
//! paused/active status without polling.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::constants::{
    AUTO_PAUSE_DURATION_SECS, AUTO_PAUSE_FAILURE_THRESHOLD, EVENT_CHANNEL_CAPACITY,
};

/// Read-only view of the tracker state
///
/// Carried by the state-change broadcast and returned by
/// [`FailureTracker::snapshot`]. The auto-pause deadline is expressed as a
/// remaining duration so observers never have to compare clocks.
#[derive(Debug, Clone)]
pub struct ApiStateSnapshot {
    /// User-initiated pause flag
    pub paused: bool,
    /// Failures recorded since the last success
    pub consecutive_failures: u32,
    /// Time left on the auto-pause window; `Some(0)` once it has elapsed
    pub auto_pause_remaining: Option<Duration>,
    /// Message from the most recent failure
    pub last_error: Option<String>,
}

impl ApiStateSnapshot {
    /// True when calls would be skipped in this state.
    pub fn should_skip(&self) -> bool {
        self.paused || self.auto_pause_remaining.is_some_and(|left| left > Duration::ZERO)
    }
}

/// Internal mutable state
#[derive(Debug)]
struct FailureState {
    paused: bool,
    consecutive_failures: u32,
    auto_pause_until: Option<Instant>,
    last_error: Option<String>,
}

impl FailureState {
    fn new() -> Self {
        Self {
            paused: false,
            consecutive_failures: 0,
            auto_pause_until: None,
            last_error: None,
        }
    }
}

/// Consecutive-failure state machine with manual pause and timed auto-pause
///
/// Mutated exclusively by the client after each request outcome; safe to
/// share behind an `Arc` for read access from other components.
pub struct FailureTracker {
    state: Mutex<FailureState>,
    events: broadcast::Sender<ApiStateSnapshot>,
    failure_threshold: u32,
    auto_pause_duration: Duration,
}

impl FailureTracker {
    /// Creates a tracker with the standard limits (10 consecutive failures,
    /// 30-minute auto-pause).
    pub fn new() -> Self {
        Self::with_limits(
            AUTO_PAUSE_FAILURE_THRESHOLD,
            Duration::from_secs(AUTO_PAUSE_DURATION_SECS),
        )
    }

    /// Creates a tracker with custom limits.
    pub fn with_limits(failure_threshold: u32, auto_pause_duration: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(FailureState::new()),
            events,
            failure_threshold,
            auto_pause_duration,
        }
    }

    /// Lock the state mutex, recovering from poison if necessary.
    ///
    /// Recovering is safe here: the worst case is a slightly stale failure
    /// count, which beats panicking inside the fetch path.
    fn lock_state(&self) -> MutexGuard<'_, FailureState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("failure tracker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn snapshot_of(state: &FailureState) -> ApiStateSnapshot {
        ApiStateSnapshot {
            paused: state.paused,
            consecutive_failures: state.consecutive_failures,
            auto_pause_remaining: state
                .auto_pause_until
                .map(|until| until.saturating_duration_since(Instant::now())),
            last_error: state.last_error.clone(),
        }
    }

    /// Observers are optional: a send with no receivers is not an error and
    /// must never affect tracker state.
    fn notify(&self, snapshot: ApiStateSnapshot) {
        let _ = self.events.send(snapshot);
    }

    /// Subscribes to state-change snapshots.
    ///
    /// One snapshot is broadcast per mutation: after every concluded request
    /// pipeline and after `pause`/`resume`.
    pub fn subscribe(&self) -> broadcast::Receiver<ApiStateSnapshot> {
        self.events.subscribe()
    }

    /// Returns the current state as a read-only snapshot.
    pub fn snapshot(&self) -> ApiStateSnapshot {
        Self::snapshot_of(&self.lock_state())
    }

    /// Records a successful call: zeroes the failure count and clears the
    /// last error. Leaves a manual pause and an already-armed auto-pause
    /// window alone; those require [`FailureTracker::resume`].
    pub fn record_success(&self) {
        let snapshot = {
            let mut state = self.lock_state();
            state.consecutive_failures = 0;
            state.last_error = None;
            Self::snapshot_of(&state)
        };
        self.notify(snapshot);
    }

    /// Records a failed call and arms the auto-pause window once the
    /// consecutive-failure threshold is reached.
    ///
    /// Crossing the threshold is the sole trigger: an active window is never
    /// extended by further failures. A window that has already elapsed
    /// re-arms if failures continue at or above the threshold.
    pub fn record_failure(&self, message: impl Into<String>) {
        let message = message.into();
        let snapshot = {
            let mut state = self.lock_state();
            state.consecutive_failures += 1;
            state.last_error = Some(message);

            if state.consecutive_failures >= self.failure_threshold {
                let now = Instant::now();
                let window_active = state.auto_pause_until.is_some_and(|until| until > now);
                if !window_active {
                    tracing::info!(
                        consecutive_failures = state.consecutive_failures,
                        pause_secs = self.auto_pause_duration.as_secs(),
                        "auto-pausing after repeated failures"
                    );
                    state.auto_pause_until = Some(now + self.auto_pause_duration);
                }
            }

            Self::snapshot_of(&state)
        };
        self.notify(snapshot);
    }

    /// True when calls should be skipped: manually paused, or inside an
    /// active auto-pause window.
    pub fn should_skip(&self) -> bool {
        let state = self.lock_state();
        if state.paused {
            return true;
        }
        state
            .auto_pause_until
            .is_some_and(|until| until > Instant::now())
    }

    /// Pauses calls until [`FailureTracker::resume`].
    pub fn pause(&self) {
        let snapshot = {
            let mut state = self.lock_state();
            state.paused = true;
            Self::snapshot_of(&state)
        };
        self.notify(snapshot);
    }

    /// Full reset: clears the manual pause, the auto-pause window, and the
    /// failure count. The last error is kept for UI surfacing.
    pub fn resume(&self) {
        let snapshot = {
            let mut state = self.lock_state();
            state.paused = false;
            state.auto_pause_until = None;
            state.consecutive_failures = 0;
            Self::snapshot_of(&state)
        };
        self.notify(snapshot);
    }

    /// Time until the auto-pause window elapses, floored at zero, or `None`
    /// when no window has been armed. An external timer can use this to
    /// schedule an automatic [`FailureTracker::resume`].
    pub fn auto_resume_remaining(&self) -> Option<Duration> {
        self.lock_state()
            .auto_pause_until
            .map(|until| until.saturating_duration_since(Instant::now()))
    }

    /// Message from the most recent failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    /// Failures recorded since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.lock_state().consecutive_failures
    }
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_starts_active() {
        let tracker = FailureTracker::new();

        assert!(!tracker.should_skip());
        let snapshot = tracker.snapshot();
        assert!(!snapshot.paused);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert!(snapshot.auto_pause_remaining.is_none());
        assert!(snapshot.last_error.is_none());
    }

    #[test]
    fn test_success_resets_failure_count_and_error() {
        let tracker = FailureTracker::new();

        tracker.record_failure("connection refused");
        tracker.record_failure("connection refused");
        assert_eq!(tracker.consecutive_failures(), 2);
        assert_eq!(tracker.last_error().as_deref(), Some("connection refused"));

        tracker.record_success();
        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(tracker.last_error().is_none());
    }

    #[test]
    fn test_auto_pause_arms_at_threshold() {
        let tracker = FailureTracker::new();

        for _ in 0..9 {
            tracker.record_failure("timeout");
        }
        assert!(!tracker.should_skip());
        assert!(tracker.auto_resume_remaining().is_none());

        tracker.record_failure("timeout");
        assert!(tracker.should_skip());

        let remaining = tracker.auto_resume_remaining().expect("window armed");
        assert!(remaining <= Duration::from_secs(30 * 60));
        assert!(remaining > Duration::from_secs(29 * 60));
    }

    #[test]
    fn test_active_window_is_not_extended_by_further_failures() {
        let tracker = FailureTracker::new();

        for _ in 0..10 {
            tracker.record_failure("timeout");
        }
        let before = tracker.auto_resume_remaining().expect("window armed");

        tracker.record_failure("timeout");
        let after = tracker.auto_resume_remaining().expect("window still armed");

        assert_eq!(tracker.consecutive_failures(), 11);
        assert!(after <= before);
    }

    #[test]
    fn test_elapsed_window_rearms_on_next_failure() {
        let tracker = FailureTracker::with_limits(3, Duration::from_millis(10));

        for _ in 0..3 {
            tracker.record_failure("timeout");
        }
        assert!(tracker.should_skip());

        std::thread::sleep(Duration::from_millis(20));
        assert!(!tracker.should_skip());

        tracker.record_failure("timeout");
        assert!(tracker.should_skip());
    }

    #[test]
    fn test_success_does_not_clear_armed_window() {
        let tracker = FailureTracker::new();

        for _ in 0..10 {
            tracker.record_failure("timeout");
        }
        assert!(tracker.should_skip());

        tracker.record_success();
        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(tracker.should_skip());
        assert!(tracker.auto_resume_remaining().is_some());
    }

    #[test]
    fn test_success_does_not_clear_manual_pause() {
        let tracker = FailureTracker::new();

        tracker.pause();
        tracker.record_success();

        assert!(tracker.should_skip());
        assert!(tracker.snapshot().paused);
    }

    #[test]
    fn test_resume_always_clears_skip() {
        let tracker = FailureTracker::new();

        tracker.pause();
        for _ in 0..10 {
            tracker.record_failure("timeout");
        }
        assert!(tracker.should_skip());

        tracker.resume();
        assert!(!tracker.should_skip());
        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(tracker.auto_resume_remaining().is_none());
    }

    #[test]
    fn test_resume_keeps_last_error() {
        let tracker = FailureTracker::new();

        tracker.record_failure("DNS lookup failed");
        tracker.resume();

        assert_eq!(tracker.last_error().as_deref(), Some("DNS lookup failed"));
    }

    #[test]
    fn test_every_mutation_notifies_subscribers() {
        let tracker = FailureTracker::new();
        let mut events = tracker.subscribe();

        tracker.record_failure("timeout");
        let snapshot = events.try_recv().expect("failure notification");
        assert_eq!(snapshot.consecutive_failures, 1);
        assert_eq!(snapshot.last_error.as_deref(), Some("timeout"));

        tracker.pause();
        let snapshot = events.try_recv().expect("pause notification");
        assert!(snapshot.paused);
        assert!(snapshot.should_skip());

        tracker.resume();
        let snapshot = events.try_recv().expect("resume notification");
        assert!(!snapshot.paused);
        assert!(!snapshot.should_skip());

        tracker.record_success();
        let snapshot = events.try_recv().expect("success notification");
        assert_eq!(snapshot.consecutive_failures, 0);
    }

    #[test]
    fn test_mutations_without_subscribers_are_harmless() {
        let tracker = FailureTracker::new();

        tracker.record_failure("timeout");
        tracker.pause();
        tracker.resume();
        tracker.record_success();

        assert!(!tracker.should_skip());
    }

    #[test]
    fn test_snapshot_should_skip_matches_tracker() {
        let tracker = FailureTracker::with_limits(2, Duration::from_secs(60));

        tracker.record_failure("timeout");
        assert_eq!(tracker.snapshot().should_skip(), tracker.should_skip());

        tracker.record_failure("timeout");
        assert_eq!(tracker.snapshot().should_skip(), tracker.should_skip());
        assert!(tracker.snapshot().should_skip());
    }
}
