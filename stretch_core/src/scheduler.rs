//! Host scheduling primitives.
//!
//! The engine never sleeps or spawns threads. It asks a `Scheduler` to
//! remember a `TimerToken` for later, and the host loop hands due tokens
//! back through `PlaybackEngine::pump` (or `handle_timer` directly).
//! Callbacks are therefore serialized with user commands on one thread.

use std::time::{Duration, Instant};

/// What a scheduled callback is for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Recurring countdown tick
    Tick,
    /// One-shot delay before the second side of a bilateral exercise
    SideSwitch,
    /// One-shot delay before moving to the next exercise
    Advance,
}

/// Handle for one scheduled callback
///
/// `generation` ties the token to the TimerController schedule that
/// created it; once superseded the token is stale and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub generation: u64,
    pub kind: TimerKind,
}

/// The host cannot schedule callbacks at all
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("scheduling primitive unavailable")]
pub struct SchedulerUnavailable;

/// Host event-loop timer facility
pub trait Scheduler {
    /// Monotonic milliseconds since the scheduler was created
    fn now_ms(&self) -> u64;

    fn schedule(&mut self, token: TimerToken, delay: Duration) -> Result<(), SchedulerUnavailable>;

    /// Remove a pending token; unknown tokens are ignored
    fn cancel(&mut self, token: TimerToken);

    /// Deadline of the earliest pending token
    fn next_due_ms(&self) -> Option<u64>;

    /// Take the earliest token whose deadline has passed
    fn pop_due(&mut self) -> Option<TimerToken>;
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Deadline-ordered pending tokens; ties fire in scheduling order
#[derive(Debug, Default)]
struct TimerQueue {
    entries: Vec<(u64, u64, TimerToken)>,
    seq: u64,
}

impl TimerQueue {
    fn push(&mut self, due_ms: u64, token: TimerToken) {
        self.seq += 1;
        self.entries.push((due_ms, self.seq, token));
    }

    fn remove(&mut self, token: TimerToken) {
        self.entries.retain(|(_, _, t)| *t != token);
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.entries.iter().map(|(due, _, _)| *due).min()
    }

    fn pop_due(&mut self, now_ms: u64) -> Option<TimerToken> {
        let (pos, _) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (due, _, _))| *due <= now_ms)
            .min_by_key(|(_, (due, seq, _))| (*due, *seq))?;
        Some(self.entries.remove(pos).2)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// Virtual time
// ============================================================================

/// Deterministic scheduler driven by explicit time steps
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now_ms: u64,
    queue: TimerQueue,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward; time never runs backwards
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for VirtualScheduler {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn schedule(&mut self, token: TimerToken, delay: Duration) -> Result<(), SchedulerUnavailable> {
        self.queue
            .push(self.now_ms.saturating_add(saturating_millis(delay)), token);
        Ok(())
    }

    fn cancel(&mut self, token: TimerToken) {
        self.queue.remove(token);
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.queue.next_due_ms()
    }

    fn pop_due(&mut self) -> Option<TimerToken> {
        self.queue.pop_due(self.now_ms)
    }
}

// ============================================================================
// Wall-clock time
// ============================================================================

/// Scheduler backed by the monotonic clock
///
/// `speed` scales the passage of time (2.0 plays twice as fast).
#[derive(Debug)]
pub struct RealtimeScheduler {
    origin: Instant,
    speed: f64,
    queue: TimerQueue,
}

impl RealtimeScheduler {
    pub fn new() -> Self {
        Self::with_speed(1.0)
    }

    pub fn with_speed(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            tracing::warn!("Ignoring invalid speed {}, using 1.0", speed);
            1.0
        };
        Self {
            origin: Instant::now(),
            speed,
            queue: TimerQueue::default(),
        }
    }

    /// Wall-clock time until the next token is due
    pub fn wait_until_next(&self) -> Option<Duration> {
        let due = self.queue.next_due_ms()?;
        let scaled = due.saturating_sub(self.now_ms()) as f64 / self.speed;
        Some(Duration::from_millis(scaled.ceil() as u64))
    }
}

impl Default for RealtimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RealtimeScheduler {
    fn now_ms(&self) -> u64 {
        (saturating_millis(self.origin.elapsed()) as f64 * self.speed) as u64
    }

    fn schedule(&mut self, token: TimerToken, delay: Duration) -> Result<(), SchedulerUnavailable> {
        let due = self.now_ms().saturating_add(saturating_millis(delay));
        self.queue.push(due, token);
        Ok(())
    }

    fn cancel(&mut self, token: TimerToken) {
        self.queue.remove(token);
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.queue.next_due_ms()
    }

    fn pop_due(&mut self) -> Option<TimerToken> {
        self.queue.pop_due(self.now_ms())
    }
}

// ============================================================================
// No timers
// ============================================================================

/// Host without any timer facility; playback runs in manual-only mode
#[derive(Debug)]
pub struct UnavailableScheduler {
    origin: Instant,
}

impl UnavailableScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for UnavailableScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for UnavailableScheduler {
    fn now_ms(&self) -> u64 {
        saturating_millis(self.origin.elapsed())
    }

    fn schedule(&mut self, _token: TimerToken, _delay: Duration) -> Result<(), SchedulerUnavailable> {
        Err(SchedulerUnavailable)
    }

    fn cancel(&mut self, _token: TimerToken) {}

    fn next_due_ms(&self) -> Option<u64> {
        None
    }

    fn pop_due(&mut self) -> Option<TimerToken> {
        None
    }
}
