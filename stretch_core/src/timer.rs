//! Cancellable countdown clock with one live schedule at a time.
//!
//! Every schedule the controller creates (the recurring tick or a one-shot
//! post-expiry delay) carries the current generation. Cancelling bumps the
//! generation, so a callback the host delivers late is recognised as stale
//! and ignored instead of mutating a session that has already moved on.

use crate::scheduler::{Scheduler, TimerKind, TimerToken};
use std::time::Duration;

/// Outcome of delivering a fired token to the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerFired {
    /// One second elapsed, countdown continues
    Tick { remaining_seconds: u32 },
    /// Countdown reached zero; the controller has self-cancelled
    Expired,
    SideSwitchDue,
    AdvanceDue,
    /// Token belongs to a superseded schedule
    Stale,
}

#[derive(Debug)]
pub struct TimerController {
    generation: u64,
    live: Option<TimerToken>,
    remaining_seconds: u32,
    tick_interval: Duration,
    manual_only: bool,
}

impl TimerController {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            generation: 0,
            live: None,
            remaining_seconds: 0,
            tick_interval,
            manual_only: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn live_token(&self) -> Option<TimerToken> {
        self.live
    }

    pub fn is_scheduled(&self) -> bool {
        self.live.is_some()
    }

    /// The host refused to schedule; countdowns and delays are disabled
    pub fn is_manual_only(&self) -> bool {
        self.manual_only
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Begin counting down from `seconds`
    ///
    /// No-op while something is already scheduled; callers cancel first.
    /// Returns whether a tick was actually scheduled.
    pub fn start<S: Scheduler>(&mut self, scheduler: &mut S, seconds: u32) -> bool {
        if let Some(live) = self.live {
            tracing::debug!("Timer start ignored, {:?} already scheduled", live);
            return false;
        }
        if self.manual_only {
            return false;
        }
        self.remaining_seconds = seconds;
        self.generation += 1;
        self.arm(scheduler, TimerKind::Tick, self.tick_interval)
    }

    /// Stop the recurring tick; `remaining_seconds` is kept
    pub fn pause<S: Scheduler>(&mut self, scheduler: &mut S) {
        if matches!(self.live, Some(token) if token.kind == TimerKind::Tick) {
            self.cancel(scheduler);
        }
    }

    /// Drop whatever is scheduled. Safe to call when nothing is.
    pub fn cancel<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.live.take() {
            scheduler.cancel(token);
        }
        self.generation += 1;
    }

    /// Replace any live schedule with a one-shot delay
    ///
    /// Returns false when the host cannot schedule; the caller should then
    /// apply the transition immediately.
    pub fn schedule_delay<S: Scheduler>(
        &mut self,
        scheduler: &mut S,
        kind: TimerKind,
        delay: Duration,
    ) -> bool {
        self.cancel(scheduler);
        if self.manual_only {
            return false;
        }
        self.arm(scheduler, kind, delay)
    }

    /// Deliver a token the host reports as due
    pub fn on_fired<S: Scheduler>(&mut self, scheduler: &mut S, token: TimerToken) -> TimerFired {
        if token.generation != self.generation || self.live != Some(token) {
            tracing::debug!(
                "Ignoring stale {:?} (current generation {})",
                token,
                self.generation
            );
            return TimerFired::Stale;
        }
        self.live = None;

        match token.kind {
            TimerKind::Tick => {
                self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
                if self.remaining_seconds == 0 {
                    return TimerFired::Expired;
                }
                self.arm(scheduler, TimerKind::Tick, self.tick_interval);
                TimerFired::Tick {
                    remaining_seconds: self.remaining_seconds,
                }
            }
            TimerKind::SideSwitch => TimerFired::SideSwitchDue,
            TimerKind::Advance => TimerFired::AdvanceDue,
        }
    }

    fn arm<S: Scheduler>(&mut self, scheduler: &mut S, kind: TimerKind, delay: Duration) -> bool {
        let token = TimerToken {
            generation: self.generation,
            kind,
        };
        match scheduler.schedule(token, delay) {
            Ok(()) => {
                self.live = Some(token);
                true
            }
            Err(e) => {
                tracing::warn!("{}; continuing in manual-only mode", e);
                self.manual_only = true;
                false
            }
        }
    }
}
