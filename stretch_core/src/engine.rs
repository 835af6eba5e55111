//! Exercise playback engine.
//!
//! `PlaybackEngine` owns the single live `PlaybackSession` together with the
//! `TimerController` that drives it, and applies user commands and timer
//! callbacks to it. Starting another routine replaces the session wholesale.
//!
//! ## Slot state machine
//!
//! ```text
//! idle --play--> running --pause--> paused --play--> running
//! running --tick--> running (remaining - 1)
//! running --tick to 0--> expired
//! expired --side-switch delay--> running (second side)
//! expired --advance delay--> running (next exercise)
//! expired --last slot--> completed
//! ```
//!
//! Every command that moves the session cancels the live schedule first,
//! so a delay that was pending can never land on a newer slot.

use crate::catalog::RoutineCatalog;
use crate::config::PlaybackConfig;
use crate::events::{EventSink, PlaybackEvent};
use crate::scheduler::{saturating_millis, Scheduler, TimerKind, TimerToken, VirtualScheduler};
use crate::timer::{TimerController, TimerFired};
use crate::transition::{decide, Transition};
use crate::{
    CompletionStats, Error, Exercise, Phase, PlaybackSnapshot, Result, Routine, Side,
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

const MS_PER_MINUTE: u64 = 60_000;

/// Mutable playback state for one run through one routine
#[derive(Clone, Debug)]
pub struct PlaybackSession {
    session_id: Uuid,
    routine: Routine,
    current_index: usize,
    current_side: Side,
    remaining_seconds: u32,
    phase: Phase,
    started_at: DateTime<Utc>,
    started_at_ms: u64,
}

impl PlaybackSession {
    fn new(routine: Routine, now_ms: u64) -> Result<Self> {
        let first = routine
            .exercises
            .first()
            .ok_or_else(|| Error::InvalidRoutine(routine.id.clone()))?;
        let remaining_seconds = first.base_duration_seconds;

        Ok(Self {
            session_id: Uuid::new_v4(),
            routine,
            current_index: 0,
            current_side: Side::First,
            remaining_seconds,
            phase: Phase::Idle,
            started_at: Utc::now(),
            started_at_ms: now_ms,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn routine_id(&self) -> &str {
        &self.routine.id
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.routine.exercises
    }

    pub fn total(&self) -> usize {
        self.routine.exercises.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_side(&self) -> Side {
        self.current_side
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn current_exercise(&self) -> &Exercise {
        // current_index is only ever set through enter_slot, which bounds it
        &self.routine.exercises[self.current_index]
    }

    fn is_last(&self) -> bool {
        self.current_index + 1 >= self.total()
    }

    /// Move to `(index, side)` with a full countdown for that slot
    fn enter_slot(&mut self, index: usize, side: Side) {
        let index = index.min(self.total() - 1);
        let exercise = &self.routine.exercises[index];
        self.current_index = index;
        self.current_side = if exercise.needs_side_switch {
            side
        } else {
            Side::First
        };
        self.remaining_seconds = exercise.base_duration_seconds;
    }

    fn exercise_changed(&self) -> PlaybackEvent {
        PlaybackEvent::ExerciseChanged {
            exercise: self.current_exercise().clone(),
            index: self.current_index,
            total: self.total(),
            side: self.current_side,
        }
    }

    fn completion_stats(&self, now_ms: u64) -> CompletionStats {
        CompletionStats {
            session_id: self.session_id,
            routine_id: self.routine.id.clone(),
            total_exercises: self.total(),
            elapsed_minutes: now_ms.saturating_sub(self.started_at_ms) / MS_PER_MINUTE,
            started_at: self.started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            routine_id: self.routine.id.clone(),
            exercise_id: self.current_exercise().id.clone(),
            index: self.current_index,
            total: self.total(),
            side: self.current_side,
            remaining_seconds: self.remaining_seconds,
            phase: self.phase,
        }
    }
}

/// Orchestrates a `PlaybackSession` with its timer, catalog and presenter
pub struct PlaybackEngine<C, S, E> {
    catalog: C,
    scheduler: S,
    sink: E,
    timer: TimerController,
    config: PlaybackConfig,
    session: Option<PlaybackSession>,
}

impl<C, S, E> PlaybackEngine<C, S, E>
where
    C: RoutineCatalog,
    S: Scheduler,
    E: EventSink,
{
    pub fn new(catalog: C, scheduler: S, sink: E) -> Self {
        Self::with_config(catalog, scheduler, sink, PlaybackConfig::default())
    }

    /// A zero tick interval falls back to the default one-second tick
    pub fn with_config(catalog: C, scheduler: S, sink: E, mut config: PlaybackConfig) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!("{}; using default tick interval", e);
            config.tick_interval_ms = PlaybackConfig::default().tick_interval_ms;
        }
        Self {
            catalog,
            scheduler,
            sink,
            timer: TimerController::new(config.tick_interval()),
            config,
            session: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Lifecycle phase; `Idle` when no routine is loaded
    pub fn phase(&self) -> Phase {
        self.session.as_ref().map(|s| s.phase).unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        self.session.as_ref().map(PlaybackSession::snapshot)
    }

    pub fn is_manual_only(&self) -> bool {
        self.timer.is_manual_only()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Load `routine_id` and replace the current session with a fresh one
    ///
    /// On failure the existing session, if any, is left as it was.
    pub fn start(&mut self, routine_id: &str) -> Result<()> {
        let routine = self
            .catalog
            .get_routine(routine_id)
            .ok_or_else(|| Error::RoutineNotFound(routine_id.to_string()))?;
        let session = PlaybackSession::new(routine, self.scheduler.now_ms())?;

        self.timer.cancel(&mut self.scheduler);
        tracing::info!(
            "Starting routine '{}' ({} exercises, session {})",
            session.routine_id(),
            session.total(),
            session.session_id()
        );
        let event = session.exercise_changed();
        self.session = Some(session);
        self.sink.emit(event);
        Ok(())
    }

    /// Start or resume the countdown. No-op while already running.
    pub fn play(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !matches!(session.phase, Phase::Idle | Phase::Paused) {
            return;
        }
        session.phase = Phase::Running;
        let remaining = session.remaining_seconds;
        self.timer.start(&mut self.scheduler, remaining);
        tracing::debug!("Playing with {}s remaining", remaining);
    }

    /// Stop the countdown, keeping the remaining time
    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase != Phase::Running {
            return;
        }
        session.phase = Phase::Paused;
        self.timer.pause(&mut self.scheduler);
        tracing::debug!("Paused with {}s remaining", session.remaining_seconds);
    }

    /// Convenience for a single play/pause button
    pub fn toggle(&mut self) {
        if self.phase() == Phase::Running {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump to the next exercise (or complete) and keep running
    ///
    /// A pending second side is not visited: skipping the first side of a
    /// bilateral exercise moves straight on to the following exercise.
    pub fn skip(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.phase == Phase::Completed {
            return;
        }
        let (index, is_last) = (session.current_index, session.is_last());

        self.timer.cancel(&mut self.scheduler);
        if is_last {
            self.complete();
        } else {
            tracing::debug!("Skipping to exercise {}", index + 1);
            self.enter_slot(index + 1, Side::First, true);
        }
    }

    /// Manual navigation forward; no-op on the last exercise
    pub fn next(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.phase == Phase::Completed || session.is_last() {
            return;
        }
        let target = session.current_index + 1;
        self.enter_slot(target, Side::First, false);
    }

    /// Manual navigation backward; no-op on the first exercise
    pub fn previous(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.phase == Phase::Completed || session.current_index == 0 {
            return;
        }
        let target = session.current_index - 1;
        self.enter_slot(target, Side::First, false);
    }

    /// Cancel everything and drop the routine
    pub fn reset(&mut self) {
        self.timer.cancel(&mut self.scheduler);
        if let Some(session) = self.session.take() {
            tracing::info!("Reset session {}", session.session_id());
        }
    }

    // ------------------------------------------------------------------------
    // Timer callbacks
    // ------------------------------------------------------------------------

    /// Host callback entry point for a fired token
    pub fn handle_timer(&mut self, token: TimerToken) {
        match self.timer.on_fired(&mut self.scheduler, token) {
            TimerFired::Stale => {}
            TimerFired::Tick { remaining_seconds } => {
                if let Some(session) = self.session.as_mut() {
                    session.remaining_seconds = remaining_seconds;
                }
                self.sink.emit(PlaybackEvent::Tick { remaining_seconds });
            }
            TimerFired::Expired => self.on_expired(),
            TimerFired::SideSwitchDue => {
                if let Some(index) = self.session.as_ref().map(|s| s.current_index) {
                    self.enter_slot(index, Side::Second, true);
                }
            }
            TimerFired::AdvanceDue => {
                if let Some(index) = self.session.as_ref().map(|s| s.current_index) {
                    self.enter_slot(index + 1, Side::First, true);
                }
            }
        }
    }

    /// Deliver every token that is due now; returns how many fired
    pub fn pump(&mut self) -> usize {
        let mut fired = 0;
        while let Some(token) = self.scheduler.pop_due() {
            self.handle_timer(token);
            fired += 1;
        }
        fired
    }

    fn on_expired(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.remaining_seconds = 0;
        session.phase = Phase::Expired;
        let index = session.current_index;
        let transition = decide(
            session.current_exercise(),
            session.current_side,
            index,
            session.total(),
        );

        self.sink.emit(PlaybackEvent::Tick {
            remaining_seconds: 0,
        });
        self.sink.emit(PlaybackEvent::Expired);
        tracing::debug!("Exercise {} expired, next: {:?}", index, transition);

        match transition {
            Transition::SideSwitch => {
                self.sink.emit(PlaybackEvent::SideSwitchAnnounced);
                let delay = self.config.side_switch_delay();
                if !self
                    .timer
                    .schedule_delay(&mut self.scheduler, TimerKind::SideSwitch, delay)
                {
                    self.enter_slot(index, Side::Second, true);
                }
            }
            Transition::AdvanceTo(next) => {
                let delay = self.config.advance_delay();
                if !self
                    .timer
                    .schedule_delay(&mut self.scheduler, TimerKind::Advance, delay)
                {
                    self.enter_slot(next, Side::First, true);
                }
            }
            Transition::Completed => self.complete(),
        }
    }

    fn enter_slot(&mut self, index: usize, side: Side, run: bool) {
        self.timer.cancel(&mut self.scheduler);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.enter_slot(index, side);
        session.phase = if run { Phase::Running } else { Phase::Idle };
        let remaining = session.remaining_seconds;
        let event = session.exercise_changed();

        self.sink.emit(event);
        if run {
            self.timer.start(&mut self.scheduler, remaining);
        }
    }

    fn complete(&mut self) {
        self.timer.cancel(&mut self.scheduler);
        let now_ms = self.scheduler.now_ms();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase = Phase::Completed;
        let stats = session.completion_stats(now_ms);
        tracing::info!(
            "Completed routine '{}': {} exercises in {} min",
            stats.routine_id,
            stats.total_exercises,
            stats.elapsed_minutes
        );
        self.sink.emit(PlaybackEvent::Completed(stats));
    }
}

impl<C, E> PlaybackEngine<C, VirtualScheduler, E>
where
    C: RoutineCatalog,
    E: EventSink,
{
    /// Move virtual time forward, firing every callback due on the way
    pub fn advance(&mut self, duration: Duration) {
        let target = self
            .scheduler
            .now_ms()
            .saturating_add(saturating_millis(duration));
        while let Some(due) = self.scheduler.next_due_ms() {
            if due > target {
                break;
            }
            self.scheduler.set_now(due);
            self.pump();
        }
        self.scheduler.set_now(target);
    }

    /// Jump to the next deadline and fire it; false when nothing is pending
    pub fn step(&mut self) -> bool {
        match self.scheduler.next_due_ms() {
            Some(due) => {
                self.scheduler.set_now(due);
                self.pump();
                true
            }
            None => false,
        }
    }
}
