//! Core domain types for the Stretch playback engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and routines (immutable catalog data)
//! - Playback sides and lifecycle phases
//! - Completion statistics and presenter snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Exercise and Routine Types
// ============================================================================

/// Longest hold a single exercise side may have
pub const MAX_EXERCISE_SECONDS: u32 = 60 * 60;

/// A single timed stretch.
///
/// Display text lives in the catalog's label table, keyed by `id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub id: String,
    pub base_duration_seconds: u32,
    pub needs_side_switch: bool,
}

impl Exercise {
    pub fn new(id: impl Into<String>, base_duration_seconds: u32, needs_side_switch: bool) -> Self {
        Self {
            id: id.into(),
            base_duration_seconds,
            needs_side_switch,
        }
    }

    /// Total hold time, counting both sides for bilateral exercises
    pub fn total_duration_seconds(&self) -> u32 {
        if self.needs_side_switch {
            self.base_duration_seconds.saturating_mul(2)
        } else {
            self.base_duration_seconds
        }
    }
}

/// An ordered, immutable snapshot of exercises handed to the engine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Routine {
    pub id: String,
    pub exercises: Vec<Exercise>,
}

impl Routine {
    pub fn total_duration_seconds(&self) -> u32 {
        self.exercises
            .iter()
            .map(Exercise::total_duration_seconds)
            .fold(0, u32::saturating_add)
    }
}

/// A named routine as stored in the catalog (exercise references by id)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutineDefinition {
    pub id: String,
    pub name: String,
    pub exercise_ids: Vec<String>,
}

// ============================================================================
// Playback State Types
// ============================================================================

/// Which side of a bilateral exercise is being held
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    First,
    Second,
}

/// Lifecycle tag of a playback session
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
    /// Countdown hit zero; a side-switch or advance delay may be pending
    Expired,
    Completed,
}

/// Summary produced once the final exercise/side finishes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionStats {
    pub session_id: Uuid,
    pub routine_id: String,
    pub total_exercises: usize,
    pub elapsed_minutes: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Read-only view of the current session for presenters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub routine_id: String,
    pub exercise_id: String,
    pub index: usize,
    pub total: usize,
    pub side: Side,
    pub remaining_seconds: u32,
    pub phase: Phase,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The complete catalog of exercises, their labels, and routine definitions
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: HashMap<String, Exercise>,
    pub labels: HashMap<String, String>,
    pub routines: HashMap<String, RoutineDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_duration_saturates_instead_of_overflowing() {
        let routine = Routine {
            id: "huge".into(),
            exercises: vec![
                Exercise::new("huge", 3_000_000_000, true),
                Exercise::new("neck_rolls", 30, false),
            ],
        };
        assert_eq!(routine.exercises[0].total_duration_seconds(), u32::MAX);
        assert_eq!(routine.total_duration_seconds(), u32::MAX);
    }

    #[test]
    fn test_total_duration_counts_both_sides() {
        assert_eq!(Exercise::new("arm_circles", 30, true).total_duration_seconds(), 60);
        assert_eq!(Exercise::new("neck_rolls", 30, false).total_duration_seconds(), 30);
    }
}
