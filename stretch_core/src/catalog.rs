//! Default catalog of exercises and routine definitions.
//!
//! This module provides the built-in stretches and routines, the
//! `RoutineCatalog` lookup the playback engine depends on, and the
//! merge of user-defined content from the config file.

use crate::config::Config;
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Read-only routine lookup used by the playback engine
pub trait RoutineCatalog {
    /// Resolve a routine id to an owned snapshot of its exercises
    fn get_routine(&self, id: &str) -> Option<Routine>;
}

impl<T: RoutineCatalog + ?Sized> RoutineCatalog for &T {
    fn get_routine(&self, id: &str) -> Option<Routine> {
        (**self).get_routine(id)
    }
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with built-in exercises and routines
///
/// **Note**: prefer `get_default_catalog()` unless the catalog is about to
/// be extended with config content.
pub fn build_default_catalog() -> Catalog {
    let mut catalog = Catalog::default();

    // ========================================================================
    // Exercises: (id, label, seconds, needs side switch)
    // ========================================================================

    let exercises: [(&str, &str, u32, bool); 15] = [
        ("neck_rolls", "Neck Rolls", 30, false),
        ("arm_circles", "Arm Circles", 30, true),
        ("shoulder_shrugs", "Shoulder Shrugs", 20, false),
        ("chest_opener", "Chest Opener", 30, false),
        ("cat_cow", "Cat-Cow", 45, false),
        ("childs_pose", "Child's Pose", 60, false),
        ("cobra", "Cobra", 30, false),
        ("side_bend", "Standing Side Bend", 20, true),
        ("seated_twist", "Seated Spinal Twist", 30, true),
        ("hamstring_stretch", "Hamstring Stretch", 30, true),
        ("quad_stretch", "Standing Quad Stretch", 30, true),
        ("calf_stretch", "Wall Calf Stretch", 30, true),
        ("hip_flexor_lunge", "Kneeling Hip Flexor Lunge", 45, true),
        ("butterfly", "Butterfly", 45, false),
        ("figure_four", "Figure Four", 40, true),
    ];

    for (id, label, seconds, switch) in exercises {
        catalog.add_exercise(Exercise::new(id, seconds, switch), label);
    }

    // ========================================================================
    // Routines
    // ========================================================================

    catalog.add_routine(
        "morning_wakeup",
        "Morning Wake-Up",
        &[
            "neck_rolls",
            "arm_circles",
            "cat_cow",
            "side_bend",
            "hamstring_stretch",
            "childs_pose",
        ],
    );

    catalog.add_routine(
        "desk_break",
        "Desk Break",
        &["neck_rolls", "shoulder_shrugs", "chest_opener", "seated_twist"],
    );

    catalog.add_routine(
        "hip_opener",
        "Hip Opener",
        &["butterfly", "hip_flexor_lunge", "figure_four", "childs_pose"],
    );

    catalog.add_routine(
        "runner_recovery",
        "Runner Recovery",
        &[
            "quad_stretch",
            "hamstring_stretch",
            "calf_stretch",
            "hip_flexor_lunge",
        ],
    );

    catalog.add_routine(
        "evening_wind_down",
        "Evening Wind-Down",
        &["cat_cow", "cobra", "seated_twist", "figure_four", "childs_pose"],
    );

    catalog
}

impl Catalog {
    pub fn add_exercise(&mut self, exercise: Exercise, label: impl Into<String>) {
        self.labels.insert(exercise.id.clone(), label.into());
        self.exercises.insert(exercise.id.clone(), exercise);
    }

    pub fn add_routine(&mut self, id: &str, name: &str, exercise_ids: &[&str]) {
        self.routines.insert(
            id.to_string(),
            RoutineDefinition {
                id: id.to_string(),
                name: name.to_string(),
                exercise_ids: exercise_ids.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    /// Display label for an exercise or routine id, falling back to the id
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels
            .get(id)
            .map(String::as_str)
            .or_else(|| self.routines.get(id).map(|r| r.name.as_str()))
            .unwrap_or(id)
    }

    /// Routine ids in stable (sorted) order
    pub fn routine_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.routines.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Add user-defined exercises and routines from the config file
    ///
    /// Entries with an id already present replace the built-in one.
    pub fn merge_config(&mut self, config: &Config) {
        for custom in &config.exercises {
            if self.exercises.contains_key(&custom.id) {
                tracing::warn!("Custom exercise '{}' overrides built-in", custom.id);
            }
            self.add_exercise(
                Exercise::new(
                    custom.id.clone(),
                    custom.duration_seconds,
                    custom.needs_side_switch,
                ),
                custom.name.clone(),
            );
        }

        for custom in &config.routines {
            if self.routines.contains_key(&custom.id) {
                tracing::warn!("Custom routine '{}' overrides built-in", custom.id);
            }
            self.routines.insert(
                custom.id.clone(),
                RoutineDefinition {
                    id: custom.id.clone(),
                    name: custom.name.clone(),
                    exercise_ids: custom.exercises.clone(),
                },
            );
        }
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if id.is_empty() || exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.base_duration_seconds == 0 {
                errors.push(format!("Exercise '{}' has zero duration", id));
            }
            if exercise.base_duration_seconds > MAX_EXERCISE_SECONDS {
                errors.push(format!(
                    "Exercise '{}' duration {}s exceeds {}s",
                    id, exercise.base_duration_seconds, MAX_EXERCISE_SECONDS
                ));
            }
            if !self.labels.contains_key(id) {
                errors.push(format!("Exercise '{}' has no label", id));
            }
        }

        for (id, def) in &self.routines {
            if id.is_empty() || def.id.is_empty() {
                errors.push("Routine has empty ID".to_string());
            }
            if id != &def.id {
                errors.push(format!(
                    "Routine key '{}' doesn't match routine.id '{}'",
                    id, def.id
                ));
            }
            if def.name.is_empty() {
                errors.push(format!("Routine '{}' has empty name", id));
            }
            if def.exercise_ids.is_empty() {
                errors.push(format!("Routine '{}' has no exercises", id));
            }

            for exercise_id in &def.exercise_ids {
                if !self.exercises.contains_key(exercise_id) {
                    errors.push(format!(
                        "Routine '{}' references non-existent exercise '{}'",
                        id, exercise_id
                    ));
                }
            }
        }

        errors
    }
}

impl RoutineCatalog for Catalog {
    /// `None` when any referenced exercise is unknown
    fn get_routine(&self, id: &str) -> Option<Routine> {
        let def = self.routines.get(id)?;
        let exercises = def
            .exercise_ids
            .iter()
            .map(|exercise_id| {
                let exercise = self.exercises.get(exercise_id);
                if exercise.is_none() {
                    tracing::warn!(
                        "Routine '{}' references unknown exercise '{}'",
                        id,
                        exercise_id
                    );
                }
                exercise.cloned()
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Routine {
            id: def.id.clone(),
            exercises,
        })
    }
}

/// Routines held directly in memory, keyed by id
impl RoutineCatalog for HashMap<String, Routine> {
    fn get_routine(&self, id: &str) -> Option<Routine> {
        self.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CustomExercise, CustomRoutine};

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.exercises.len(), 15);
        assert_eq!(catalog.routines.len(), 5);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = get_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_get_routine_preserves_order() {
        let catalog = get_default_catalog();
        let routine = catalog.get_routine("desk_break").unwrap();
        let ids: Vec<_> = routine.exercises.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["neck_rolls", "shoulder_shrugs", "chest_opener", "seated_twist"]
        );
    }

    #[test]
    fn test_unknown_routine_returns_none() {
        assert!(get_default_catalog().get_routine("nope").is_none());
    }

    #[test]
    fn test_total_duration_counts_both_sides() {
        let catalog = get_default_catalog();
        let routine = catalog.get_routine("desk_break").unwrap();
        // 30 + 20 + 30 + 2 * 30
        assert_eq!(routine.total_duration_seconds(), 140);
    }

    #[test]
    fn test_labels_resolve_by_id() {
        let catalog = get_default_catalog();
        assert_eq!(catalog.label("childs_pose"), "Child's Pose");
        assert_eq!(catalog.label("hip_opener"), "Hip Opener");
        assert_eq!(catalog.label("unknown_id"), "unknown_id");
    }

    #[test]
    fn test_routine_ids_sorted() {
        let catalog = get_default_catalog();
        let ids = catalog.routine_ids();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_merge_config_adds_custom_content() {
        let mut catalog = build_default_catalog();
        let config = Config {
            exercises: vec![CustomExercise {
                id: "wrist_flexor".into(),
                name: "Wrist Flexor Stretch".into(),
                duration_seconds: 20,
                needs_side_switch: true,
            }],
            routines: vec![CustomRoutine {
                id: "typist".into(),
                name: "Typist Break".into(),
                exercises: vec!["wrist_flexor".into(), "neck_rolls".into()],
            }],
            ..Config::default()
        };

        catalog.merge_config(&config);

        assert!(catalog.validate().is_empty());
        let routine = catalog.get_routine("typist").unwrap();
        assert_eq!(routine.exercises.len(), 2);
        assert!(routine.exercises[0].needs_side_switch);
        assert_eq!(catalog.label("wrist_flexor"), "Wrist Flexor Stretch");
    }

    #[test]
    fn test_routine_with_dangling_exercise_is_not_resolved() {
        let mut catalog = build_default_catalog();
        catalog.add_routine("partial", "Partial", &["neck_rolls", "missing_stretch"]);

        assert!(catalog.get_routine("partial").is_none());
    }

    #[test]
    fn test_validate_rejects_oversized_duration() {
        let mut catalog = build_default_catalog();
        let config = Config {
            exercises: vec![CustomExercise {
                id: "marathon_hold".into(),
                name: "Marathon Hold".into(),
                duration_seconds: 3_000_000_000,
                needs_side_switch: true,
            }],
            ..Config::default()
        };
        catalog.merge_config(&config);

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("marathon_hold")));
    }

    #[test]
    fn test_validate_flags_dangling_and_empty_routines() {
        let mut catalog = build_default_catalog();
        catalog.add_routine("broken", "Broken", &["missing_stretch"]);
        catalog.add_routine("empty", "Empty", &[]);

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("missing_stretch")));
        assert!(errors.iter().any(|e| e.contains("'empty' has no exercises")));
    }
}
