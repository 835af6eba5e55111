//! What happens when an exercise slot's countdown expires.

use crate::{Exercise, Side};

/// Next playback state after natural expiry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Repeat the same exercise on the second side
    SideSwitch,
    AdvanceTo(usize),
    Completed,
}

/// Decide the transition for the slot `(exercise, side)` at `index` of `total`
pub fn decide(exercise: &Exercise, side: Side, index: usize, total: usize) -> Transition {
    if exercise.needs_side_switch && side == Side::First {
        Transition::SideSwitch
    } else if index + 1 < total {
        Transition::AdvanceTo(index + 1)
    } else {
        Transition::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cross_product() {
        let total = 3;
        for needs_side_switch in [false, true] {
            for side in [Side::First, Side::Second] {
                for index in [0, total - 1] {
                    let exercise = Exercise::new("x", 30, needs_side_switch);
                    let is_last = index == total - 1;
                    let expected = match (needs_side_switch, side, is_last) {
                        (true, Side::First, _) => Transition::SideSwitch,
                        (_, _, false) => Transition::AdvanceTo(index + 1),
                        (_, _, true) => Transition::Completed,
                    };
                    assert_eq!(
                        decide(&exercise, side, index, total),
                        expected,
                        "switch={} side={:?} index={}",
                        needs_side_switch,
                        side,
                        index
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_exercise_completes() {
        let exercise = Exercise::new("neck_rolls", 30, false);
        assert_eq!(decide(&exercise, Side::First, 0, 1), Transition::Completed);
    }

    #[test]
    fn test_last_bilateral_switches_before_completing() {
        let exercise = Exercise::new("arm_circles", 30, true);
        assert_eq!(decide(&exercise, Side::First, 1, 2), Transition::SideSwitch);
        assert_eq!(decide(&exercise, Side::Second, 1, 2), Transition::Completed);
    }
}
