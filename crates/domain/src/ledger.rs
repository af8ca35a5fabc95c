//! Resource ledger - the single place resource arithmetic happens.
//!
//! `apply` is pure and total: it never fails, it only clamps. Callers decide
//! whether a bundle should be applied at all (an unaffordable cast is refused
//! before the ledger is ever consulted).
//!
//! For each capped resource the maximum moves first (floored at 1), then the
//! current value moves and is clamped to `[0, new_max]`. Health has no maximum
//! and is floored at 0.

use crate::value_objects::{ResourceDelta, Vitals};

/// Applies `delta` to `vitals` and returns the result.
pub fn apply(vitals: Vitals, delta: &ResourceDelta) -> Vitals {
    let (sanity, max_sanity) = adjust_capped(
        vitals.sanity(),
        vitals.max_sanity(),
        delta.sanity,
        delta.max_sanity,
    );
    let (travel, max_travel) = adjust_capped(
        vitals.travel(),
        vitals.max_travel(),
        delta.travel,
        delta.max_travel,
    );
    let (spirit, max_spirit) = adjust_capped(
        vitals.spirit(),
        vitals.max_spirit(),
        delta.spirit,
        delta.max_spirit,
    );

    Vitals::new(
        vitals.hp().saturating_add(delta.hp).max(0),
        (sanity, max_sanity),
        (travel, max_travel),
        (spirit, max_spirit),
    )
}

/// Sets spirit to its current maximum.
pub fn restore_spirit(vitals: Vitals) -> Vitals {
    Vitals::new(
        vitals.hp(),
        (vitals.sanity(), vitals.max_sanity()),
        (vitals.travel(), vitals.max_travel()),
        (vitals.max_spirit(), vitals.max_spirit()),
    )
}

fn adjust_capped(current: i32, max: i32, current_delta: i32, max_delta: i32) -> (i32, i32) {
    let max = max.saturating_add(max_delta).max(1);
    let current = current.saturating_add(current_delta).clamp(0, max);
    (current, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(sanity: (i32, i32)) -> Vitals {
        Vitals::new(10, sanity, (5, 5), (4, 8))
    }

    #[test]
    fn negative_quest_reward_floors_at_zero() {
        let after = apply(vitals((2, 10)), &ResourceDelta::ZERO.with_sanity(-3));
        assert_eq!(after.sanity(), 0);
        assert_eq!(after.max_sanity(), 10);
    }

    #[test]
    fn reward_is_capped_by_grown_maximum() {
        let delta = ResourceDelta::ZERO.with_sanity(20).with_max_sanity(2);
        let after = apply(vitals((9, 10)), &delta);
        assert_eq!(after.max_sanity(), 12);
        assert_eq!(after.sanity(), 12);
    }

    #[test]
    fn shrinking_maximum_reclamps_current_and_floors_at_one() {
        let delta = ResourceDelta::ZERO.with_max_spirit(-20);
        let after = apply(vitals((5, 10)), &delta);
        assert_eq!(after.max_spirit(), 1);
        assert_eq!(after.spirit(), 1);
    }

    #[test]
    fn health_has_floor_but_no_ceiling() {
        let up = apply(vitals((5, 10)), &ResourceDelta::ZERO.with_hp(500));
        assert_eq!(up.hp(), 510);
        let down = apply(vitals((5, 10)), &ResourceDelta::ZERO.with_hp(-500));
        assert_eq!(down.hp(), 0);
    }

    #[test]
    fn extreme_deltas_saturate_instead_of_overflowing() {
        let delta = ResourceDelta::ZERO
            .with_hp(i32::MAX)
            .with_spirit(i32::MAX)
            .with_max_spirit(i32::MAX);
        let after = apply(vitals((5, 10)), &delta);
        assert_eq!(after.hp(), i32::MAX);
        assert_eq!(after.max_spirit(), i32::MAX);
        assert_eq!(after.spirit(), i32::MAX);
    }

    #[test]
    fn capped_invariants_hold_across_mixed_bundles() {
        let starts = [(0, 1), (1, 1), (2, 10), (10, 10)];
        let steps = [-25, -3, -1, 0, 1, 3, 25];

        for (current, max) in starts {
            for current_delta in steps {
                for max_delta in steps {
                    let delta = ResourceDelta::ZERO
                        .with_sanity(current_delta)
                        .with_max_sanity(max_delta)
                        .with_travel(current_delta)
                        .with_max_travel(max_delta)
                        .with_spirit(current_delta)
                        .with_max_spirit(max_delta)
                        .with_hp(current_delta);
                    let start = Vitals::new(3, (current, max), (current, max), (current, max));
                    let after = apply(start, &delta);

                    for (cur, cap) in [
                        (after.sanity(), after.max_sanity()),
                        (after.travel(), after.max_travel()),
                        (after.spirit(), after.max_spirit()),
                    ] {
                        assert!(cap >= 1, "max below 1 for {delta:?}");
                        assert!((0..=cap).contains(&cur), "current out of range for {delta:?}");
                    }
                    assert!(after.hp() >= 0);
                }
            }
        }
    }

    #[test]
    fn restore_spirit_fills_pool() {
        let after = restore_spirit(vitals((5, 10)));
        assert_eq!(after.spirit(), 8);
        assert_eq!(after.sanity(), 5);
    }
}
