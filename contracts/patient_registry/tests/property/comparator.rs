#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]
//! Properties of the field comparator.
//!
//! Invariants tested:
//! - Two numeric values conflict exactly when their distance exceeds the
//!   tolerance.
//! - Every input value is within tolerance of some surviving representative.
//! - Union and intersection are sound with respect to every input list.
//! - Membership comparison is order-insensitive.

use proptest::prelude::*;
use soroban_sdk::{Env, String, Vec};

use patient_registry::comparator::{
    compare_lists, compare_text, compare_uint, spread_exceeds, HEIGHT_TOL_MM,
};

fn to_words(env: &Env, seeds: &std::vec::Vec<u8>) -> Vec<String> {
    let mut out = Vec::new(env);
    for s in seeds {
        let word = std::format!("item{}", s % 7);
        out.push_back(String::from_str(env, &word));
    }
    out
}

fn contains(list: &Vec<String>, item: &String) -> bool {
    let mut found = false;
    for v in list.iter() {
        if v == *item {
            found = true;
            break;
        }
    }
    found
}

proptest! {
    /// For exactly two measurements, conflict ⇔ |a − b| > tolerance.
    #[test]
    fn pair_conflict_matches_tolerance(a in 1_000u32..2_500u32, b in 1_000u32..2_500u32) {
        let env = Env::default();
        let mut values = Vec::new(&env);
        values.push_back(a);
        values.push_back(b);

        let (_, conflict) = compare_uint(&env, &values, HEIGHT_TOL_MM);
        prop_assert_eq!(conflict, a.abs_diff(b) > HEIGHT_TOL_MM);
        prop_assert_eq!(spread_exceeds(&values, HEIGHT_TOL_MM), a.abs_diff(b) > HEIGHT_TOL_MM);
    }

    /// Every input is within tolerance of a surviving representative, and
    /// representatives never shrink below one for non-empty input.
    #[test]
    fn representatives_cover_all_inputs(
        seeds in prop::collection::vec(1_000u32..2_500u32, 1..8),
        tol in 0u32..50u32,
    ) {
        let env = Env::default();
        let mut values = Vec::new(&env);
        for s in &seeds {
            values.push_back(*s);
        }

        let (distinct, conflict) = compare_uint(&env, &values, tol);
        prop_assert!(distinct.len() >= 1);
        prop_assert!(distinct.len() <= values.len());
        prop_assert_eq!(conflict, distinct.len() > 1);

        for v in values.iter() {
            let mut covered = false;
            for kept in distinct.iter() {
                if v.abs_diff(kept) <= tol {
                    covered = true;
                    break;
                }
            }
            prop_assert!(covered, "value {} not covered by any representative", v);
        }
    }

    /// Text deduplication never conflicts on a single distinct value, no
    /// matter how often it repeats.
    #[test]
    fn repeated_value_never_conflicts(n in 1usize..10usize) {
        let env = Env::default();
        let mut values = Vec::new(&env);
        for _ in 0..n {
            values.push_back(String::from_str(&env, "O+"));
        }
        let (distinct, conflict) = compare_text(&env, &values);
        prop_assert_eq!(distinct.len(), 1);
        prop_assert!(!conflict);
    }

    /// Union contains every member of every list; intersection members are
    /// in every list.
    #[test]
    fn union_and_intersection_are_sound(
        list_seeds in prop::collection::vec(prop::collection::vec(0u8..30u8, 0..6), 1..5),
    ) {
        let env = Env::default();
        let mut lists = Vec::new(&env);
        for seeds in &list_seeds {
            lists.push_back(to_words(&env, seeds));
        }

        let cmp = compare_lists(&env, &lists);

        for list in lists.iter() {
            for v in list.iter() {
                prop_assert!(contains(&cmp.union, &v));
            }
        }
        for v in cmp.intersection.iter() {
            for list in lists.iter() {
                prop_assert!(contains(&list, &v));
            }
        }
    }

    /// Rotating a list never creates a conflict against the original.
    #[test]
    fn rotation_is_not_a_conflict(
        seeds in prop::collection::vec(0u8..30u8, 1..6),
        shift in 0usize..6usize,
    ) {
        let env = Env::default();
        let original = to_words(&env, &seeds);

        let mut rotated_seeds = seeds.clone();
        rotated_seeds.rotate_left(shift % seeds.len().max(1));
        let rotated = to_words(&env, &rotated_seeds);

        let mut lists = Vec::new(&env);
        lists.push_back(original);
        lists.push_back(rotated);

        let cmp = compare_lists(&env, &lists);
        prop_assert!(!cmp.conflict);
    }
}
