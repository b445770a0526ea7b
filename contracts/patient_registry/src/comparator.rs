//! Field-level comparison across the profiles of one identity.
//!
//! Scalars deduplicate in first-appearance order (inputs arrive
//! most-recent-first, so the first survivor is the value the snapshot
//! reports); measurement fields deduplicate with an absolute-difference
//! tolerance. Array fields compare as sets, order-insensitive.

use soroban_sdk::{Env, String, Vec};

/// Height tolerance: 5 mm (~0.005 m). Two heights closer than this are the
/// same measurement taken twice.
pub const HEIGHT_TOL_MM: u32 = 5;
/// Weight tolerance: 100 g (~0.1 kg).
pub const WEIGHT_TOL_G: u32 = 100;

/// Union / intersection / disagreement summary of one array field.
pub struct ListComparison {
    pub union: Vec<String>,
    pub intersection: Vec<String>,
    pub conflict: bool,
}

fn contains_str(list: &Vec<String>, item: &String) -> bool {
    for v in list.iter() {
        if v == *item {
            return true;
        }
    }
    false
}

/// Deduplicates text values, dropping empties; conflict iff more than one
/// distinct value remains.
pub fn compare_text(env: &Env, values: &Vec<String>) -> (Vec<String>, bool) {
    let mut distinct: Vec<String> = Vec::new(env);
    for v in values.iter() {
        if v.is_empty() {
            continue;
        }
        if !contains_str(&distinct, &v) {
            distinct.push_back(v);
        }
    }
    let conflict = distinct.len() > 1;
    (distinct, conflict)
}

/// Deduplicates numeric values with tolerance `tol`: a value within `tol`
/// of an already-kept representative collapses into it. Pass `tol = 0` for
/// exact fields such as age.
pub fn compare_uint(env: &Env, values: &Vec<u32>, tol: u32) -> (Vec<u32>, bool) {
    let mut distinct: Vec<u32> = Vec::new(env);
    for v in values.iter() {
        let mut close = false;
        for kept in distinct.iter() {
            if v.abs_diff(kept) <= tol {
                close = true;
                break;
            }
        }
        if !close {
            distinct.push_back(v);
        }
    }
    let conflict = distinct.len() > 1;
    (distinct, conflict)
}

/// Deduplicates boolean values preserving first appearance.
pub fn compare_flag(env: &Env, values: &Vec<bool>) -> (Vec<bool>, bool) {
    let mut distinct: Vec<bool> = Vec::new(env);
    for v in values.iter() {
        let mut seen = false;
        for kept in distinct.iter() {
            if kept == v {
                seen = true;
                break;
            }
        }
        if !seen {
            distinct.push_back(v);
        }
    }
    let conflict = distinct.len() > 1;
    (distinct, conflict)
}

/// True when max − min across `values` exceeds `tol`. Matches the snapshot's
/// dedicated height/weight conflict flags, which look at the whole spread
/// rather than pairwise closeness.
pub fn spread_exceeds(values: &Vec<u32>, tol: u32) -> bool {
    if values.len() <= 1 {
        return false;
    }
    let mut min = u32::MAX;
    let mut max = 0u32;
    for v in values.iter() {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    max - min > tol
}

/// Set-equality over two (already deduplicated) lists.
pub fn same_members(a: &Vec<String>, b: &Vec<String>) -> bool {
    if a.len() != b.len() {
        return false;
    }
    for v in a.iter() {
        if !contains_str(b, &v) {
            return false;
        }
    }
    true
}

/// Compares the per-profile lists of one array field.
///
/// The union preserves first appearance; the intersection starts from the
/// first list and narrows. Conflict iff any two lists differ in size or
/// membership — a single contributing profile never conflicts.
pub fn compare_lists(env: &Env, lists: &Vec<Vec<String>>) -> ListComparison {
    let mut union: Vec<String> = Vec::new(env);
    for list in lists.iter() {
        for v in list.iter() {
            if !contains_str(&union, &v) {
                union.push_back(v);
            }
        }
    }

    let mut intersection: Vec<String> = Vec::new(env);
    if let Some(first) = lists.first() {
        for v in first.iter() {
            let mut everywhere = true;
            for i in 1..lists.len() {
                if let Some(other) = lists.get(i) {
                    if !contains_str(&other, &v) {
                        everywhere = false;
                        break;
                    }
                }
            }
            if everywhere && !contains_str(&intersection, &v) {
                intersection.push_back(v);
            }
        }
    }

    let mut conflict = false;
    if lists.len() > 1 {
        let first = lists.get_unchecked(0);
        for i in 1..lists.len() {
            if !same_members(&first, &lists.get_unchecked(i)) {
                conflict = true;
                break;
            }
        }
    }

    ListComparison {
        union,
        intersection,
        conflict,
    }
}

/// Deduplicated union of exactly two lists, first-appearance order. Used by
/// the single-doctor baseline diff.
pub fn union_two(env: &Env, a: &Vec<String>, b: &Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new(env);
    for v in a.iter() {
        if !contains_str(&out, &v) {
            out.push_back(v);
        }
    }
    for v in b.iter() {
        if !contains_str(&out, &v) {
            out.push_back(v);
        }
    }
    out
}
