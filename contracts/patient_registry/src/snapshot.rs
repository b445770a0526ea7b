//! Builds the reconciled view of one identity from all of its profiles.
//!
//! Input profiles arrive most-recent-first; every wrapper reports the latest
//! non-empty value plus the distinct alternatives and a conflict flag. With
//! a single contributing profile that carries a rollback snapshot, the view
//! switches to a timeline diff against the approved baseline: changes are
//! flagged `changed` instead of `conflict`, because a doctor revising their
//! own approved record is not a multi-doctor disagreement.

use soroban_sdk::{Env, String, Vec};

use crate::comparator::{
    self, HEIGHT_TOL_MM, WEIGHT_TOL_G,
};
use crate::types::{
    FieldId, FieldValue, FlagWrapper, HealthSnapshot, ListView, LocationEntry, Profile,
    RollbackSnapshot, SourceRef, TextWrapper, UintWrapper,
};
use crate::validation::{blood_text, gender_text};

// ── Wrapper construction ────────────────────────────────────────────────────

fn text_wrapper(env: &Env, values: &Vec<String>) -> TextWrapper {
    let (alternatives, conflict) = comparator::compare_text(env, values);
    TextWrapper {
        value: alternatives.first(),
        conflict,
        alternatives,
        changed: false,
    }
}

fn uint_wrapper(env: &Env, values: &Vec<u32>, tol: u32) -> UintWrapper {
    let (alternatives, conflict) = comparator::compare_uint(env, values, tol);
    UintWrapper {
        value: alternatives.first(),
        conflict,
        alternatives,
        changed: false,
    }
}

fn flag_wrapper(env: &Env, values: &Vec<bool>) -> FlagWrapper {
    let (alternatives, conflict) = comparator::compare_flag(env, values);
    FlagWrapper {
        value: alternatives.first(),
        conflict,
        alternatives,
        changed: false,
    }
}

fn list_view(env: &Env, current: &Vec<String>, lists: &Vec<Vec<String>>) -> ListView {
    let cmp = comparator::compare_lists(env, lists);
    ListView {
        current: current.clone(),
        combined: cmp.union,
        common: cmp.intersection,
        conflict: cmp.conflict,
        changed: false,
    }
}

// ── Field collection ────────────────────────────────────────────────────────

fn collect_text(
    env: &Env,
    profiles: &Vec<Profile>,
    pick: impl Fn(&Profile) -> Option<String>,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new(env);
    for p in profiles.iter() {
        if let Some(v) = pick(&p) {
            if !v.is_empty() {
                out.push_back(v);
            }
        }
    }
    out
}

fn collect_uint(env: &Env, profiles: &Vec<Profile>, pick: impl Fn(&Profile) -> u32) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::new(env);
    for p in profiles.iter() {
        out.push_back(pick(&p));
    }
    out
}

fn collect_flag(env: &Env, profiles: &Vec<Profile>, pick: impl Fn(&Profile) -> bool) -> Vec<bool> {
    let mut out: Vec<bool> = Vec::new(env);
    for p in profiles.iter() {
        out.push_back(pick(&p));
    }
    out
}

fn collect_lists(
    env: &Env,
    profiles: &Vec<Profile>,
    pick: impl Fn(&Profile) -> Vec<String>,
) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = Vec::new(env);
    for p in profiles.iter() {
        out.push_back(pick(&p));
    }
    out
}

fn location_history(env: &Env, profiles: &Vec<Profile>) -> Vec<LocationEntry> {
    let mut out: Vec<LocationEntry> = Vec::new(env);
    for p in profiles.iter() {
        let entry = LocationEntry {
            country: p.country.clone(),
            state: p.state.clone(),
            city: p.city.clone(),
        };
        let mut seen = false;
        for existing in out.iter() {
            if existing == entry {
                seen = true;
                break;
            }
        }
        if !seen {
            out.push_back(entry);
        }
    }
    out
}

fn sources(env: &Env, profiles: &Vec<Profile>) -> Vec<SourceRef> {
    let mut out: Vec<SourceRef> = Vec::new(env);
    for p in profiles.iter() {
        out.push_back(SourceRef {
            profile_id: p.id,
            doctor: p.owner.clone(),
            updated_at: p.updated_at,
        });
    }
    out
}

// ── Baseline lookup ─────────────────────────────────────────────────────────

fn prev_value(snapshot: &RollbackSnapshot, id: FieldId) -> Option<FieldValue> {
    snapshot.fields.get(id)
}

fn prev_text(env: &Env, snapshot: &RollbackSnapshot, id: FieldId) -> Option<String> {
    match prev_value(snapshot, id) {
        Some(FieldValue::Text(s)) => Some(s),
        Some(FieldValue::Sex(g)) => Some(gender_text(env, &g)),
        Some(FieldValue::Blood(b)) => Some(blood_text(env, &b)),
        _ => None,
    }
}

fn prev_uint(snapshot: &RollbackSnapshot, id: FieldId) -> Option<u32> {
    match prev_value(snapshot, id) {
        Some(FieldValue::Uint(n)) => Some(n),
        _ => None,
    }
}

fn prev_flag(snapshot: &RollbackSnapshot, id: FieldId) -> Option<bool> {
    match prev_value(snapshot, id) {
        Some(FieldValue::Flag(f)) => Some(f),
        _ => None,
    }
}

fn prev_items(env: &Env, snapshot: &RollbackSnapshot, id: FieldId) -> Vec<String> {
    match prev_value(snapshot, id) {
        Some(FieldValue::Items(v)) => v,
        _ => Vec::new(env),
    }
}

// ── Baseline diff ───────────────────────────────────────────────────────────

fn attach_prev_text(env: &Env, w: &mut TextWrapper, prev: Option<String>) {
    if w.value == prev {
        return;
    }
    let mut alts: Vec<String> = Vec::new(env);
    if let Some(cur) = &w.value {
        alts.push_back(cur.clone());
    }
    if let Some(pv) = &prev {
        alts.push_back(pv.clone());
    }
    w.alternatives = alts;
    w.changed = true;
    w.conflict = false;
}

fn attach_prev_uint(env: &Env, w: &mut UintWrapper, prev: Option<u32>) {
    if w.value == prev {
        return;
    }
    let mut alts: Vec<u32> = Vec::new(env);
    if let Some(cur) = w.value {
        alts.push_back(cur);
    }
    if let Some(pv) = prev {
        alts.push_back(pv);
    }
    w.alternatives = alts;
    w.changed = true;
    w.conflict = false;
}

fn attach_prev_flag(env: &Env, w: &mut FlagWrapper, prev: Option<bool>) {
    if w.value == prev {
        return;
    }
    let mut alts: Vec<bool> = Vec::new(env);
    if let Some(cur) = w.value {
        alts.push_back(cur);
    }
    if let Some(pv) = prev {
        alts.push_back(pv);
    }
    w.alternatives = alts;
    w.changed = true;
    w.conflict = false;
}

/// Replaces the multi-doctor view of an array field with the approved
/// baseline: `common` becomes what was approved, `combined` the union of
/// both versions, `changed` whether content actually differs.
fn attach_prev_list(env: &Env, view: &mut ListView, prev: &Vec<String>) {
    if view.current.is_empty() && prev.is_empty() {
        return;
    }
    if comparator::same_members(&view.current, prev) {
        return;
    }
    view.common = prev.clone();
    view.combined = comparator::union_two(env, &view.current, prev);
    view.changed = true;
}

fn apply_baseline(env: &Env, snapshot: &mut HealthSnapshot, latest: &Profile) {
    let baseline = match &latest.rollback {
        Some(b) => b,
        None => return,
    };

    attach_prev_text(
        env,
        &mut snapshot.fullname_wrapper,
        prev_text(env, baseline, FieldId::Fullname),
    );
    attach_prev_flag(env, &mut snapshot.status, prev_flag(baseline, FieldId::Deceased));
    attach_prev_uint(env, &mut snapshot.age, prev_uint(baseline, FieldId::Age));
    attach_prev_text(env, &mut snapshot.gender, prev_text(env, baseline, FieldId::Gender));
    attach_prev_text(
        env,
        &mut snapshot.bloodtype,
        prev_text(env, baseline, FieldId::BloodType),
    );
    attach_prev_flag(
        env,
        &mut snapshot.organ_donor,
        prev_flag(baseline, FieldId::OrganDonor),
    );
    attach_prev_flag(
        env,
        &mut snapshot.blood_donor,
        prev_flag(baseline, FieldId::BloodDonor),
    );
    attach_prev_text(env, &mut snapshot.country, prev_text(env, baseline, FieldId::Country));
    attach_prev_text(env, &mut snapshot.state, prev_text(env, baseline, FieldId::State));
    attach_prev_text(env, &mut snapshot.city, prev_text(env, baseline, FieldId::City));
    attach_prev_text(env, &mut snapshot.phone, prev_text(env, baseline, FieldId::Phone));
    attach_prev_uint(env, &mut snapshot.height, prev_uint(baseline, FieldId::HeightMm));
    attach_prev_uint(env, &mut snapshot.weight, prev_uint(baseline, FieldId::WeightG));
    attach_prev_uint(env, &mut snapshot.bmi, prev_uint(baseline, FieldId::BmiTenths));

    attach_prev_list(
        env,
        &mut snapshot.diseases,
        &prev_items(env, baseline, FieldId::Diseases),
    );
    attach_prev_list(
        env,
        &mut snapshot.allergies,
        &prev_items(env, baseline, FieldId::Allergies),
    );
    attach_prev_list(
        env,
        &mut snapshot.medications,
        &prev_items(env, baseline, FieldId::Medications),
    );

    snapshot.approved_baseline_at = latest.approved_at;
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Builds the reconciled snapshot for one identity.
///
/// `profiles` must be ordered most-recent-first; returns `None` when the
/// identity has no records.
pub fn build_snapshot(
    env: &Env,
    email: Option<String>,
    profiles: &Vec<Profile>,
) -> Option<HealthSnapshot> {
    let latest = profiles.first()?;

    let heights = collect_uint(env, profiles, |p| p.height_mm);
    let weights = collect_uint(env, profiles, |p| p.weight_g);

    let mut snapshot = HealthSnapshot {
        fullname: latest.fullname.clone(),
        email,

        fullname_wrapper: text_wrapper(
            env,
            &collect_text(env, profiles, |p| Some(p.fullname.clone())),
        ),
        status: flag_wrapper(env, &collect_flag(env, profiles, |p| p.deceased)),
        age: uint_wrapper(env, &collect_uint(env, profiles, |p| p.age), 0),
        gender: text_wrapper(
            env,
            &collect_text(env, profiles, |p| Some(gender_text(env, &p.gender))),
        ),
        bloodtype: text_wrapper(
            env,
            &collect_text(env, profiles, |p| Some(blood_text(env, &p.bloodtype))),
        ),
        organ_donor: flag_wrapper(env, &collect_flag(env, profiles, |p| p.organ_donor)),
        blood_donor: flag_wrapper(env, &collect_flag(env, profiles, |p| p.blood_donor)),
        country: text_wrapper(env, &collect_text(env, profiles, |p| Some(p.country.clone()))),
        state: text_wrapper(env, &collect_text(env, profiles, |p| Some(p.state.clone()))),
        city: text_wrapper(env, &collect_text(env, profiles, |p| Some(p.city.clone()))),
        phone: text_wrapper(env, &collect_text(env, profiles, |p| p.phone.clone())),
        height: uint_wrapper(env, &heights, HEIGHT_TOL_MM),
        weight: uint_wrapper(env, &weights, WEIGHT_TOL_G),
        bmi: uint_wrapper(env, &collect_uint(env, profiles, |p| p.bmi_tenths), 0),

        measurement_system: latest.measurement_system.clone(),
        height_mm: latest.height_mm,
        weight_g: latest.weight_g,
        bmi_tenths: latest.bmi_tenths,
        bmi_category: latest.bmi_category.clone(),
        age_category: latest.age_category.clone(),
        deceased: latest.deceased,
        cause_of_death: latest.cause_of_death.clone(),

        height_conflict: comparator::spread_exceeds(&heights, HEIGHT_TOL_MM),
        weight_conflict: comparator::spread_exceeds(&weights, WEIGHT_TOL_G),

        diseases: list_view(
            env,
            &latest.diseases,
            &collect_lists(env, profiles, |p| p.diseases.clone()),
        ),
        allergies: list_view(
            env,
            &latest.allergies,
            &collect_lists(env, profiles, |p| p.allergies.clone()),
        ),
        medications: list_view(
            env,
            &latest.medications,
            &collect_lists(env, profiles, |p| p.medications.clone()),
        ),

        location_history: location_history(env, profiles),
        sources: sources(env, profiles),

        approved_baseline_at: None,
    };

    if profiles.len() == 1 {
        apply_baseline(env, &mut snapshot, &latest);
    }

    Some(snapshot)
}

/// Patient-view refinement: with several contributing profiles, the `common`
/// lists are recomputed as the intersection of the *other* doctors' lists,
/// so the patient sees what everyone but the most recent submitter agrees
/// on.
pub fn common_from_other_doctors(env: &Env, snapshot: &mut HealthSnapshot, profiles: &Vec<Profile>) {
    if profiles.len() <= 1 {
        return;
    }
    let mut others: Vec<Profile> = Vec::new(env);
    for i in 1..profiles.len() {
        others.push_back(profiles.get_unchecked(i));
    }

    snapshot.diseases.common = comparator::compare_lists(
        env,
        &collect_lists(env, &others, |p| p.diseases.clone()),
    )
    .intersection;
    snapshot.allergies.common = comparator::compare_lists(
        env,
        &collect_lists(env, &others, |p| p.allergies.clone()),
    )
    .intersection;
    snapshot.medications.common = comparator::compare_lists(
        env,
        &collect_lists(env, &others, |p| p.medications.clone()),
    )
    .intersection;
}
