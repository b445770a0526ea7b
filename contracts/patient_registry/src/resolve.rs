//! The approve / reject resolvers — the two triggers that make every
//! doctor's copy of an identity converge again.
//!
//! Both run inside a single contract invocation, so propagation across the
//! identity group is atomic: either every profile is updated and the
//! decision recorded, or the whole call traps and nothing is.

use medrec_common::text;
use soroban_sdk::{Env, Map, String, Vec};

use crate::decision;
use crate::notes;
use crate::profiles;
use crate::snapshot;
use crate::types::{
    ContractError, FieldId, FieldValue, HealthSnapshot, PortalUser, Profile, RejectOutcome,
    RollbackSnapshot,
};
use crate::validation::{parse_blood, parse_gender};

/// Canonicalises the chosen profile across the whole identity and records
/// the decision. The rollback snapshot and approval time are stamped onto
/// every copy so a later rejection can restore exactly this state.
pub fn approve(env: &Env, patient: &PortalUser, profile_id: u64) -> Result<(), ContractError> {
    let email = patient.email.clone();

    let chosen = profiles::get_profile(env, profile_id)
        .filter(|p| p.email == Some(email.clone()))
        .ok_or(ContractError::ProfileNotFound)?;

    let canonical = profiles::build_canonical(env, &chosen);
    let now = env.ledger().timestamp();

    profiles::propagate_canonical(env, &email, &canonical, Some(now), now)?;
    decision::record_decision(env, &patient.address, now)
}

/// Rejects one doctor's version. Three cases:
/// sole profile with a rollback snapshot → restore it everywhere; sole
/// never-approved profile → delete it with its notes; other profiles remain
/// → re-derive a canonical state from their merge and propagate it to every
/// copy, the rejected one included.
pub fn reject(
    env: &Env,
    patient: &PortalUser,
    profile_id: u64,
) -> Result<RejectOutcome, ContractError> {
    let email = patient.email.clone();

    let all = profiles::profiles_by_email(env, &email);
    if all.is_empty() {
        return Err(ContractError::ProfileNotFound);
    }

    let mut target: Option<Profile> = None;
    let mut others: Vec<Profile> = Vec::new(env);
    for p in all.iter() {
        if p.id == profile_id {
            target = Some(p);
        } else {
            others.push_back(p);
        }
    }
    let target = target.ok_or(ContractError::ProfileNotFound)?;

    let now = env.ledger().timestamp();

    if others.is_empty() {
        if let Some(baseline) = &target.rollback {
            // Case A: pure rollback to the last approved state.
            profiles::propagate_canonical(env, &email, baseline, None, now)?;
            decision::record_decision(env, &patient.address, now)?;
            return Ok(RejectOutcome::RolledBack);
        }

        // Case B: never approved — the profile and its dependents go.
        notes::remove_profile_notes(env, target.id);
        profiles::delete_profile(env, &target);
        decision::record_decision(env, &patient.address, now)?;
        return Ok(RejectOutcome::Deleted);
    }

    // Case C: rebuild the agreed state from the remaining profiles. `others`
    // keeps the most-recent-first order of the full group.
    let merged = snapshot::build_snapshot(env, Some(email.clone()), &others)
        .ok_or(ContractError::ProfileNotFound)?;
    let canonical = canonical_from_snapshot(env, &merged)?;

    profiles::propagate_canonical(env, &email, &canonical, None, now)?;
    decision::record_decision(env, &patient.address, now)?;
    Ok(RejectOutcome::Reconciled)
}

/// Derives a canonical field set from a merged snapshot — the rejection
/// counterpart of building one from a single chosen profile.
///
/// A field whose merged wrapper carries no value goes into `absent` and is
/// therefore unset on every profile: leaving it untouched would keep stale
/// values alive on some copies after the group has supposedly converged.
fn canonical_from_snapshot(
    env: &Env,
    merged: &HealthSnapshot,
) -> Result<RollbackSnapshot, ContractError> {
    let mut fields: Map<FieldId, FieldValue> = Map::new(env);
    let mut absent: Vec<FieldId> = Vec::new(env);

    fields.set(FieldId::Fullname, FieldValue::Text(merged.fullname.clone()));
    fields.set(
        FieldId::AgeCategory,
        FieldValue::Band(merged.age_category.clone()),
    );

    match merged.age.value {
        Some(age) => fields.set(FieldId::Age, FieldValue::Uint(age)),
        None => absent.push_back(FieldId::Age),
    }

    match &merged.gender.value {
        Some(s) => {
            let g = parse_gender(env, s).ok_or(ContractError::CanonicalMismatch)?;
            fields.set(FieldId::Gender, FieldValue::Sex(g));
        }
        None => absent.push_back(FieldId::Gender),
    }

    match &merged.bloodtype.value {
        Some(s) => {
            let b = parse_blood(env, s).ok_or(ContractError::CanonicalMismatch)?;
            fields.set(FieldId::BloodType, FieldValue::Blood(b));
        }
        None => absent.push_back(FieldId::BloodType),
    }

    match merged.organ_donor.value {
        Some(f) => fields.set(FieldId::OrganDonor, FieldValue::Flag(f)),
        None => absent.push_back(FieldId::OrganDonor),
    }
    match merged.blood_donor.value {
        Some(f) => fields.set(FieldId::BloodDonor, FieldValue::Flag(f)),
        None => absent.push_back(FieldId::BloodDonor),
    }

    set_text_or_absent(&mut fields, &mut absent, FieldId::Country, &merged.country.value);
    set_text_or_absent(&mut fields, &mut absent, FieldId::State, &merged.state.value);
    set_text_or_absent(&mut fields, &mut absent, FieldId::City, &merged.city.value);

    match &merged.phone.value {
        Some(phone) => {
            fields.set(FieldId::Phone, FieldValue::Text(phone.clone()));
            let digits = text::digits_of(env, phone).ok_or(ContractError::CanonicalMismatch)?;
            fields.set(FieldId::PhoneDigits, FieldValue::Text(digits));
        }
        None => {
            absent.push_back(FieldId::Phone);
            absent.push_back(FieldId::PhoneDigits);
        }
    }

    // Alive/deceased status follows the latest remaining profile; the cause
    // only survives while the status is deceased.
    fields.set(FieldId::Deceased, FieldValue::Flag(merged.deceased));
    match &merged.cause_of_death {
        Some(cause) if merged.deceased => {
            fields.set(FieldId::CauseOfDeath, FieldValue::Text(cause.clone()));
        }
        _ => absent.push_back(FieldId::CauseOfDeath),
    }

    // Anthropometrics are taken from the latest remaining profile as a
    // coherent tuple rather than field-by-field from wrappers.
    fields.set(
        FieldId::MeasurementSystem,
        FieldValue::Units(merged.measurement_system.clone()),
    );
    fields.set(FieldId::HeightMm, FieldValue::Uint(merged.height_mm));
    fields.set(FieldId::WeightG, FieldValue::Uint(merged.weight_g));
    fields.set(FieldId::BmiTenths, FieldValue::Uint(merged.bmi_tenths));
    fields.set(
        FieldId::BmiCategory,
        FieldValue::Bmi(merged.bmi_category.clone()),
    );

    fields.set(
        FieldId::Diseases,
        FieldValue::Items(merged.diseases.current.clone()),
    );
    fields.set(
        FieldId::Allergies,
        FieldValue::Items(merged.allergies.current.clone()),
    );
    fields.set(
        FieldId::Medications,
        FieldValue::Items(merged.medications.current.clone()),
    );

    Ok(RollbackSnapshot { fields, absent })
}

fn set_text_or_absent(
    fields: &mut Map<FieldId, FieldValue>,
    absent: &mut Vec<FieldId>,
    id: FieldId,
    value: &Option<String>,
) {
    match value {
        Some(s) => fields.set(id, FieldValue::Text(s.clone())),
        None => absent.push_back(id),
    }
}
