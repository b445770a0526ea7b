//! Profile storage: keys, identity/owner indexes, and the typed canonical
//! field set used by approval and rejection propagation.
//!
//! Profiles live under `("PROF", id)`. The identity group — every profile
//! sharing one patient email — is an explicit index under `("EMLPROF",
//! email)`, so reconciliation always works over the whole group instead of
//! ad-hoc joins at call sites.

use medrec_common::ttl;
use soroban_sdk::{symbol_short, Address, Env, Map, String, Symbol, Vec};

use crate::types::{ContractError, FieldId, FieldValue, Profile, RollbackSnapshot};

const PROFILE_CTR: Symbol = symbol_short!("PRF_CTR");
const PROFILE: Symbol = symbol_short!("PROF");
const EMAIL_IDX: Symbol = symbol_short!("EMLPROF");
const OWNER_IDX: Symbol = symbol_short!("OWNPROF");

/// Scalar fields synchronised by a decision, in propagation order.
pub const SYNC_SCALARS: [FieldId; 19] = [
    FieldId::Fullname,
    FieldId::Age,
    FieldId::AgeCategory,
    FieldId::Gender,
    FieldId::BloodType,
    FieldId::OrganDonor,
    FieldId::BloodDonor,
    FieldId::MeasurementSystem,
    FieldId::HeightMm,
    FieldId::WeightG,
    FieldId::BmiTenths,
    FieldId::BmiCategory,
    FieldId::Deceased,
    FieldId::CauseOfDeath,
    FieldId::Country,
    FieldId::State,
    FieldId::City,
    FieldId::Phone,
    FieldId::PhoneDigits,
];

/// Array fields synchronised by a decision.
pub const SYNC_ARRAYS: [FieldId; 3] = [FieldId::Diseases, FieldId::Allergies, FieldId::Medications];

// ── Keys and basic accessors ────────────────────────────────────────────────

fn profile_key(id: u64) -> (Symbol, u64) {
    (PROFILE, id)
}

fn email_key(email: &String) -> (Symbol, String) {
    (EMAIL_IDX, email.clone())
}

fn owner_key(owner: &Address) -> (Symbol, Address) {
    (OWNER_IDX, owner.clone())
}

pub fn next_profile_id(env: &Env) -> u64 {
    let id: u64 = env
        .storage()
        .instance()
        .get(&PROFILE_CTR)
        .unwrap_or(0u64)
        .saturating_add(1);
    env.storage().instance().set(&PROFILE_CTR, &id);
    id
}

pub fn get_profile(env: &Env, id: u64) -> Option<Profile> {
    env.storage().persistent().get(&profile_key(id))
}

pub fn set_profile(env: &Env, profile: &Profile) {
    let key = profile_key(profile.id);
    env.storage().persistent().set(&key, profile);
    ttl::extend_persistent(env, &key);
}

fn remove_profile_entry(env: &Env, id: u64) {
    env.storage().persistent().remove(&profile_key(id));
}

// ── Identity and owner indexes ──────────────────────────────────────────────

pub fn ids_for_email(env: &Env, email: &String) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&email_key(email))
        .unwrap_or_else(|| Vec::new(env))
}

pub fn ids_for_owner(env: &Env, owner: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&owner_key(owner))
        .unwrap_or_else(|| Vec::new(env))
}

fn push_index(env: &Env, key: &(Symbol, String), id: u64) {
    let mut ids: Vec<u64> = env
        .storage()
        .persistent()
        .get(key)
        .unwrap_or_else(|| Vec::new(env));
    ids.push_back(id);
    env.storage().persistent().set(key, &ids);
    ttl::extend_persistent(env, key);
}

fn drop_from_index(env: &Env, key: &(Symbol, String), id: u64) {
    let ids: Vec<u64> = env
        .storage()
        .persistent()
        .get(key)
        .unwrap_or_else(|| Vec::new(env));
    let mut kept: Vec<u64> = Vec::new(env);
    for existing in ids.iter() {
        if existing != id {
            kept.push_back(existing);
        }
    }
    if kept.is_empty() {
        env.storage().persistent().remove(key);
    } else {
        env.storage().persistent().set(key, &kept);
    }
}

pub fn index_new_profile(env: &Env, profile: &Profile) {
    if let Some(email) = &profile.email {
        push_index(env, &email_key(email), profile.id);
    }
    let okey = owner_key(&profile.owner);
    let mut ids: Vec<u64> = env
        .storage()
        .persistent()
        .get(&okey)
        .unwrap_or_else(|| Vec::new(env));
    ids.push_back(profile.id);
    env.storage().persistent().set(&okey, &ids);
    ttl::extend_persistent(env, &okey);
}

/// Registers a profile under its email after the email was set post-creation
/// (a minor's profile gaining an address on adulthood).
pub fn index_email(env: &Env, email: &String, id: u64) {
    push_index(env, &email_key(email), id);
}

pub fn unindex_email(env: &Env, email: &String, id: u64) {
    drop_from_index(env, &email_key(email), id);
}

/// Removes a profile and its index entries. Note cascade is the caller's
/// responsibility.
pub fn delete_profile(env: &Env, profile: &Profile) {
    if let Some(email) = &profile.email {
        drop_from_index(env, &email_key(email), profile.id);
    }
    let okey = owner_key(&profile.owner);
    let ids: Vec<u64> = env
        .storage()
        .persistent()
        .get(&okey)
        .unwrap_or_else(|| Vec::new(env));
    let mut kept: Vec<u64> = Vec::new(env);
    for existing in ids.iter() {
        if existing != profile.id {
            kept.push_back(existing);
        }
    }
    if kept.is_empty() {
        env.storage().persistent().remove(&okey);
    } else {
        env.storage().persistent().set(&okey, &kept);
    }
    remove_profile_entry(env, profile.id);
}

/// Loads the identity group for `email`, most recently updated first.
/// Ties (same ledger second) break towards the higher id, i.e. the profile
/// created later.
pub fn profiles_by_email(env: &Env, email: &String) -> Vec<Profile> {
    let ids = ids_for_email(env, email);
    let mut ordered: Vec<Profile> = Vec::new(env);
    for id in ids.iter() {
        let profile = match get_profile(env, id) {
            Some(p) => p,
            None => continue,
        };
        let mut pos = ordered.len();
        for i in 0..ordered.len() {
            let existing = ordered.get_unchecked(i);
            let newer = profile.updated_at > existing.updated_at
                || (profile.updated_at == existing.updated_at && profile.id > existing.id);
            if newer {
                pos = i;
                break;
            }
        }
        ordered.insert(pos, profile);
    }
    ordered
}

/// Most recent `updated_at` across the identity, if any profile exists.
pub fn latest_update(env: &Env, email: &String) -> Option<u64> {
    let mut latest: Option<u64> = None;
    for id in ids_for_email(env, email).iter() {
        if let Some(p) = get_profile(env, id) {
            match latest {
                Some(t) if t >= p.updated_at => {}
                _ => latest = Some(p.updated_at),
            }
        }
    }
    latest
}

// ── Canonical field set ─────────────────────────────────────────────────────

/// Extracts the canonical value a profile carries for a scalar field, or
/// `None` when the field is absent on this profile.
pub fn scalar_value(profile: &Profile, id: FieldId) -> Option<FieldValue> {
    match id {
        FieldId::Fullname => Some(FieldValue::Text(profile.fullname.clone())),
        FieldId::Age => Some(FieldValue::Uint(profile.age)),
        FieldId::AgeCategory => Some(FieldValue::Band(profile.age_category.clone())),
        FieldId::Gender => Some(FieldValue::Sex(profile.gender.clone())),
        FieldId::BloodType => Some(FieldValue::Blood(profile.bloodtype.clone())),
        FieldId::OrganDonor => Some(FieldValue::Flag(profile.organ_donor)),
        FieldId::BloodDonor => Some(FieldValue::Flag(profile.blood_donor)),
        FieldId::MeasurementSystem => {
            Some(FieldValue::Units(profile.measurement_system.clone()))
        }
        FieldId::HeightMm => Some(FieldValue::Uint(profile.height_mm)),
        FieldId::WeightG => Some(FieldValue::Uint(profile.weight_g)),
        FieldId::BmiTenths => Some(FieldValue::Uint(profile.bmi_tenths)),
        FieldId::BmiCategory => Some(FieldValue::Bmi(profile.bmi_category.clone())),
        FieldId::Deceased => Some(FieldValue::Flag(profile.deceased)),
        FieldId::CauseOfDeath => profile.cause_of_death.clone().map(FieldValue::Text),
        FieldId::Country => Some(FieldValue::Text(profile.country.clone())),
        FieldId::State => Some(FieldValue::Text(profile.state.clone())),
        FieldId::City => Some(FieldValue::Text(profile.city.clone())),
        FieldId::Phone => profile.phone.clone().map(FieldValue::Text),
        FieldId::PhoneDigits => profile.phone_digits.clone().map(FieldValue::Text),
        FieldId::Diseases | FieldId::Allergies | FieldId::Medications => None,
    }
}

/// Builds the canonical `{fields, absent}` set from one chosen profile:
/// every synchronised scalar the profile carries goes into `fields`, the
/// rest into `absent`; array fields are copied verbatim.
pub fn build_canonical(env: &Env, profile: &Profile) -> RollbackSnapshot {
    let mut fields: Map<FieldId, FieldValue> = Map::new(env);
    let mut absent: Vec<FieldId> = Vec::new(env);

    for id in SYNC_SCALARS.iter() {
        match scalar_value(profile, *id) {
            Some(value) => fields.set(*id, value),
            None => absent.push_back(*id),
        }
    }

    fields.set(FieldId::Diseases, FieldValue::Items(profile.diseases.clone()));
    fields.set(FieldId::Allergies, FieldValue::Items(profile.allergies.clone()));
    fields.set(
        FieldId::Medications,
        FieldValue::Items(profile.medications.clone()),
    );

    RollbackSnapshot { fields, absent }
}

/// Writes one canonical `(field, value)` pair onto a profile. A value whose
/// tag does not match the field is refused, never coerced.
pub fn set_field(
    profile: &mut Profile,
    id: FieldId,
    value: FieldValue,
) -> Result<(), ContractError> {
    match (id, value) {
        (FieldId::Fullname, FieldValue::Text(s)) => profile.fullname = s,
        (FieldId::Age, FieldValue::Uint(n)) => profile.age = n,
        (FieldId::AgeCategory, FieldValue::Band(b)) => profile.age_category = b,
        (FieldId::Gender, FieldValue::Sex(g)) => profile.gender = g,
        (FieldId::BloodType, FieldValue::Blood(b)) => profile.bloodtype = b,
        (FieldId::OrganDonor, FieldValue::Flag(f)) => profile.organ_donor = f,
        (FieldId::BloodDonor, FieldValue::Flag(f)) => profile.blood_donor = f,
        (FieldId::MeasurementSystem, FieldValue::Units(m)) => profile.measurement_system = m,
        (FieldId::HeightMm, FieldValue::Uint(n)) => profile.height_mm = n,
        (FieldId::WeightG, FieldValue::Uint(n)) => profile.weight_g = n,
        (FieldId::BmiTenths, FieldValue::Uint(n)) => profile.bmi_tenths = n,
        (FieldId::BmiCategory, FieldValue::Bmi(c)) => profile.bmi_category = c,
        (FieldId::Deceased, FieldValue::Flag(f)) => profile.deceased = f,
        (FieldId::CauseOfDeath, FieldValue::Text(s)) => profile.cause_of_death = Some(s),
        (FieldId::Country, FieldValue::Text(s)) => profile.country = s,
        (FieldId::State, FieldValue::Text(s)) => profile.state = s,
        (FieldId::City, FieldValue::Text(s)) => profile.city = s,
        (FieldId::Phone, FieldValue::Text(s)) => profile.phone = Some(s),
        (FieldId::PhoneDigits, FieldValue::Text(s)) => profile.phone_digits = Some(s),
        (FieldId::Diseases, FieldValue::Items(v)) => profile.diseases = v,
        (FieldId::Allergies, FieldValue::Items(v)) => profile.allergies = v,
        (FieldId::Medications, FieldValue::Items(v)) => profile.medications = v,
        _ => return Err(ContractError::CanonicalMismatch),
    }
    Ok(())
}

/// Clears a field listed as absent in a canonical set. Only genuinely
/// optional fields are clearable; anything else in an `absent` list means
/// the snapshot is malformed.
pub fn clear_field(profile: &mut Profile, id: FieldId) -> Result<(), ContractError> {
    match id {
        FieldId::CauseOfDeath => profile.cause_of_death = None,
        FieldId::Phone => profile.phone = None,
        FieldId::PhoneDigits => profile.phone_digits = None,
        _ => return Err(ContractError::CanonicalMismatch),
    }
    Ok(())
}

/// Applies a full canonical set to one profile in memory.
pub fn apply_canonical(
    profile: &mut Profile,
    canonical: &RollbackSnapshot,
) -> Result<(), ContractError> {
    for (id, value) in canonical.fields.iter() {
        set_field(profile, id, value)?;
    }
    for id in canonical.absent.iter() {
        clear_field(profile, id)?;
    }
    Ok(())
}

/// Propagates a canonical set to every profile of the identity. When
/// `approval_stamp` is set, each profile additionally records the rollback
/// snapshot and approval time — the approve path; rejections propagate
/// without restamping.
pub fn propagate_canonical(
    env: &Env,
    email: &String,
    canonical: &RollbackSnapshot,
    approval_stamp: Option<u64>,
    now: u64,
) -> Result<(), ContractError> {
    for id in ids_for_email(env, email).iter() {
        let mut profile = get_profile(env, id).ok_or(ContractError::ProfileNotFound)?;
        apply_canonical(&mut profile, canonical)?;
        if let Some(at) = approval_stamp {
            profile.rollback = Some(canonical.clone());
            profile.approved_at = Some(at);
        }
        profile.updated_at = now;
        set_profile(env, &profile);
    }
    Ok(())
}
