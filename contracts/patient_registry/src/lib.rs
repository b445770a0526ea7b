//! Patient registry contract.
//!
//! Independent doctors each keep their own copy of a patient's profile,
//! grouped into one identity by the patient's email. The patient sees a
//! single reconciled snapshot, is warned where doctors disagree, and
//! resolves divergence by approving one doctor's version or rejecting it.
//! While a decision is outstanding, doctor-side writes to that identity are
//! refused.

#![no_std]
#![allow(clippy::arithmetic_side_effects)]

pub mod comparator;
pub mod decision;
pub mod events;
pub mod notes;
pub mod profiles;
pub mod resolve;
pub mod snapshot;
pub mod types;
pub mod validation;

use medrec_common::text;
use soroban_sdk::{
    contract, contractimpl, symbol_short, Address, Env, String, Symbol, Vec,
};

pub use types::{
    AgeBand, BloodType, BmiCategory, ClinicalNote, ContractError, FieldId, FieldValue,
    FlagWrapper, Gender, HealthSnapshot, HealthView, ListView, LocationEntry,
    MeasurementSystem, PortalUser, Profile, ProfileInput, ProfileUpdate, RejectOutcome,
    Role, RollbackSnapshot, SourceRef, TextWrapper, UintWrapper,
};

const ADMIN: Symbol = symbol_short!("ADMIN");
const INITIALIZED: Symbol = symbol_short!("INIT");

#[contract]
pub struct PatientRegistryContract;

#[contractimpl]
impl PatientRegistryContract {
    /// Initialize the contract with an admin address.
    pub fn initialize(env: Env, admin: Address) -> Result<(), ContractError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::AlreadyInitialized);
        }

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&INITIALIZED, &true);

        events::publish_initialized(&env, admin);

        Ok(())
    }

    pub fn get_admin(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }

    /// Register a portal user. Patients are additionally indexed by their
    /// email so the decision gate can find them from an identity key.
    pub fn register_user(
        env: Env,
        caller: Address,
        user: Address,
        role: Role,
        name: String,
        email: String,
    ) -> Result<(), ContractError> {
        caller.require_auth();

        let admin = Self::get_admin(env.clone())?;
        if caller != admin {
            return Err(ContractError::Unauthorized);
        }

        let name = validation::validate_name(&env, &name)?;
        let email = validation::normalize_email(&env, &email)?;

        let record = PortalUser {
            address: user.clone(),
            role: role.clone(),
            name: name.clone(),
            email,
            registered_at: env.ledger().timestamp(),
            last_decision: None,
        };
        decision::set_user(&env, &record);

        events::publish_user_registered(&env, user, role, name);

        Ok(())
    }

    pub fn get_user(env: Env, user: Address) -> Result<PortalUser, ContractError> {
        decision::get_user(&env, &user).ok_or(ContractError::UserNotFound)
    }

    // ── Doctor-side operations ──────────────────────────────────────────

    /// Create a profile. Refused while the identity has an undecided
    /// version in the portal.
    pub fn create_profile(
        env: Env,
        doctor: Address,
        input: ProfileInput,
    ) -> Result<u64, ContractError> {
        doctor.require_auth();
        decision::require_role(&env, &doctor, Role::Doctor)?;

        let fullname = validation::validate_name(&env, &input.fullname)?;
        validation::validate_age(input.age)?;
        let minor = validation::is_minor(input.age);

        let email = match &input.email {
            Some(e) if !text::is_blank(e) => Some(validation::normalize_email(&env, e)?),
            _ => None,
        };
        if email.is_none() && !minor {
            return Err(ContractError::InvalidInput);
        }

        let (phone, phone_digits) = match &input.phone {
            Some(p) if !text::is_blank(p) => {
                let (display, digits) = validation::normalize_phone(&env, p)?;
                (Some(display), Some(digits))
            }
            _ => {
                if !minor {
                    return Err(ContractError::InvalidInput);
                }
                (None, None)
            }
        };

        validation::validate_anthropometrics(input.height_mm, input.weight_g)?;
        let country = validation::validate_place(&env, &input.country)?;
        let state = validation::validate_place(&env, &input.state)?;
        let city = validation::validate_place(&env, &input.city)?;

        let diseases = validation::normalize_list(&env, &input.diseases)?;
        let allergies = validation::normalize_list(&env, &input.allergies)?;
        let medications = validation::normalize_list(&env, &input.medications)?;

        if let Some(e) = &email {
            decision::require_not_pending(&env, e)?;
        }

        // One version of a given patient per doctor.
        for id in profiles::ids_for_owner(&env, &doctor).iter() {
            if let Some(existing) = profiles::get_profile(&env, id) {
                if existing.fullname == fullname {
                    return Err(ContractError::DuplicateProfile);
                }
                if email.is_some() && existing.email == email {
                    return Err(ContractError::DuplicateProfile);
                }
            }
        }

        let (bmi_tenths, bmi_category) = validation::compute_bmi(input.weight_g, input.height_mm);
        let now = env.ledger().timestamp();
        let id = profiles::next_profile_id(&env);

        let profile = Profile {
            id,
            owner: doctor.clone(),
            email: email.clone(),
            fullname,
            age: input.age,
            age_category: validation::age_band(input.age),
            gender: input.gender.clone(),
            bloodtype: input.bloodtype.clone(),
            organ_donor: input.organ_donor,
            blood_donor: input.blood_donor,
            measurement_system: input.measurement_system.clone(),
            height_mm: input.height_mm,
            weight_g: input.weight_g,
            bmi_tenths,
            bmi_category,
            deceased: false,
            cause_of_death: None,
            country,
            state,
            city,
            phone,
            phone_digits,
            diseases,
            allergies,
            medications,
            rollback: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };

        profiles::set_profile(&env, &profile);
        profiles::index_new_profile(&env, &profile);

        events::publish_profile_created(&env, id, doctor, email);

        Ok(id)
    }

    /// Partially update an owned profile. Same gate as creation; the email
    /// is immutable once registered.
    pub fn update_profile(
        env: Env,
        doctor: Address,
        profile_id: u64,
        changes: ProfileUpdate,
    ) -> Result<(), ContractError> {
        doctor.require_auth();
        decision::require_role(&env, &doctor, Role::Doctor)?;

        let mut profile = profiles::get_profile(&env, profile_id)
            .filter(|p| p.owner == doctor)
            .ok_or(ContractError::ProfileNotFound)?;

        if let Some(email) = &profile.email {
            decision::require_not_pending(&env, email)?;
        }

        let next_age = changes.age.unwrap_or(profile.age);
        validation::validate_age(next_age)?;
        let minor_next = validation::is_minor(next_age);

        if let Some(name) = &changes.fullname {
            profile.fullname = validation::validate_name(&env, name)?;
        }
        if let Some(age) = changes.age {
            profile.age = age;
            profile.age_category = validation::age_band(age);
        }

        if let Some(e) = &changes.email {
            if text::is_blank(e) {
                if profile.email.is_some() {
                    if !minor_next {
                        return Err(ContractError::InvalidInput);
                    }
                    let old = profile.email.clone();
                    profile.email = None;
                    if let Some(old) = old {
                        profiles::unindex_email(&env, &old, profile.id);
                    }
                }
            } else {
                let norm = validation::normalize_email(&env, e)?;
                match &profile.email {
                    Some(current) if *current != norm => {
                        return Err(ContractError::EmailImmutable);
                    }
                    Some(_) => {}
                    None => {
                        profiles::index_email(&env, &norm, profile.id);
                        profile.email = Some(norm);
                    }
                }
            }
        }

        if let Some(p) = &changes.phone {
            if text::is_blank(p) {
                if !minor_next {
                    return Err(ContractError::InvalidInput);
                }
                profile.phone = None;
                profile.phone_digits = None;
            } else {
                let (display, digits) = validation::normalize_phone(&env, p)?;
                profile.phone = Some(display);
                profile.phone_digits = Some(digits);
            }
        }

        // Adults must end up reachable.
        if !minor_next && (profile.email.is_none() || profile.phone.is_none()) {
            return Err(ContractError::InvalidInput);
        }

        if let Some(c) = &changes.country {
            profile.country = validation::validate_place(&env, c)?;
        }
        if let Some(s) = &changes.state {
            profile.state = validation::validate_place(&env, s)?;
        }
        if let Some(c) = &changes.city {
            profile.city = validation::validate_place(&env, c)?;
        }

        if let Some(g) = changes.gender.clone() {
            profile.gender = g;
        }
        if let Some(b) = changes.bloodtype.clone() {
            profile.bloodtype = b;
        }
        if let Some(f) = changes.organ_donor {
            profile.organ_donor = f;
        }
        if let Some(f) = changes.blood_donor {
            profile.blood_donor = f;
        }

        match changes.deceased {
            Some(true) => {
                let cause = changes
                    .cause_of_death
                    .as_ref()
                    .filter(|c| !text::is_blank(c))
                    .ok_or(ContractError::InvalidInput)?;
                profile.deceased = true;
                profile.cause_of_death = Some(validation::validate_cause(&env, cause)?);
            }
            Some(false) => {
                profile.deceased = false;
                profile.cause_of_death = None;
            }
            None => {
                if changes.cause_of_death.is_some() {
                    // Cause only travels together with the deceased flag.
                    return Err(ContractError::InvalidInput);
                }
            }
        }

        let touch_sys = changes.measurement_system.is_some();
        let touch_h = changes.height_mm.is_some();
        let touch_w = changes.weight_g.is_some();
        if touch_sys || touch_h || touch_w {
            if !(touch_sys && touch_h && touch_w) {
                return Err(ContractError::InvalidInput);
            }
            let height_mm = changes.height_mm.ok_or(ContractError::InvalidInput)?;
            let weight_g = changes.weight_g.ok_or(ContractError::InvalidInput)?;
            validation::validate_anthropometrics(height_mm, weight_g)?;
            profile.measurement_system = changes
                .measurement_system
                .clone()
                .ok_or(ContractError::InvalidInput)?;
            profile.height_mm = height_mm;
            profile.weight_g = weight_g;
            let (bmi_tenths, bmi_category) = validation::compute_bmi(weight_g, height_mm);
            profile.bmi_tenths = bmi_tenths;
            profile.bmi_category = bmi_category;
        }

        if let Some(items) = &changes.diseases {
            profile.diseases = validation::normalize_list(&env, items)?;
        }
        if let Some(items) = &changes.allergies {
            profile.allergies = validation::normalize_list(&env, items)?;
        }
        if let Some(items) = &changes.medications {
            profile.medications = validation::normalize_list(&env, items)?;
        }

        profile.updated_at = env.ledger().timestamp();
        profiles::set_profile(&env, &profile);

        events::publish_profile_updated(&env, profile_id, doctor);

        Ok(())
    }

    /// Delete an owned profile together with its clinical notes.
    pub fn delete_profile(
        env: Env,
        doctor: Address,
        profile_id: u64,
    ) -> Result<(), ContractError> {
        doctor.require_auth();
        decision::require_role(&env, &doctor, Role::Doctor)?;

        let profile = profiles::get_profile(&env, profile_id)
            .filter(|p| p.owner == doctor)
            .ok_or(ContractError::ProfileNotFound)?;

        let notes_removed = notes::remove_profile_notes(&env, profile_id);
        profiles::delete_profile(&env, &profile);

        events::publish_profile_deleted(&env, profile_id, doctor, notes_removed);

        Ok(())
    }

    pub fn get_profile(env: Env, profile_id: u64) -> Result<Profile, ContractError> {
        profiles::get_profile(&env, profile_id).ok_or(ContractError::ProfileNotFound)
    }

    /// All profile ids owned by a doctor.
    pub fn get_doctor_profiles(env: Env, doctor: Address) -> Vec<u64> {
        profiles::ids_for_owner(&env, &doctor)
    }

    /// Attach a clinical note to an owned profile.
    #[allow(clippy::too_many_arguments)]
    pub fn add_note(
        env: Env,
        author: Address,
        profile_id: u64,
        title: String,
        description: String,
        medicine: Vec<String>,
        treatment: Vec<String>,
        operation: Vec<String>,
    ) -> Result<u64, ContractError> {
        author.require_auth();
        decision::require_role(&env, &author, Role::Doctor)?;

        profiles::get_profile(&env, profile_id)
            .filter(|p| p.owner == author)
            .ok_or(ContractError::ProfileNotFound)?;

        let note = ClinicalNote {
            id: notes::next_note_id(&env),
            profile_id,
            author: author.clone(),
            title: validation::validate_note_text(&env, &title)?,
            description: validation::validate_note_text(&env, &description)?,
            medicine: validation::normalize_list(&env, &medicine)?,
            treatment: validation::normalize_list(&env, &treatment)?,
            operation: validation::normalize_list(&env, &operation)?,
            created_at: env.ledger().timestamp(),
        };
        notes::add_note(&env, &note);

        events::publish_note_added(&env, note.id, profile_id, author);

        Ok(note.id)
    }

    pub fn get_note(env: Env, note_id: u64) -> Result<ClinicalNote, ContractError> {
        notes::get_note(&env, note_id).ok_or(ContractError::NoteNotFound)
    }

    pub fn get_profile_notes(env: Env, profile_id: u64) -> Vec<u64> {
        notes::notes_for_profile(&env, profile_id)
    }

    // ── Patient-side operations ─────────────────────────────────────────

    /// The reconciled view of one identity key. Read-only.
    pub fn compute_snapshot(env: Env, email: String) -> HealthView {
        match text::trimmed_lower(&env, &email) {
            Some(e) => identity_view(&env, &e),
            None => HealthView {
                has_records: false,
                pending_decision: false,
                snapshot: None,
                profiles: Vec::new(&env),
            },
        }
    }

    /// Whether the identity has an undecided profile version.
    pub fn is_pending(env: Env, email: String) -> bool {
        match text::trimmed_lower(&env, &email) {
            Some(e) => decision::is_pending(&env, &e),
            None => false,
        }
    }

    /// The authenticated patient's own reconciled view. With several
    /// contributing doctors the `common` lists show what the *other*
    /// doctors agree on.
    pub fn get_my_health_info(env: Env, patient: Address) -> Result<HealthView, ContractError> {
        patient.require_auth();
        let user = decision::require_role(&env, &patient, Role::Patient)?;
        if user.email.is_empty() {
            return Err(ContractError::NoEmailOnFile);
        }

        let mut view = identity_view(&env, &user.email);
        if let Some(snap) = &mut view.snapshot {
            snapshot::common_from_other_doctors(&env, snap, &view.profiles);
        }
        Ok(view)
    }

    /// Patient approves one doctor's version, canonicalizing it across all
    /// copies of the identity.
    pub fn approve_profile(
        env: Env,
        patient: Address,
        profile_id: u64,
    ) -> Result<HealthView, ContractError> {
        patient.require_auth();
        let user = decision::require_role(&env, &patient, Role::Patient)?;
        if user.email.is_empty() {
            return Err(ContractError::NoEmailOnFile);
        }

        resolve::approve(&env, &user, profile_id)?;

        events::publish_profile_approved(&env, profile_id, patient, user.email.clone());

        Ok(identity_view(&env, &user.email))
    }

    /// Patient rejects one doctor's version: roll back, delete, or
    /// re-derive the agreed state from the remaining copies.
    pub fn reject_profile(
        env: Env,
        patient: Address,
        profile_id: u64,
    ) -> Result<HealthView, ContractError> {
        patient.require_auth();
        let user = decision::require_role(&env, &patient, Role::Patient)?;
        if user.email.is_empty() {
            return Err(ContractError::NoEmailOnFile);
        }

        let outcome = resolve::reject(&env, &user, profile_id)?;

        events::publish_profile_rejected(&env, profile_id, patient, user.email.clone(), outcome);

        Ok(identity_view(&env, &user.email))
    }

    /// Contract version.
    pub fn version() -> u32 {
        3
    }
}

/// Recomputes the full view of an identity: raw profiles, snapshot, and the
/// pending flag.
fn identity_view(env: &Env, email: &String) -> HealthView {
    let profiles = profiles::profiles_by_email(env, email);
    let snapshot = snapshot::build_snapshot(env, Some(email.clone()), &profiles);
    HealthView {
        has_records: !profiles.is_empty(),
        pending_decision: decision::is_pending(env, email),
        snapshot,
        profiles,
    }
}


#[cfg(test)]
mod test_decision;

#[cfg(test)]
mod test_resolve;
