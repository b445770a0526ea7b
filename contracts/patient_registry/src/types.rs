//! Core data types for the patient registry.
//!
//! A *profile* is one doctor's version of one patient. Profiles submitted by
//! different doctors are grouped into an identity by the patient's email and
//! reconciled on demand into a [`HealthSnapshot`]; the patient's approve /
//! reject decision is what makes the copies converge again.

use soroban_sdk::{contracterror, contracttype, Address, Map, String, Vec};

// ── Errors ──────────────────────────────────────────────────────────────────

/// Contract errors.
///
/// # Code ranges
/// | Range   | Purpose                        |
/// |---------|--------------------------------|
/// | 1 – 9   | Lifecycle / initialisation     |
/// | 10 – 19 | Authentication & authorisation |
/// | 20 – 29 | Resource not found             |
/// | 30 – 39 | Validation / input             |
/// | 40 – 49 | Contract state                 |
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 10,
    UserNotFound = 20,
    ProfileNotFound = 21,
    NoteNotFound = 22,
    InvalidInput = 30,
    /// A canonical `(field, value)` pair carried a mismatched tag. The
    /// resolver refuses rather than coercing.
    CanonicalMismatch = 31,
    DuplicateProfile = 32,
    EmailImmutable = 33,
    NoEmailOnFile = 34,
    /// A doctor write was refused because the patient has an undecided
    /// profile version in the portal.
    DecisionPending = 40,
}

// ── Users ───────────────────────────────────────────────────────────────────

/// Portal roles. Doctors own profiles; patients own decisions.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

/// A registered portal user.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PortalUser {
    pub address: Address,
    pub role: Role,
    pub name: String,
    /// Lowercased; the identity key for patients.
    pub email: String,
    pub registered_at: u64,
    /// Ledger time of the patient's last approve/reject. Absent until the
    /// first decision is taken.
    pub last_decision: Option<u64>,
}

// ── Clinical enumerations ───────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Gender {
    Male,
    Female,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BloodType {
    APos,
    ANeg,
    BPos,
    BNeg,
    AbPos,
    AbNeg,
    OPos,
    ONeg,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MeasurementSystem {
    Metric,
    Imperial,
}

/// Derived BMI classification.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BmiCategory {
    Underweight,
    Healthy,
    Overweight,
}

/// Derived age band, mirroring the portal's filter categories.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AgeBand {
    /// 0–12
    Child,
    /// 13–17
    Teen,
    /// 18–59
    Adult,
    /// 60+
    Senior,
}

// ── Profiles ────────────────────────────────────────────────────────────────

/// One doctor's version of a patient record.
///
/// Measurements are integer milli-units: height in millimetres, weight in
/// grams, BMI in tenths. `email` is the identity key shared across owners
/// and is absent only for minors.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Profile {
    pub id: u64,
    pub owner: Address,
    pub email: Option<String>,
    pub fullname: String,
    pub age: u32,
    pub age_category: AgeBand,
    pub gender: Gender,
    pub bloodtype: BloodType,
    pub organ_donor: bool,
    pub blood_donor: bool,
    pub measurement_system: MeasurementSystem,
    pub height_mm: u32,
    pub weight_g: u32,
    pub bmi_tenths: u32,
    pub bmi_category: BmiCategory,
    pub deceased: bool,
    pub cause_of_death: Option<String>,
    pub country: String,
    pub state: String,
    pub city: String,
    pub phone: Option<String>,
    pub phone_digits: Option<String>,
    pub diseases: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    /// Last canonicalised state, kept for rollback on rejection.
    pub rollback: Option<RollbackSnapshot>,
    pub approved_at: Option<u64>,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Doctor-supplied payload for profile creation. Derived fields (age band,
/// BMI) are computed by the contract; `deceased` always starts false.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileInput {
    pub fullname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: u32,
    pub gender: Gender,
    pub bloodtype: BloodType,
    pub organ_donor: bool,
    pub blood_donor: bool,
    pub measurement_system: MeasurementSystem,
    pub height_mm: u32,
    pub weight_g: u32,
    pub country: String,
    pub state: String,
    pub city: String,
    pub diseases: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
}

/// Partial update payload; `None` fields are left untouched.
///
/// An empty string in `email` or `phone` clears the field, which is only
/// permitted while the resulting profile is a minor's. Anthropometrics must
/// be sent as a complete triple. `cause_of_death` is only accepted together
/// with `deceased = Some(true)`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileUpdate {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub bloodtype: Option<BloodType>,
    pub organ_donor: Option<bool>,
    pub blood_donor: Option<bool>,
    pub measurement_system: Option<MeasurementSystem>,
    pub height_mm: Option<u32>,
    pub weight_g: Option<u32>,
    pub deceased: Option<bool>,
    pub cause_of_death: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub diseases: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
}

// ── Canonical field set / rollback snapshot ─────────────────────────────────

/// Every field that approval/rejection propagates across an identity.
///
/// The exhaustive enumeration is what lets [`crate::profiles::set_field`]
/// match `(FieldId, FieldValue)` pairs at compile time instead of scanning
/// untyped maps at runtime.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldId {
    Fullname,
    Age,
    AgeCategory,
    Gender,
    BloodType,
    OrganDonor,
    BloodDonor,
    MeasurementSystem,
    HeightMm,
    WeightG,
    BmiTenths,
    BmiCategory,
    Deceased,
    CauseOfDeath,
    Country,
    State,
    City,
    Phone,
    PhoneDigits,
    Diseases,
    Allergies,
    Medications,
}

/// Tagged value for a canonical field. The tag must agree with the
/// [`FieldId`] it is stored under.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Text(String),
    Uint(u32),
    Flag(bool),
    Sex(Gender),
    Blood(BloodType),
    Units(MeasurementSystem),
    Band(AgeBand),
    Bmi(BmiCategory),
    Items(Vec<String>),
}

/// The canonical state chosen by an approval (or re-derived by a rejection),
/// as applied to every profile of an identity.
///
/// `absent` lists the fields the chosen version did not carry; propagation
/// clears them so the copies converge exactly.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RollbackSnapshot {
    pub fields: Map<FieldId, FieldValue>,
    pub absent: Vec<FieldId>,
}

// ── Reconciled snapshot ─────────────────────────────────────────────────────

/// Scalar text field summarised across all profiles of an identity.
///
/// `value` is the most recent non-empty value, `alternatives` every distinct
/// value seen, `conflict` whether more than one distinct value exists.
/// `changed` is set only by the single-doctor baseline diff, where it
/// replaces the conflict warning.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextWrapper {
    pub value: Option<String>,
    pub conflict: bool,
    pub alternatives: Vec<String>,
    pub changed: bool,
}

/// Numeric counterpart of [`TextWrapper`]; deduplication is tolerance-aware
/// for measurement fields.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UintWrapper {
    pub value: Option<u32>,
    pub conflict: bool,
    pub alternatives: Vec<u32>,
    pub changed: bool,
}

/// Boolean counterpart, used for the alive/deceased status and donor flags.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlagWrapper {
    pub value: Option<bool>,
    pub conflict: bool,
    pub alternatives: Vec<bool>,
    pub changed: bool,
}

/// An array field summarised across all profiles of an identity.
///
/// `current` is the latest profile's list, `combined` the union over every
/// profile, `common` what every profile agrees on.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListView {
    pub current: Vec<String>,
    pub combined: Vec<String>,
    pub common: Vec<String>,
    pub conflict: bool,
    pub changed: bool,
}

/// One country/state/city tuple in the deduplicated location history.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocationEntry {
    pub country: String,
    pub state: String,
    pub city: String,
}

/// Provenance of one contributing profile, most-recent-first in
/// [`HealthSnapshot::sources`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceRef {
    pub profile_id: u64,
    pub doctor: Address,
    pub updated_at: u64,
}

/// The reconciled view of one identity. Transient — recomputed on demand,
/// never persisted.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HealthSnapshot {
    pub fullname: String,
    pub email: Option<String>,

    pub fullname_wrapper: TextWrapper,
    /// Alive/deceased, derived from each profile's `deceased` flag.
    pub status: FlagWrapper,
    pub age: UintWrapper,
    pub gender: TextWrapper,
    pub bloodtype: TextWrapper,
    pub organ_donor: FlagWrapper,
    pub blood_donor: FlagWrapper,
    pub country: TextWrapper,
    pub state: TextWrapper,
    pub city: TextWrapper,
    pub phone: TextWrapper,
    pub height: UintWrapper,
    pub weight: UintWrapper,
    pub bmi: UintWrapper,

    // Anthropometrics of the most recent profile, reported directly.
    pub measurement_system: MeasurementSystem,
    pub height_mm: u32,
    pub weight_g: u32,
    pub bmi_tenths: u32,
    pub bmi_category: BmiCategory,
    pub age_category: AgeBand,
    pub deceased: bool,
    pub cause_of_death: Option<String>,

    /// Spread-style flags: true when max − min exceeds the field tolerance.
    pub height_conflict: bool,
    pub weight_conflict: bool,

    pub diseases: ListView,
    pub allergies: ListView,
    pub medications: ListView,

    pub location_history: Vec<LocationEntry>,
    pub sources: Vec<SourceRef>,

    /// When the single-doctor baseline diff applies, the ledger time the
    /// baseline was approved.
    pub approved_baseline_at: Option<u64>,
}

/// Return shape of every patient-facing query and decision.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HealthView {
    pub has_records: bool,
    pub pending_decision: bool,
    pub snapshot: Option<HealthSnapshot>,
    /// The raw per-doctor profiles backing the snapshot, most-recent-first.
    pub profiles: Vec<Profile>,
}

// ── Clinical notes ──────────────────────────────────────────────────────────

/// A dependent clinical-note record. Notes are owned by the profile they
/// annotate and are cascade-deleted with it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClinicalNote {
    pub id: u64,
    pub profile_id: u64,
    pub author: Address,
    pub title: String,
    pub description: String,
    pub medicine: Vec<String>,
    pub treatment: Vec<String>,
    pub operation: Vec<String>,
    pub created_at: u64,
}

/// How a rejection was carried out, published with the rejection event.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RejectOutcome {
    /// Sole profile restored from its rollback snapshot.
    RolledBack,
    /// Sole never-approved profile deleted with its notes.
    Deleted,
    /// Remaining profiles merged and propagated.
    Reconciled,
}
