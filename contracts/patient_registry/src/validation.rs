//! Input validation, normalisation and derived clinical fields.
//!
//! Everything a doctor submits passes through here before it reaches
//! storage: free text is trimmed and bounded, emails are lowercased, phones
//! are reduced to digits, array fields are deduplicated, and the derived
//! age band and BMI are computed. The resolvers rely on these invariants —
//! a stored profile never contains blank or oversized values.

use medrec_common::text;
use soroban_sdk::{Env, String, Vec};

use crate::types::{AgeBand, BloodType, BmiCategory, ContractError, Gender, MeasurementSystem};

pub const MAX_NAME_LEN: u32 = 64;
pub const MAX_PLACE_LEN: u32 = 56;
pub const MAX_EMAIL_LEN: u32 = 64;
pub const MAX_CAUSE_LEN: u32 = 120;
pub const MAX_LIST_ITEMS: u32 = 32;
pub const MAX_ITEM_LEN: u32 = 64;

pub const MAX_AGE: u32 = 120;
pub const ADULT_AGE: u32 = 18;

pub const MAX_HEIGHT_MM: u32 = 2_500;
pub const MAX_WEIGHT_G: u32 = 350_000;

pub const PHONE_MIN_DIGITS: u32 = 10;
pub const PHONE_MAX_DIGITS: u32 = 15;

// ── Free text ───────────────────────────────────────────────────────────────

fn bounded_trim(env: &Env, s: &String, max: u32) -> Result<String, ContractError> {
    let t = text::trimmed(env, s).ok_or(ContractError::InvalidInput)?;
    if t.is_empty() || t.len() > max || !text::is_printable_ascii(&t) {
        return Err(ContractError::InvalidInput);
    }
    Ok(t)
}

/// Patient full name: non-blank printable ASCII, at most 64 bytes.
pub fn validate_name(env: &Env, name: &String) -> Result<String, ContractError> {
    bounded_trim(env, name, MAX_NAME_LEN)
}

/// Country / state / city value.
pub fn validate_place(env: &Env, place: &String) -> Result<String, ContractError> {
    bounded_trim(env, place, MAX_PLACE_LEN)
}

/// Cause-of-death free text.
pub fn validate_cause(env: &Env, cause: &String) -> Result<String, ContractError> {
    bounded_trim(env, cause, MAX_CAUSE_LEN)
}

/// Free-text clinical note fields (title, description).
pub fn validate_note_text(env: &Env, s: &String) -> Result<String, ContractError> {
    bounded_trim(env, s, text::MAX_TEXT_LEN)
}

// ── Email ───────────────────────────────────────────────────────────────────

/// Lowercases and trims an email, then checks the shape: exactly one `@`
/// with a non-empty local part and a dotted domain. DNS existence checks are
/// the portal's concern, not the ledger's.
pub fn normalize_email(env: &Env, email: &String) -> Result<String, ContractError> {
    let e = text::trimmed_lower(env, email).ok_or(ContractError::InvalidInput)?;
    let len = e.len();
    if len == 0 || len > MAX_EMAIL_LEN {
        return Err(ContractError::InvalidInput);
    }

    let mut buf = [0u8; MAX_EMAIL_LEN as usize];
    e.copy_into_slice(&mut buf[..len as usize]);

    let mut at_pos: Option<usize> = None;
    for (i, &b) in buf[..len as usize].iter().enumerate() {
        if b == b'@' {
            if at_pos.is_some() {
                return Err(ContractError::InvalidInput);
            }
            at_pos = Some(i);
        } else if b.is_ascii_whitespace() || !(33..=126).contains(&b) {
            return Err(ContractError::InvalidInput);
        }
    }

    let at = at_pos.ok_or(ContractError::InvalidInput)?;
    if at == 0 || at + 1 >= len as usize {
        return Err(ContractError::InvalidInput);
    }
    let domain = &buf[at + 1..len as usize];
    let has_dot = domain.iter().any(|&b| b == b'.');
    if !has_dot || domain.first() == Some(&b'.') || domain.last() == Some(&b'.') {
        return Err(ContractError::InvalidInput);
    }

    Ok(e)
}

// ── Phone ───────────────────────────────────────────────────────────────────

/// Reduces a phone value to its digits and checks E.164-plausible length.
/// Returns `(display, digits)` where display is the digits prefixed `+`.
pub fn normalize_phone(env: &Env, phone: &String) -> Result<(String, String), ContractError> {
    let digits = text::digits_of(env, phone).ok_or(ContractError::InvalidInput)?;
    let n = digits.len();
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&n) {
        return Err(ContractError::InvalidInput);
    }

    let mut buf = [0u8; 1 + PHONE_MAX_DIGITS as usize];
    buf[0] = b'+';
    digits.copy_into_slice(&mut buf[1..=n as usize]);
    let display = String::from_bytes(env, &buf[..1 + n as usize]);
    Ok((display, digits))
}

// ── Array fields ────────────────────────────────────────────────────────────

/// Trims every entry, drops blanks, deduplicates, and bounds both entry
/// length and entry count.
pub fn normalize_list(env: &Env, items: &Vec<String>) -> Result<Vec<String>, ContractError> {
    let mut out: Vec<String> = Vec::new(env);
    for item in items.iter() {
        let t = text::trimmed(env, &item).ok_or(ContractError::InvalidInput)?;
        if t.is_empty() {
            continue;
        }
        if t.len() > MAX_ITEM_LEN || !text::is_printable_ascii(&t) {
            return Err(ContractError::InvalidInput);
        }
        let mut seen = false;
        for kept in out.iter() {
            if kept == t {
                seen = true;
                break;
            }
        }
        if !seen {
            out.push_back(t);
        }
    }
    if out.len() > MAX_LIST_ITEMS {
        return Err(ContractError::InvalidInput);
    }
    Ok(out)
}

// ── Numeric fields ──────────────────────────────────────────────────────────

pub fn validate_age(age: u32) -> Result<(), ContractError> {
    if age > MAX_AGE {
        return Err(ContractError::InvalidInput);
    }
    Ok(())
}

pub fn is_minor(age: u32) -> bool {
    age < ADULT_AGE
}

pub fn validate_anthropometrics(height_mm: u32, weight_g: u32) -> Result<(), ContractError> {
    if height_mm == 0 || height_mm > MAX_HEIGHT_MM {
        return Err(ContractError::InvalidInput);
    }
    if weight_g == 0 || weight_g > MAX_WEIGHT_G {
        return Err(ContractError::InvalidInput);
    }
    Ok(())
}

/// BMI in tenths, rounded half-up: weight / height² with weight in grams and
/// height in millimetres reduces to `g * 10_000 / mm²`.
pub fn compute_bmi(weight_g: u32, height_mm: u32) -> (u32, BmiCategory) {
    let mm2 = (height_mm as u64) * (height_mm as u64);
    let tenths = ((weight_g as u64) * 10_000 + mm2 / 2) / mm2;
    let tenths = tenths as u32;
    let category = if tenths < 185 {
        BmiCategory::Underweight
    } else if tenths < 250 {
        BmiCategory::Healthy
    } else {
        BmiCategory::Overweight
    };
    (tenths, category)
}

/// Age band used by the portal's filters: 0-12 / 13-17 / 18-59 / 60+.
pub fn age_band(age: u32) -> AgeBand {
    match age {
        0..=12 => AgeBand::Child,
        13..=17 => AgeBand::Teen,
        18..=59 => AgeBand::Adult,
        _ => AgeBand::Senior,
    }
}

// ── Enum text forms ─────────────────────────────────────────────────────────
//
// The snapshot reports enum-typed fields as their portal text so wrappers
// stay uniform; the rejection resolver parses them back when it re-derives a
// canonical set from a merged snapshot.

pub fn gender_text(env: &Env, g: &Gender) -> String {
    match g {
        Gender::Male => String::from_str(env, "male"),
        Gender::Female => String::from_str(env, "female"),
    }
}

pub fn parse_gender(env: &Env, s: &String) -> Option<Gender> {
    if *s == String::from_str(env, "male") {
        Some(Gender::Male)
    } else if *s == String::from_str(env, "female") {
        Some(Gender::Female)
    } else {
        None
    }
}

pub fn blood_text(env: &Env, b: &BloodType) -> String {
    match b {
        BloodType::APos => String::from_str(env, "A+"),
        BloodType::ANeg => String::from_str(env, "A-"),
        BloodType::BPos => String::from_str(env, "B+"),
        BloodType::BNeg => String::from_str(env, "B-"),
        BloodType::AbPos => String::from_str(env, "AB+"),
        BloodType::AbNeg => String::from_str(env, "AB-"),
        BloodType::OPos => String::from_str(env, "O+"),
        BloodType::ONeg => String::from_str(env, "O-"),
    }
}

pub fn parse_blood(env: &Env, s: &String) -> Option<BloodType> {
    let all = [
        BloodType::APos,
        BloodType::ANeg,
        BloodType::BPos,
        BloodType::BNeg,
        BloodType::AbPos,
        BloodType::AbNeg,
        BloodType::OPos,
        BloodType::ONeg,
    ];
    for b in all.iter() {
        if *s == blood_text(env, b) {
            return Some(b.clone());
        }
    }
    None
}

pub fn system_text(env: &Env, m: &MeasurementSystem) -> String {
    match m {
        MeasurementSystem::Metric => String::from_str(env, "metric"),
        MeasurementSystem::Imperial => String::from_str(env, "imperial"),
    }
}

pub fn parse_system(env: &Env, s: &String) -> Option<MeasurementSystem> {
    if *s == String::from_str(env, "metric") {
        Some(MeasurementSystem::Metric)
    } else if *s == String::from_str(env, "imperial") {
        Some(MeasurementSystem::Imperial)
    } else {
        None
    }
}
