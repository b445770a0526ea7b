//! Portal users and the pending-decision gate.
//!
//! A patient's decision state is a single timestamp on their user record.
//! The identity is *pending* when its most recent profile modification is
//! strictly newer than that timestamp (or when records exist and no decision
//! was ever taken). Doctor writes consult the gate before mutating; the
//! check is advisory — taken once at entry, not re-validated at commit —
//! which is accepted for same-ledger races.

use medrec_common::ttl;
use soroban_sdk::{symbol_short, Address, Env, String, Symbol};

use crate::profiles;
use crate::types::{ContractError, PortalUser, Role};

const USER: Symbol = symbol_short!("USER");
const PORTAL: Symbol = symbol_short!("PORTAL");

fn user_key(address: &Address) -> (Symbol, Address) {
    (USER, address.clone())
}

fn portal_key(email: &String) -> (Symbol, String) {
    (PORTAL, email.clone())
}

pub fn get_user(env: &Env, address: &Address) -> Option<PortalUser> {
    env.storage().persistent().get(&user_key(address))
}

pub fn set_user(env: &Env, user: &PortalUser) {
    let key = user_key(&user.address);
    env.storage().persistent().set(&key, user);
    ttl::extend_persistent(env, &key);
    if user.role == Role::Patient {
        let pkey = portal_key(&user.email);
        env.storage().persistent().set(&pkey, &user.address);
        ttl::extend_persistent(env, &pkey);
    }
}

/// The patient portal account registered under `email`, if any.
pub fn patient_by_email(env: &Env, email: &String) -> Option<PortalUser> {
    let address: Address = env.storage().persistent().get(&portal_key(email))?;
    get_user(env, &address)
}

/// Loads `address` and checks it holds `role`.
pub fn require_role(env: &Env, address: &Address, role: Role) -> Result<PortalUser, ContractError> {
    let user = get_user(env, address).ok_or(ContractError::UserNotFound)?;
    if user.role != role {
        return Err(ContractError::Unauthorized);
    }
    Ok(user)
}

/// Stamps the patient's decision time, closing the pending window.
pub fn record_decision(env: &Env, patient: &Address, at: u64) -> Result<(), ContractError> {
    let mut user = get_user(env, patient).ok_or(ContractError::UserNotFound)?;
    user.last_decision = Some(at);
    set_user(env, &user);
    Ok(())
}

/// Whether the identity has an undecided profile version.
///
/// False when no patient portal account or no profiles exist — there is
/// nothing to gate. True when records exist and the patient never decided,
/// or when any profile was modified after the last decision.
pub fn is_pending(env: &Env, email: &String) -> bool {
    let user = match patient_by_email(env, email) {
        Some(u) => u,
        None => return false,
    };

    let latest = match profiles::latest_update(env, email) {
        Some(t) => t,
        None => return false,
    };

    match user.last_decision {
        None => true,
        Some(decided) => latest > decided,
    }
}

/// Gate consulted by doctor-side create/update before persisting.
pub fn require_not_pending(env: &Env, email: &String) -> Result<(), ContractError> {
    if is_pending(env, email) {
        return Err(ContractError::DecisionPending);
    }
    Ok(())
}
