//! Events published by the patient registry.

use soroban_sdk::{symbol_short, Address, Env, String};

use crate::types::{RejectOutcome, Role};

/// Event published when the contract is initialized.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub timestamp: u64,
}

/// Event published when a portal user is registered.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserRegisteredEvent {
    pub user: Address,
    pub role: Role,
    pub name: String,
    pub timestamp: u64,
}

/// Event published when a doctor creates a profile.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileCreatedEvent {
    pub profile_id: u64,
    pub doctor: Address,
    pub email: Option<String>,
    pub timestamp: u64,
}

/// Event published when a doctor updates their profile.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileUpdatedEvent {
    pub profile_id: u64,
    pub doctor: Address,
    pub timestamp: u64,
}

/// Event published when a doctor deletes a profile and its notes.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileDeletedEvent {
    pub profile_id: u64,
    pub doctor: Address,
    pub notes_removed: u32,
    pub timestamp: u64,
}

/// Event published when a clinical note is attached to a profile.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NoteAddedEvent {
    pub note_id: u64,
    pub profile_id: u64,
    pub author: Address,
    pub timestamp: u64,
}

/// Event published when a patient approves one doctor's version.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileApprovedEvent {
    pub profile_id: u64,
    pub patient: Address,
    pub email: String,
    pub timestamp: u64,
}

/// Event published when a patient rejects one doctor's version.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProfileRejectedEvent {
    pub profile_id: u64,
    pub patient: Address,
    pub email: String,
    pub outcome: RejectOutcome,
    pub timestamp: u64,
}

pub fn publish_initialized(env: &Env, admin: Address) {
    let topics = (symbol_short!("INIT"),);
    let data = InitializedEvent {
        admin,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_user_registered(env: &Env, user: Address, role: Role, name: String) {
    let topics = (symbol_short!("USR_REG"), user.clone());
    let data = UserRegisteredEvent {
        user,
        role,
        name,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_profile_created(env: &Env, profile_id: u64, doctor: Address, email: Option<String>) {
    let topics = (symbol_short!("PRF_CRT"), doctor.clone());
    let data = ProfileCreatedEvent {
        profile_id,
        doctor,
        email,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_profile_updated(env: &Env, profile_id: u64, doctor: Address) {
    let topics = (symbol_short!("PRF_UPD"), doctor.clone());
    let data = ProfileUpdatedEvent {
        profile_id,
        doctor,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_profile_deleted(env: &Env, profile_id: u64, doctor: Address, notes_removed: u32) {
    let topics = (symbol_short!("PRF_DEL"), doctor.clone());
    let data = ProfileDeletedEvent {
        profile_id,
        doctor,
        notes_removed,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_note_added(env: &Env, note_id: u64, profile_id: u64, author: Address) {
    let topics = (symbol_short!("NOTE_ADD"), author.clone());
    let data = NoteAddedEvent {
        note_id,
        profile_id,
        author,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_profile_approved(env: &Env, profile_id: u64, patient: Address, email: String) {
    let topics = (symbol_short!("PRF_APR"), patient.clone());
    let data = ProfileApprovedEvent {
        profile_id,
        patient,
        email,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_profile_rejected(
    env: &Env,
    profile_id: u64,
    patient: Address,
    email: String,
    outcome: RejectOutcome,
) {
    let topics = (symbol_short!("PRF_REJ"), patient.clone());
    let data = ProfileRejectedEvent {
        profile_id,
        patient,
        email,
        outcome,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}
