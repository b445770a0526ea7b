//! Clinical-note records attached to a profile.
//!
//! Notes are dependent records: they exist only as long as their profile
//! does and are removed in the same invocation that deletes it, whether the
//! delete came from the owning doctor or from a patient rejection.

use medrec_common::ttl;
use soroban_sdk::{symbol_short, Env, Symbol, Vec};

use crate::types::ClinicalNote;

const NOTE_CTR: Symbol = symbol_short!("NOTE_CTR");
const NOTE: Symbol = symbol_short!("NOTE");
const PROFILE_NOTES: Symbol = symbol_short!("PRF_NTS");

fn note_key(id: u64) -> (Symbol, u64) {
    (NOTE, id)
}

fn profile_notes_key(profile_id: u64) -> (Symbol, u64) {
    (PROFILE_NOTES, profile_id)
}

pub fn next_note_id(env: &Env) -> u64 {
    let id: u64 = env
        .storage()
        .instance()
        .get(&NOTE_CTR)
        .unwrap_or(0u64)
        .saturating_add(1);
    env.storage().instance().set(&NOTE_CTR, &id);
    id
}

pub fn get_note(env: &Env, id: u64) -> Option<ClinicalNote> {
    env.storage().persistent().get(&note_key(id))
}

pub fn add_note(env: &Env, note: &ClinicalNote) {
    let key = note_key(note.id);
    env.storage().persistent().set(&key, note);
    ttl::extend_persistent(env, &key);

    let pkey = profile_notes_key(note.profile_id);
    let mut ids: Vec<u64> = env
        .storage()
        .persistent()
        .get(&pkey)
        .unwrap_or_else(|| Vec::new(env));
    ids.push_back(note.id);
    env.storage().persistent().set(&pkey, &ids);
    ttl::extend_persistent(env, &pkey);
}

pub fn notes_for_profile(env: &Env, profile_id: u64) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&profile_notes_key(profile_id))
        .unwrap_or_else(|| Vec::new(env))
}

/// Cascade: removes every note of a profile together with the note index.
/// Returns how many notes were removed.
pub fn remove_profile_notes(env: &Env, profile_id: u64) -> u32 {
    let ids = notes_for_profile(env, profile_id);
    for id in ids.iter() {
        env.storage().persistent().remove(&note_key(id));
    }
    env.storage()
        .persistent()
        .remove(&profile_notes_key(profile_id));
    ids.len()
}
