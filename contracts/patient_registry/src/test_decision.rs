#![cfg(test)]
//! Pending-decision gate behaviour around doctor writes and patient
//! decisions.

use soroban_sdk::String;

use crate::test::{base_input, no_changes, register_doctor, register_patient, set_time, setup};
use crate::types::ContractError;

const EMAIL: &str = "alice@example.com";

#[test]
fn no_portal_user_means_nothing_is_pending() {
    let (env, client, admin) = setup();
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");

    client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));
    assert!(!client.is_pending(&String::from_str(&env, EMAIL)));
}

#[test]
fn portal_user_without_records_is_not_pending() {
    let (env, client, admin) = setup();
    register_patient(&env, &client, &admin, "Alice", EMAIL);
    assert!(!client.is_pending(&String::from_str(&env, EMAIL)));
}

#[test]
fn first_record_after_registration_is_pending() {
    let (env, client, admin) = setup();
    set_time(&env, 1_000);
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    register_patient(&env, &client, &admin, "Alice", EMAIL);

    // No profiles yet, so creation itself is not gated.
    client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));

    // Records exist and the patient never decided.
    assert!(client.is_pending(&String::from_str(&env, EMAIL)));
    // The identity key is case-insensitive.
    assert!(client.is_pending(&String::from_str(&env, "Alice@Example.COM")));
}

#[test]
fn pending_identity_blocks_doctor_writes() {
    let (env, client, admin) = setup();
    set_time(&env, 1_000);
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let other = register_doctor(&env, &client, &admin, "Dr Ruiz", "ruiz@clinic.mx");
    register_patient(&env, &client, &admin, "Alice", EMAIL);

    let id = client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));

    // A second doctor cannot submit a version while the first awaits a
    // decision.
    set_time(&env, 2_000);
    let result = client.try_create_profile(&other, &base_input(&env, "Alice Doe", Some(EMAIL)));
    assert_eq!(result, Err(Ok(ContractError::DecisionPending)));

    // Not even the owning doctor can edit.
    let mut changes = no_changes(&env);
    changes.age = Some(35);
    let result = client.try_update_profile(&doctor, &id, &changes);
    assert_eq!(result, Err(Ok(ContractError::DecisionPending)));
}

#[test]
fn approval_reopens_the_identity_for_writes() {
    let (env, client, admin) = setup();
    set_time(&env, 1_000);
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    let id = client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));
    assert!(client.is_pending(&String::from_str(&env, EMAIL)));

    set_time(&env, 2_000);
    let view = client.approve_profile(&patient, &id);
    assert!(!view.pending_decision);
    assert!(!client.is_pending(&String::from_str(&env, EMAIL)));

    // A later edit opens a new decision window.
    set_time(&env, 3_000);
    let mut changes = no_changes(&env);
    changes.age = Some(35);
    client.update_profile(&doctor, &id, &changes);
    assert!(client.is_pending(&String::from_str(&env, EMAIL)));

    // And rejection closes it again.
    set_time(&env, 4_000);
    let view = client.reject_profile(&patient, &id);
    assert!(!view.pending_decision);
    assert!(!client.is_pending(&String::from_str(&env, EMAIL)));
}

#[test]
fn gate_compares_strictly() {
    let (env, client, admin) = setup();
    set_time(&env, 1_000);
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    let id = client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));

    // Decision recorded in the same ledger second as the propagation: the
    // window is closed, not half-open.
    client.approve_profile(&patient, &id);
    assert!(!client.is_pending(&String::from_str(&env, EMAIL)));
}

#[test]
fn unknown_identity_reports_empty_view() {
    let (env, client, _admin) = setup();
    let view = client.compute_snapshot(&String::from_str(&env, "ghost@example.com"));
    assert!(!view.has_records);
    assert!(!view.pending_decision);
    assert!(view.snapshot.is_none());
    assert_eq!(view.profiles.len(), 0);
}
