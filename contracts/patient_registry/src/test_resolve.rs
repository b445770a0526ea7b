#![cfg(test)]
//! Approve / reject resolver behaviour: convergence, rollback, cascade
//! delete and multi-profile reconciliation.

use soroban_sdk::{String, Vec};

use crate::test::{base_input, no_changes, register_doctor, register_patient, set_time, setup, strs};
use crate::types::{BloodType, ContractError};

const EMAIL: &str = "alice@example.com";

#[test]
fn approval_converges_diverging_profiles() {
    let (env, client, admin) = setup();
    let doc_a = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let doc_b = register_doctor(&env, &client, &admin, "Dr Ruiz", "ruiz@clinic.mx");

    set_time(&env, 1_000);
    let id_a = client.create_profile(&doc_a, &base_input(&env, "Alice Doe", Some(EMAIL)));

    set_time(&env, 2_000);
    let mut input_b = base_input(&env, "Alice Doe", Some(EMAIL));
    input_b.age = 35;
    input_b.bloodtype = BloodType::ANeg;
    let id_b = client.create_profile(&doc_b, &input_b);

    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    // Before the decision, the patient sees the disagreement.
    let view = client.compute_snapshot(&String::from_str(&env, EMAIL));
    let snap = view.snapshot.unwrap();
    assert!(view.pending_decision);
    assert!(snap.age.conflict);
    assert_eq!(snap.age.value, Some(35));
    assert_eq!(snap.age.alternatives.len(), 2);
    assert!(snap.age.alternatives.contains(34));
    assert!(snap.age.alternatives.contains(35));
    assert!(snap.bloodtype.conflict);
    assert_eq!(snap.sources.len(), 2);
    assert_eq!(snap.sources.get_unchecked(0).profile_id, id_b);

    // The patient canonicalizes doctor A's version.
    set_time(&env, 3_000);
    let view = client.approve_profile(&patient, &id_a);
    assert!(!view.pending_decision);

    let snap = view.snapshot.unwrap();
    assert!(!snap.age.conflict);
    assert_eq!(snap.age.value, Some(34));
    assert!(!snap.bloodtype.conflict);
    assert_eq!(snap.bloodtype.value, Some(String::from_str(&env, "O+")));

    // Every copy converged, including doctor B's.
    let profile_b = client.get_profile(&id_b);
    assert_eq!(profile_b.age, 34);
    assert_eq!(profile_b.bloodtype, BloodType::OPos);
    assert_eq!(profile_b.approved_at, Some(3_000));
    assert!(profile_b.rollback.is_some());

    let profile_a = client.get_profile(&id_a);
    assert_eq!(profile_a.rollback, profile_b.rollback);
}

#[test]
fn approve_rejects_foreign_profile_ids() {
    let (env, client, admin) = setup();
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");

    set_time(&env, 1_000);
    let bob_id = client.create_profile(&doctor, &base_input(&env, "Bob Roe", Some("bob@example.com")));
    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    // Bob's profile does not belong to Alice's identity.
    let result = client.try_approve_profile(&patient, &bob_id);
    assert_eq!(result, Err(Ok(ContractError::ProfileNotFound)));

    // Nor does a profile id that was never issued.
    let result = client.try_approve_profile(&patient, &99u64);
    assert_eq!(result, Err(Ok(ContractError::ProfileNotFound)));

    let result = client.try_reject_profile(&patient, &99u64);
    assert_eq!(result, Err(Ok(ContractError::ProfileNotFound)));
}

#[test]
fn decisions_require_the_patient_role() {
    let (env, client, admin) = setup();
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    set_time(&env, 1_000);
    let id = client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));

    // A doctor cannot decide on behalf of the patient.
    let result = client.try_approve_profile(&doctor, &id);
    assert_eq!(result, Err(Ok(ContractError::Unauthorized)));

    let result = client.try_get_my_health_info(&doctor);
    assert_eq!(result, Err(Ok(ContractError::Unauthorized)));
}

#[test]
fn sole_profile_rollback_is_idempotent() {
    let (env, client, admin) = setup();
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    set_time(&env, 1_000);
    let mut input = base_input(&env, "Alice Doe", Some(EMAIL));
    input.medications = strs(&env, &["aspirin"]);
    let id = client.create_profile(&doctor, &input);

    set_time(&env, 2_000);
    client.approve_profile(&patient, &id);

    // The doctor revises the approved record.
    set_time(&env, 3_000);
    let mut changes = no_changes(&env);
    changes.age = Some(40);
    changes.medications = Some(strs(&env, &["aspirin", "ibuprofen"]));
    client.update_profile(&doctor, &id, &changes);
    assert!(client.is_pending(&String::from_str(&env, EMAIL)));

    // First rejection restores the approved state.
    set_time(&env, 4_000);
    let view = client.reject_profile(&patient, &id);
    assert!(view.has_records);
    assert!(!view.pending_decision);
    let profile = client.get_profile(&id);
    assert_eq!(profile.age, 34);
    assert_eq!(profile.medications, strs(&env, &["aspirin"]));
    assert_eq!(profile.approved_at, Some(2_000));

    // A second rejection converges to exactly the same state.
    set_time(&env, 5_000);
    let view = client.reject_profile(&patient, &id);
    assert!(view.has_records);
    assert!(!view.pending_decision);
    let profile = client.get_profile(&id);
    assert_eq!(profile.age, 34);
    assert_eq!(profile.medications, strs(&env, &["aspirin"]));
}

#[test]
fn rejecting_sole_unapproved_profile_deletes_it_with_notes() {
    let (env, client, admin) = setup();
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    set_time(&env, 1_000);
    let id = client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));
    let note_id = client.add_note(
        &doctor,
        &id,
        &String::from_str(&env, "Initial visit"),
        &String::from_str(&env, "Baseline intake"),
        &Vec::new(&env),
        &Vec::new(&env),
        &Vec::new(&env),
    );

    set_time(&env, 2_000);
    let view = client.reject_profile(&patient, &id);
    assert!(!view.has_records);
    assert!(view.snapshot.is_none());
    assert!(!view.pending_decision);

    assert_eq!(
        client.try_get_profile(&id),
        Err(Ok(ContractError::ProfileNotFound))
    );
    assert_eq!(
        client.try_get_note(&note_id),
        Err(Ok(ContractError::NoteNotFound))
    );
    assert_eq!(client.get_doctor_profiles(&doctor).len(), 0);

    let view = client.compute_snapshot(&String::from_str(&env, EMAIL));
    assert!(!view.has_records);
}

#[test]
fn rejection_with_remaining_profiles_rebuilds_the_agreed_state() {
    let (env, client, admin) = setup();
    let doc_a = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let doc_b = register_doctor(&env, &client, &admin, "Dr Ruiz", "ruiz@clinic.mx");
    let doc_c = register_doctor(&env, &client, &admin, "Dr Sol", "sol@clinic.mx");

    set_time(&env, 1_000);
    let id_a = client.create_profile(&doc_a, &base_input(&env, "Alice Doe", Some(EMAIL)));

    set_time(&env, 2_000);
    let mut input_b = base_input(&env, "Alice Doe", Some(EMAIL));
    input_b.age = 35;
    input_b.bloodtype = BloodType::APos;
    let id_b = client.create_profile(&doc_b, &input_b);

    set_time(&env, 3_000);
    let mut input_c = base_input(&env, "Alice Doe", Some(EMAIL));
    input_c.age = 40;
    let id_c = client.create_profile(&doc_c, &input_c);

    // Doctor C additionally marks the patient deceased — the divergence the
    // patient is about to throw out.
    set_time(&env, 3_500);
    let mut changes = no_changes(&env);
    changes.deceased = Some(true);
    changes.cause_of_death = Some(String::from_str(&env, "clerical error"));
    client.update_profile(&doc_c, &id_c, &changes);

    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    set_time(&env, 4_000);
    let view = client.reject_profile(&patient, &id_c);
    assert!(view.has_records);
    assert!(!view.pending_decision);

    // The agreed state comes from the remaining profiles, led by doctor B's
    // more recent copy, and is propagated to all three — the rejected one
    // included.
    for id in [id_a, id_b, id_c] {
        let p = client.get_profile(&id);
        assert_eq!(p.age, 35);
        assert_eq!(p.bloodtype, BloodType::APos);
        assert!(!p.deceased);
        assert_eq!(p.cause_of_death, None);
        assert!(p.rollback.is_none());
        assert_eq!(p.approved_at, None);
    }

    let snap = view.snapshot.unwrap();
    assert!(!snap.age.conflict);
    assert_eq!(snap.age.value, Some(35));
    assert!(!snap.status.conflict);
}

#[test]
fn single_doctor_edits_show_as_baseline_diff_not_conflict() {
    let (env, client, admin) = setup();
    let doctor = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    set_time(&env, 1_000);
    let id = client.create_profile(&doctor, &base_input(&env, "Alice Doe", Some(EMAIL)));
    set_time(&env, 2_000);
    client.approve_profile(&patient, &id);

    set_time(&env, 3_000);
    let mut changes = no_changes(&env);
    changes.age = Some(40);
    client.update_profile(&doctor, &id, &changes);

    let view = client.get_my_health_info(&patient);
    assert!(view.pending_decision);
    let snap = view.snapshot.unwrap();
    assert!(snap.age.changed);
    assert!(!snap.age.conflict);
    assert_eq!(snap.age.value, Some(40));
    assert_eq!(snap.age.alternatives.get_unchecked(0), 40);
    assert_eq!(snap.age.alternatives.get_unchecked(1), 34);
    assert_eq!(snap.approved_baseline_at, Some(2_000));

    // Untouched fields carry no flags.
    assert!(!snap.bloodtype.changed);
    assert!(!snap.bloodtype.conflict);
}

#[test]
fn patient_view_shows_what_other_doctors_agree_on() {
    let (env, client, admin) = setup();
    let doc_a = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let doc_b = register_doctor(&env, &client, &admin, "Dr Ruiz", "ruiz@clinic.mx");
    let doc_c = register_doctor(&env, &client, &admin, "Dr Sol", "sol@clinic.mx");

    set_time(&env, 1_000);
    let mut input = base_input(&env, "Alice Doe", Some(EMAIL));
    input.allergies = strs(&env, &["pollen"]);
    client.create_profile(&doc_a, &input);

    set_time(&env, 2_000);
    let mut input = base_input(&env, "Alice Doe", Some(EMAIL));
    input.allergies = strs(&env, &["pollen", "dust"]);
    client.create_profile(&doc_b, &input);

    set_time(&env, 3_000);
    let mut input = base_input(&env, "Alice Doe", Some(EMAIL));
    input.allergies = strs(&env, &["latex"]);
    client.create_profile(&doc_c, &input);

    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    let view = client.get_my_health_info(&patient);
    let snap = view.snapshot.unwrap();
    assert!(snap.allergies.conflict);
    assert_eq!(snap.allergies.current, strs(&env, &["latex"]));
    // The two *other* doctors agree on pollen.
    assert_eq!(snap.allergies.common, strs(&env, &["pollen"]));
}

#[test]
fn approving_after_new_doctor_joins_restores_convergence() {
    let (env, client, admin) = setup();
    let doc_a = register_doctor(&env, &client, &admin, "Dr Vega", "vega@clinic.mx");
    let doc_b = register_doctor(&env, &client, &admin, "Dr Ruiz", "ruiz@clinic.mx");
    let patient = register_patient(&env, &client, &admin, "Alice", EMAIL);

    set_time(&env, 1_000);
    let id_a = client.create_profile(&doc_a, &base_input(&env, "Alice Doe", Some(EMAIL)));
    set_time(&env, 2_000);
    client.approve_profile(&patient, &id_a);

    // With the window closed, a second doctor submits a diverging copy.
    set_time(&env, 3_000);
    let mut input_b = base_input(&env, "Alice Doe", Some(EMAIL));
    input_b.age = 36;
    let id_b = client.create_profile(&doc_b, &input_b);
    assert!(client.is_pending(&String::from_str(&env, EMAIL)));

    // Rejecting the newcomer re-derives the state from doctor A's copy.
    set_time(&env, 4_000);
    let view = client.reject_profile(&patient, &id_b);
    assert!(!view.pending_decision);

    let p_b = client.get_profile(&id_b);
    assert_eq!(p_b.age, 34);

    let snap = view.snapshot.unwrap();
    assert!(!snap.age.conflict);
    assert_eq!(snap.age.value, Some(34));
}
