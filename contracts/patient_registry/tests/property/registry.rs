#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]
//! Properties of the registry contract.
//!
//! Invariants tested:
//! - Profile ids are monotonically increasing (1, 2, 3…).
//! - Approving any one of several diverging copies converges every copy to
//!   the chosen values and clears the conflict flags.
//! - Derived BMI classification is consistent with the computed tenths.

use proptest::prelude::*;
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{Address, Env, String, Vec};

use patient_registry::{
    BloodType, Gender, MeasurementSystem, PatientRegistryContract, PatientRegistryContractClient,
    ProfileInput, Role,
};

const EMAIL: &str = "alice@example.com";

fn setup() -> (Env, PatientRegistryContractClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let contract_id = env.register(PatientRegistryContract, ());
    let client = PatientRegistryContractClient::new(&env, &contract_id);

    let admin = Address::generate(&env);
    client.initialize(&admin);

    (env, client, admin)
}

fn set_time(env: &Env, timestamp: u64) {
    env.ledger().with_mut(|li| li.timestamp = timestamp);
}

fn register_doctor(
    env: &Env,
    client: &PatientRegistryContractClient<'static>,
    admin: &Address,
    n: usize,
) -> Address {
    let doctor = Address::generate(env);
    let name = std::format!("Dr {}", n);
    let email = std::format!("doctor{}@clinic.mx", n);
    client.register_user(
        admin,
        &doctor,
        &Role::Doctor,
        &String::from_str(env, &name),
        &String::from_str(env, &email),
    );
    doctor
}

fn input(env: &Env, age: u32, height_mm: u32, weight_g: u32) -> ProfileInput {
    ProfileInput {
        fullname: String::from_str(env, "Alice Doe"),
        email: Some(String::from_str(env, EMAIL)),
        phone: Some(String::from_str(env, "+52 33 1234 5678")),
        age,
        gender: Gender::Female,
        bloodtype: BloodType::OPos,
        organ_donor: true,
        blood_donor: false,
        measurement_system: MeasurementSystem::Metric,
        height_mm,
        weight_g,
        country: String::from_str(env, "Mexico"),
        state: String::from_str(env, "Jalisco"),
        city: String::from_str(env, "Guadalajara"),
        diseases: Vec::new(env),
        allergies: Vec::new(env),
        medications: Vec::new(env),
    }
}

proptest! {
    /// Profile ids are issued as 1, 2, …, N.
    #[test]
    fn prop_profile_ids_monotonic(n in 1usize..6usize) {
        let (env, client, admin) = setup();
        set_time(&env, 1_000);

        for expected in 1..=(n as u64) {
            let doctor = register_doctor(&env, &client, &admin, expected as usize);
            let id = client.create_profile(&doctor, &input(&env, 30 + expected as u32, 1_750, 70_000));
            prop_assert_eq!(id, expected);
        }
    }

    /// Whatever copy the patient approves, every profile of the identity
    /// reports the chosen age afterwards and the snapshot is conflict-free.
    #[test]
    fn prop_approval_converges_to_any_chosen_copy(
        ages in prop::collection::vec(18u32..90u32, 2..4),
        chosen_seed in 0usize..4usize,
    ) {
        let (env, client, admin) = setup();

        let mut ids = std::vec::Vec::new();
        for (i, age) in ages.iter().enumerate() {
            set_time(&env, 1_000 * (i as u64 + 1));
            let doctor = register_doctor(&env, &client, &admin, i);
            ids.push(client.create_profile(&doctor, &input(&env, *age, 1_750, 70_000)));
        }

        let patient = Address::generate(&env);
        client.register_user(
            &admin,
            &patient,
            &Role::Patient,
            &String::from_str(&env, "Alice"),
            &String::from_str(&env, EMAIL),
        );

        let chosen = chosen_seed % ids.len();
        set_time(&env, 10_000);
        let view = client.approve_profile(&patient, &ids[chosen]);

        prop_assert!(!view.pending_decision);
        let snap = view.snapshot.unwrap();
        prop_assert!(!snap.age.conflict);
        prop_assert_eq!(snap.age.value, Some(ages[chosen]));

        for id in &ids {
            let profile = client.get_profile(id);
            prop_assert_eq!(profile.age, ages[chosen]);
            prop_assert_eq!(profile.approved_at, Some(10_000));
        }
    }

    /// The stored BMI tenths always agree with the stored category.
    #[test]
    fn prop_bmi_category_consistent(
        height_mm in 1_200u32..2_200u32,
        weight_g in 35_000u32..180_000u32,
    ) {
        let (env, client, admin) = setup();
        set_time(&env, 1_000);
        let doctor = register_doctor(&env, &client, &admin, 1);

        let id = client.create_profile(&doctor, &input(&env, 30, height_mm, weight_g));
        let profile = client.get_profile(&id);

        use patient_registry::BmiCategory;
        let expected = if profile.bmi_tenths < 185 {
            BmiCategory::Underweight
        } else if profile.bmi_tenths < 250 {
            BmiCategory::Healthy
        } else {
            BmiCategory::Overweight
        };
        prop_assert_eq!(profile.bmi_category, expected);
    }
}
