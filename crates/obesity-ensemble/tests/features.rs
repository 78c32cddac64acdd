//! Property-based tests for the feature transform.
//!
//! Records are drawn from the closed category sets with plausible numeric
//! ranges; the properties hold for any such batch.

use proptest::prelude::*;
use proptest::sample::select;

use obesity_ensemble::data::N_CLASSES;
use obesity_ensemble::features::{EngineeredRecord, OneHotEncoder};
use obesity_ensemble::testing::synthetic_records;
use obesity_ensemble::{FeatureTransformer, ObesityClass, RawRecord, SELECTED_FEATURES};

// =============================================================================
// Strategies
// =============================================================================

const TRANSPORT_MODES: [&str; 5] = ["Automobile", "Bike", "Motorbike", "Public_Transportation", "Walking"];

fn answer() -> impl Strategy<Value = &'static str> {
    select(vec!["yes", "no"])
}

fn arb_record() -> impl Strategy<Value = RawRecord> {
    let body = (
        select(vec!["Female", "Male"]),
        14.0f64..70.0,
        1.40f64..2.00,
        35.0f64..180.0,
        answer(),
        answer(),
    );
    let habits = (
        1.0f64..=3.0,
        1.0f64..=4.0,
        select(vec!["no", "Sometimes", "Frequently", "Always"]),
        answer(),
        1.0f64..=3.0,
        answer(),
    );
    let activity = (
        0.0f64..=3.0,
        0.0f64..=2.0,
        select(vec!["no", "Sometimes", "Frequently"]),
        select(TRANSPORT_MODES.to_vec()),
        select(ObesityClass::names()),
    );

    (body, habits, activity).prop_map(
        |(
            (gender, age, height, weight, family, favc),
            (fcvc, ncp, caec, smoke, ch2o, scc),
            (faf, tue, calc, mtrans, class),
        )| RawRecord {
            id: "0".to_string(),
            gender: gender.to_string(),
            age,
            height,
            weight,
            family_history_with_overweight: family.to_string(),
            favc: favc.to_string(),
            fcvc,
            ncp,
            caec: caec.to_string(),
            smoke: smoke.to_string(),
            ch2o,
            scc: scc.to_string(),
            faf,
            tue,
            calc: calc.to_string(),
            mtrans: mtrans.to_string(),
            nobeyesdad: Some(class),
        },
    )
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encoded_codes_stay_in_their_level_sets(records in prop::collection::vec(arb_record(), 1..40)) {
        for (row, record) in records.iter().enumerate() {
            let e = EngineeredRecord::from_raw(record, row).unwrap();
            for flag in [e.male, e.family_history_with_overweight, e.favc, e.smoke, e.scc] {
                prop_assert!(flag == 0.0 || flag == 1.0);
            }
            prop_assert!([0.0, 1.0, 2.0, 3.0].contains(&e.caec));
            prop_assert!([0.0, 1.0, 2.0].contains(&e.calc));
        }
    }

    #[test]
    fn fitted_frame_is_in_unit_range(records in prop::collection::vec(arb_record(), 1..60)) {
        let x = FeatureTransformer::new().fit_transform(&records).unwrap();

        prop_assert_eq!(x.n_rows(), records.len());
        let expected = SELECTED_FEATURES.map(String::from);
        prop_assert_eq!(x.names(), expected.as_slice());
        for &value in x.view() {
            prop_assert!((0.0..=1.0).contains(&value), "value {} outside [0, 1]", value);
        }
        for column in x.view().columns() {
            let min = column.iter().copied().fold(f32::INFINITY, f32::min);
            let max = column.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            // A constant column maps to 0 everywhere.
            prop_assert_eq!(min, 0.0);
            prop_assert!(max == 1.0 || max == 0.0, "column max {}", max);
        }
    }

    #[test]
    fn one_hot_block_marks_at_most_one_mode(
        fitted in prop::collection::vec(select(TRANSPORT_MODES.to_vec()), 1..30),
        probe in select(vec!["Automobile", "Bike", "Motorbike", "Public_Transportation", "Walking", "Scooter"]),
    ) {
        let encoder = OneHotEncoder::fit("mtrans", fitted.iter().copied(), "Walking");
        let mut distinct = fitted.clone();
        distinct.retain(|m| *m != "Walking");
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(encoder.width(), distinct.len());

        let mut block = vec![0.0; encoder.width()];
        encoder.encode_into(probe, &mut block);
        let total: f64 = block.iter().sum();
        prop_assert!(block.iter().all(|&v| v == 0.0 || v == 1.0));
        prop_assert_eq!(total, if distinct.contains(&probe) { 1.0 } else { 0.0 });
    }

    #[test]
    fn rows_transform_independently(records in prop::collection::vec(arb_record(), 2..30)) {
        let mut transformer = FeatureTransformer::new();
        let batch = transformer.fit_transform(&records).unwrap();
        let batch_view = batch.view();

        for (i, record) in records.iter().enumerate() {
            let single = transformer.transform(std::slice::from_ref(record)).unwrap();
            let single_view = single.view();
            prop_assert_eq!(single_view.row(0), batch_view.row(i));
        }
    }

    #[test]
    fn labels_are_class_codes(records in prop::collection::vec(arb_record(), 1..40)) {
        let labels = FeatureTransformer::labels(&records).unwrap();
        prop_assert_eq!(labels.len(), records.len());
        prop_assert!(labels.iter().all(|&l| (l as usize) < N_CLASSES));
    }
}

// =============================================================================
// Fixed Cases
// =============================================================================

#[test]
fn values_beyond_fitted_range_are_not_clamped() {
    let records = synthetic_records(70, 8);
    let mut transformer = FeatureTransformer::new();
    transformer.fit(&records).unwrap();

    let max_weight = records.iter().map(|r| r.weight).fold(f64::NEG_INFINITY, f64::max);
    let min_age = records.iter().map(|r| r.age).fold(f64::INFINITY, f64::min);
    let mut outlier = records[0].clone();
    outlier.weight = max_weight * 2.0;
    outlier.age = min_age / 2.0;

    let x = transformer.transform(&[outlier]).unwrap();
    let weight = x.view()[[0, 2]];
    let age = x.view()[[0, 0]];
    assert!(weight > 1.0, "weight scaled to {weight}");
    assert!(age < 0.0, "age scaled to {age}");
}

#[test]
fn unknown_transport_mode_encodes_to_zeros() {
    let records = synthetic_records(35, 3);
    let mut transformer = FeatureTransformer::new();
    transformer.fit(&records).unwrap();

    let mut unknown = records[0].clone();
    unknown.mtrans = "Scooter".to_string();
    let mut walking = records[0].clone();
    walking.mtrans = "Walking".to_string();

    let full = transformer.transform_full(&[unknown, walking]).unwrap();
    let transport: Vec<usize> = full
        .names()
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with("mtrans_"))
        .map(|(j, _)| j)
        .collect();
    assert_eq!(transport.len(), 4);
    for j in transport {
        assert_eq!(full.view()[[0, j]], 0.0);
        assert_eq!(full.view()[[1, j]], 0.0);
    }
}
