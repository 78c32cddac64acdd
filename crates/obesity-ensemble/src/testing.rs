//! Synthetic survey data for tests and benchmarks.

use std::path::Path;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::raw::SOURCE_HEADER;
use crate::data::{CategoryLevel, ObesityClass, RawRecord, TransportMode};

/// BMI range `[lo, hi)` typical of each class, indexed by class code.
const BMI_BANDS: [(f64, f64); 7] = [
    (15.0, 18.4),
    (18.6, 24.8),
    (25.1, 27.4),
    (27.6, 29.8),
    (30.2, 34.8),
    (35.2, 39.8),
    (40.2, 48.0),
];

const SNACK_LEVELS: [&str; 4] = ["no", "Sometimes", "Frequently", "Always"];
const ALCOHOL_LEVELS: [&str; 3] = ["no", "Sometimes", "Frequently"];

fn yes_no(flag: bool) -> String {
    let answer = if flag { "yes" } else { "no" };
    answer.to_string()
}

/// A labeled record with typical values for every field not given.
///
/// Transport defaults to `Public_Transportation`.
pub fn record(gender: &str, age: f64, height: f64, weight: f64, class: &str) -> RawRecord {
    RawRecord {
        id: "0".to_string(),
        gender: gender.to_string(),
        age,
        height,
        weight,
        family_history_with_overweight: "yes".to_string(),
        favc: "no".to_string(),
        fcvc: 2.0,
        ncp: 3.0,
        caec: "Sometimes".to_string(),
        smoke: "no".to_string(),
        ch2o: 2.0,
        scc: "no".to_string(),
        faf: 1.0,
        tue: 1.0,
        calc: "Sometimes".to_string(),
        mtrans: TransportMode::PublicTransportation.label().to_string(),
        nobeyesdad: Some(class.to_string()),
    }
}

/// Generate `n` labeled records with balanced classes.
///
/// Row `i` has class `i % 7`. Weight is drawn so the BMI falls inside the
/// class band, which makes the classes separable from height and weight.
/// Lifestyle fields drift with the class but overlap. Transport modes cycle
/// through every level. The same `seed` always gives the same records.
pub fn synthetic_records(n: usize, seed: u64) -> Vec<RawRecord> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let classes = ObesityClass::LEVELS;
    let modes = TransportMode::LEVELS;

    (0..n)
        .map(|i| {
            let class = classes[i % classes.len()];
            let severity = class.code() as f64 / (classes.len() - 1) as f64;
            let (lo, hi) = BMI_BANDS[class.code() as usize];

            let height: f64 = rng.gen_range(1.50..1.95);
            let bmi: f64 = rng.gen_range(lo..hi);
            RawRecord {
                id: i.to_string(),
                gender: (if rng.gen_bool(0.5) { "Male" } else { "Female" }).to_string(),
                age: rng.gen_range(16.0..55.0),
                height,
                weight: bmi * height * height,
                family_history_with_overweight: yes_no(rng.gen_bool(0.2 + 0.6 * severity)),
                favc: yes_no(rng.gen_bool(0.3 + 0.6 * severity)),
                fcvc: rng.gen_range(1.0..=3.0),
                ncp: rng.gen_range(1.0..=4.0),
                caec: SNACK_LEVELS[rng.gen_range(0..SNACK_LEVELS.len())].to_string(),
                smoke: yes_no(rng.gen_bool(0.05)),
                ch2o: rng.gen_range(1.0..=3.0),
                scc: yes_no(rng.gen_bool(0.1)),
                faf: rng.gen_range(0.0..=3.0) * (1.0 - 0.5 * severity),
                tue: rng.gen_range(0.0..=2.0),
                calc: ALCOHOL_LEVELS[rng.gen_range(0..ALCOHOL_LEVELS.len())].to_string(),
                mtrans: modes[i % modes.len()].label().to_string(),
                nobeyesdad: Some(class.label().to_string()),
            }
        })
        .collect()
}

/// Write `records` as a CSV file with the source header casing.
pub fn write_csv(path: impl AsRef<Path>, records: &[RawRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(SOURCE_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
