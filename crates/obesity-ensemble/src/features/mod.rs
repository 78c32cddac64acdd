//! Feature engineering: raw survey records to a scaled feature matrix.
//!
//! The transform runs in a fixed order:
//!
//! 1. Categorical fields resolve to codes: `gender` to the `male` flag, the
//!    yes/no columns to 0/1, `caec` and `calc` to their ordinal ranks. Any
//!    value outside a column's level set is an error.
//! 2. The transport mode is one-hot encoded with `Walking` as the dropped
//!    reference. Unknown modes encode to zeros.
//! 3. `age`, `height` and `weight` go through a natural log.
//! 4. All engineered columns are min-max scaled jointly with bounds learned
//!    at fit time.
//! 5. The frame is projected to [`SELECTED_FEATURES`].
//!
//! The fitted state (one-hot categories and scaler bounds) is serializable and
//! travels with the trained ensemble.

mod encode;
mod error;
mod scale;

pub use encode::{OneHotEncoder, parse_level};
pub use error::FeatureError;
pub use scale::{MinMaxScaler, log_transform, require_finite};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::{
    AlcoholFrequency, Answer, CategoryLevel, FeatureMatrix, Gender, ObesityClass, RawRecord,
    SnackFrequency, TransportGroup, TransportMode,
};

/// Columns fed to the classifiers, in order.
pub const SELECTED_FEATURES: [&str; 9] = [
    "age",
    "height",
    "weight",
    "family_history_with_overweight",
    "favc",
    "fcvc",
    "caec",
    "ch2o",
    "faf",
];

/// Engineered numeric columns ahead of the transport one-hot block.
pub const BASE_COLUMNS: [&str; 15] = [
    "male",
    "age",
    "height",
    "weight",
    "family_history_with_overweight",
    "favc",
    "fcvc",
    "ncp",
    "caec",
    "smoke",
    "ch2o",
    "scc",
    "faf",
    "tue",
    "calc",
];

const TRANSPORT_COLUMN: &str = "mtrans";

// =============================================================================
// EngineeredRecord
// =============================================================================

/// A survey row with every categorical field resolved to its numeric code.
///
/// Numeric fields are still unlogged and unscaled. The transport mode stays
/// textual for the one-hot encoder; its coarse group is kept for inspection
/// but never enters the numeric frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredRecord {
    pub male: f64,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub family_history_with_overweight: f64,
    pub favc: f64,
    pub fcvc: f64,
    pub ncp: f64,
    pub caec: f64,
    pub smoke: f64,
    pub ch2o: f64,
    pub scc: f64,
    pub faf: f64,
    pub tue: f64,
    pub calc: f64,
    pub mtrans: String,
    pub transport_group: Option<TransportGroup>,
}

impl EngineeredRecord {
    /// Resolve the categorical fields of `record` (row index `row`).
    ///
    /// # Errors
    ///
    /// [`FeatureError::UnmappedCategory`] for a binary or ordinal value
    /// outside its level set, [`FeatureError::InvalidNumericDomain`] for a
    /// non-finite numeric answer.
    pub fn from_raw(record: &RawRecord, row: usize) -> Result<Self, FeatureError> {
        let answer = |column: &'static str, value: &str| {
            parse_level::<Answer>(column, value, row).map(Answer::flag)
        };
        let mode = TransportMode::from_label(&record.mtrans);

        Ok(Self {
            male: parse_level::<Gender>("gender", &record.gender, row)?.male_flag(),
            age: record.age,
            height: record.height,
            weight: record.weight,
            family_history_with_overweight: answer(
                "family_history_with_overweight",
                &record.family_history_with_overweight,
            )?,
            favc: answer("favc", &record.favc)?,
            fcvc: require_finite("fcvc", record.fcvc, row)?,
            ncp: require_finite("ncp", record.ncp, row)?,
            caec: parse_level::<SnackFrequency>("caec", &record.caec, row)?.rank(),
            smoke: answer("smoke", &record.smoke)?,
            ch2o: require_finite("ch2o", record.ch2o, row)?,
            scc: answer("scc", &record.scc)?,
            faf: require_finite("faf", record.faf, row)?,
            tue: require_finite("tue", record.tue, row)?,
            calc: parse_level::<AlcoholFrequency>("calc", &record.calc, row)?.rank(),
            mtrans: record.mtrans.clone(),
            transport_group: mode.map(TransportMode::group),
        })
    }

    /// Base columns in [`BASE_COLUMNS`] order, with the log transform applied.
    fn base_values(&self, row: usize) -> Result<[f64; 15], FeatureError> {
        Ok([
            self.male,
            log_transform("age", self.age, row)?,
            log_transform("height", self.height, row)?,
            log_transform("weight", self.weight, row)?,
            self.family_history_with_overweight,
            self.favc,
            self.fcvc,
            self.ncp,
            self.caec,
            self.smoke,
            self.ch2o,
            self.scc,
            self.faf,
            self.tue,
            self.calc,
        ])
    }
}

// =============================================================================
// FeatureTransformer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedState {
    transport: OneHotEncoder,
    scaler: MinMaxScaler,
}

/// Fit-once, apply-many feature pipeline.
///
/// # Example
///
/// ```ignore
/// let mut transformer = FeatureTransformer::new();
/// let x_train = transformer.fit_transform(&train_records)?;
/// let y_train = FeatureTransformer::labels(&train_records)?;
/// let x_new = transformer.transform(&new_records)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    state: Option<FittedState>,
}

impl FeatureTransformer {
    /// Create an unfitted transformer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`fit`](Self::fit) has run.
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Learn one-hot categories and scaling bounds from `records`.
    ///
    /// # Errors
    ///
    /// Any categorical or log-domain error in `records`, or
    /// [`FeatureError::EmptyInput`] if there are none.
    pub fn fit(&mut self, records: &[RawRecord]) -> Result<&mut Self, FeatureError> {
        if records.is_empty() {
            return Err(FeatureError::EmptyInput);
        }
        let engineered = engineer_all(records)?;

        let transport = OneHotEncoder::fit(
            TRANSPORT_COLUMN,
            engineered.iter().map(|r| r.mtrans.as_str()),
            TransportMode::Walking.label(),
        );
        let frame = numeric_frame(&engineered, &transport)?;
        let scaler = MinMaxScaler::fit(&frame)?;

        tracing::debug!(
            rows = records.len(),
            columns = frame.ncols(),
            transport_columns = transport.width(),
            "fitted feature transformer"
        );
        self.state = Some(FittedState { transport, scaler });
        Ok(self)
    }

    /// Apply the fitted transform and project to [`SELECTED_FEATURES`].
    ///
    /// # Errors
    ///
    /// [`FeatureError::NotFitted`] before fitting, otherwise any categorical
    /// or log-domain error in `records`.
    pub fn transform(&self, records: &[RawRecord]) -> Result<FeatureMatrix, FeatureError> {
        let full = self.transform_full(records)?;
        let selected = full
            .select_columns(&SELECTED_FEATURES)
            .ok_or(FeatureError::ColumnCountMismatch {
                expected: SELECTED_FEATURES.len(),
                found: full.n_columns(),
            })?;
        Ok(selected)
    }

    /// Fit on `records`, then transform them.
    pub fn fit_transform(&mut self, records: &[RawRecord]) -> Result<FeatureMatrix, FeatureError> {
        self.fit(records)?;
        self.transform(records)
    }

    /// The full scaled frame over [`engineered_names`](Self::engineered_names),
    /// before column selection.
    pub fn transform_full(&self, records: &[RawRecord]) -> Result<FeatureMatrix, FeatureError> {
        let state = self.state.as_ref().ok_or(FeatureError::NotFitted)?;
        let engineered = engineer_all(records)?;
        let mut frame = numeric_frame(&engineered, &state.transport)?;
        state.scaler.transform_inplace(&mut frame)?;

        Ok(FeatureMatrix::new(
            engineered_names(&state.transport),
            frame.mapv(|x| x as f32),
        ))
    }

    /// Columns of the engineered frame the scaler is fitted on.
    pub fn engineered_names(&self) -> Result<Vec<String>, FeatureError> {
        let state = self.state.as_ref().ok_or(FeatureError::NotFitted)?;
        Ok(engineered_names(&state.transport))
    }

    /// The fitted scaler.
    pub fn scaler(&self) -> Result<&MinMaxScaler, FeatureError> {
        self.state.as_ref().map(|s| &s.scaler).ok_or(FeatureError::NotFitted)
    }

    /// Integer class codes for the target column of `records`.
    ///
    /// # Errors
    ///
    /// [`FeatureError::MissingTarget`] for an unlabeled row,
    /// [`FeatureError::UnmappedCategory`] for an unknown class name.
    pub fn labels(records: &[RawRecord]) -> Result<Vec<u32>, FeatureError> {
        records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let label = record
                    .nobeyesdad
                    .as_deref()
                    .ok_or(FeatureError::MissingTarget { row })?;
                parse_level::<ObesityClass>("nobeyesdad", label, row).map(ObesityClass::code)
            })
            .collect()
    }
}

fn engineer_all(records: &[RawRecord]) -> Result<Vec<EngineeredRecord>, FeatureError> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| EngineeredRecord::from_raw(record, row))
        .collect()
}

fn engineered_names(transport: &OneHotEncoder) -> Vec<String> {
    BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(transport.output_names())
        .collect()
}

/// Build the unscaled `[n_rows, 15 + one-hot width]` frame.
fn numeric_frame(
    records: &[EngineeredRecord],
    transport: &OneHotEncoder,
) -> Result<Array2<f64>, FeatureError> {
    let n_base = BASE_COLUMNS.len();
    let mut frame = Array2::zeros((records.len(), n_base + transport.width()));
    let mut indicators = vec![0.0; transport.width()];

    for (row, (record, mut out)) in records.iter().zip(frame.rows_mut()).enumerate() {
        let base = record.base_values(row)?;
        transport.encode_into(&record.mtrans, &mut indicators);
        for (dst, src) in out.iter_mut().zip(base.iter().chain(&indicators)) {
            *dst = *src;
        }
    }
    Ok(frame)
}
