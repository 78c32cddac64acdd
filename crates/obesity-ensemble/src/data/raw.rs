//! Raw survey records and the closed category sets of their fields.
//!
//! A [`RawRecord`] is one CSV row, deserialized by (lowercased) column name.
//! Categorical fields stay as strings here; they are resolved against the
//! closed enums below by the feature transformer, which reports the row and
//! column of any value outside the known set.

use serde::{Deserialize, Serialize};

// =============================================================================
// Schema
// =============================================================================

/// Identifier column, dropped before feature engineering.
pub const ID_COLUMN: &str = "id";

/// Target column (lowercased).
pub const TARGET_COLUMN: &str = "nobeyesdad";

/// Feature columns every input file must carry (lowercased).
pub const FEATURE_COLUMNS: [&str; 16] = [
    "gender",
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
    "mtrans",
];

/// Header of the source files, in their original casing.
pub const SOURCE_HEADER: [&str; 18] = [
    "id",
    "Gender",
    "Age",
    "Height",
    "Weight",
    "family_history_with_overweight",
    "FAVC",
    "FCVC",
    "NCP",
    "CAEC",
    "SMOKE",
    "CH2O",
    "SCC",
    "FAF",
    "TUE",
    "CALC",
    "MTRANS",
    "NObeyesdad",
];

// =============================================================================
// RawRecord
// =============================================================================

/// One row of the survey table.
///
/// Field names match the lowercased CSV header. The target is optional so
/// the same type serves unlabeled (inference) files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub gender: String,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub family_history_with_overweight: String,
    pub favc: String,
    pub fcvc: f64,
    pub ncp: f64,
    pub caec: String,
    pub smoke: String,
    pub ch2o: f64,
    pub scc: String,
    pub faf: f64,
    pub tue: f64,
    pub calc: String,
    pub mtrans: String,
    #[serde(default)]
    pub nobeyesdad: Option<String>,
}

// =============================================================================
// Category Sets
// =============================================================================

/// A closed set of labels a categorical column may take.
pub trait CategoryLevel: Sized + Copy + 'static {
    /// All levels, in declaration order.
    const LEVELS: &'static [Self];

    /// The label as written in the source data.
    fn label(self) -> &'static str;

    /// Resolve a source label. `None` for anything outside the set.
    fn from_label(label: &str) -> Option<Self> {
        Self::LEVELS.iter().copied().find(|level| level.label() == label)
    }
}

/// Respondent sex, encoded as the `male` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// 0 for female, 1 for male.
    pub fn male_flag(self) -> f64 {
        match self {
            Gender::Female => 0.0,
            Gender::Male => 1.0,
        }
    }
}

impl CategoryLevel for Gender {
    const LEVELS: &'static [Self] = &[Gender::Female, Gender::Male];

    fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

/// Answer to a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    No,
    Yes,
}

impl Answer {
    /// 0 for no, 1 for yes.
    pub fn flag(self) -> f64 {
        match self {
            Answer::No => 0.0,
            Answer::Yes => 1.0,
        }
    }
}

impl CategoryLevel for Answer {
    const LEVELS: &'static [Self] = &[Answer::No, Answer::Yes];

    fn label(self) -> &'static str {
        match self {
            Answer::No => "no",
            Answer::Yes => "yes",
        }
    }
}

/// Frequency of eating between meals (`caec`): four ranked levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SnackFrequency {
    No,
    Sometimes,
    Frequently,
    Always,
}

impl SnackFrequency {
    /// Ordinal rank, `no = 0` through `Always = 3`.
    pub fn rank(self) -> f64 {
        self as u8 as f64
    }
}

impl CategoryLevel for SnackFrequency {
    const LEVELS: &'static [Self] = &[
        SnackFrequency::No,
        SnackFrequency::Sometimes,
        SnackFrequency::Frequently,
        SnackFrequency::Always,
    ];

    fn label(self) -> &'static str {
        match self {
            SnackFrequency::No => "no",
            SnackFrequency::Sometimes => "Sometimes",
            SnackFrequency::Frequently => "Frequently",
            SnackFrequency::Always => "Always",
        }
    }
}

/// Frequency of alcohol consumption (`calc`): three ranked levels.
///
/// `Always` is deliberately not a level; the training data never carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlcoholFrequency {
    No,
    Sometimes,
    Frequently,
}

impl AlcoholFrequency {
    /// Ordinal rank, `no = 0` through `Frequently = 2`.
    pub fn rank(self) -> f64 {
        self as u8 as f64
    }
}

impl CategoryLevel for AlcoholFrequency {
    const LEVELS: &'static [Self] = &[
        AlcoholFrequency::No,
        AlcoholFrequency::Sometimes,
        AlcoholFrequency::Frequently,
    ];

    fn label(self) -> &'static str {
        match self {
            AlcoholFrequency::No => "no",
            AlcoholFrequency::Sometimes => "Sometimes",
            AlcoholFrequency::Frequently => "Frequently",
        }
    }
}

/// Usual transportation mode (`mtrans`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Automobile,
    Bike,
    Motorbike,
    PublicTransportation,
    Walking,
}

impl TransportMode {
    /// Coarse category of the mode.
    pub fn group(self) -> TransportGroup {
        match self {
            TransportMode::PublicTransportation => TransportGroup::Public,
            TransportMode::Automobile | TransportMode::Motorbike => TransportGroup::Private,
            TransportMode::Walking | TransportMode::Bike => TransportGroup::Physical,
        }
    }
}

impl CategoryLevel for TransportMode {
    const LEVELS: &'static [Self] = &[
        TransportMode::Automobile,
        TransportMode::Bike,
        TransportMode::Motorbike,
        TransportMode::PublicTransportation,
        TransportMode::Walking,
    ];

    fn label(self) -> &'static str {
        match self {
            TransportMode::Automobile => "Automobile",
            TransportMode::Bike => "Bike",
            TransportMode::Motorbike => "Motorbike",
            TransportMode::PublicTransportation => "Public_Transportation",
            TransportMode::Walking => "Walking",
        }
    }
}

/// Coarse transportation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportGroup {
    Public,
    Private,
    Physical,
}

/// Weight-status class, the prediction target.
///
/// The discriminant is the integer label used for training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ObesityClass {
    InsufficientWeight = 0,
    NormalWeight = 1,
    OverweightLevelI = 2,
    OverweightLevelII = 3,
    ObesityTypeI = 4,
    ObesityTypeII = 5,
    ObesityTypeIII = 6,
}

/// Number of target classes.
pub const N_CLASSES: usize = 7;

impl ObesityClass {
    /// Integer label (0-6).
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Class for an integer label.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::LEVELS.get(code as usize).copied()
    }

    /// Class names ordered by code.
    pub fn names() -> Vec<String> {
        Self::LEVELS.iter().map(|c| c.label().to_string()).collect()
    }
}

impl CategoryLevel for ObesityClass {
    const LEVELS: &'static [Self] = &[
        ObesityClass::InsufficientWeight,
        ObesityClass::NormalWeight,
        ObesityClass::OverweightLevelI,
        ObesityClass::OverweightLevelII,
        ObesityClass::ObesityTypeI,
        ObesityClass::ObesityTypeII,
        ObesityClass::ObesityTypeIII,
    ];

    fn label(self) -> &'static str {
        match self {
            ObesityClass::InsufficientWeight => "Insufficient_Weight",
            ObesityClass::NormalWeight => "Normal_Weight",
            ObesityClass::OverweightLevelI => "Overweight_Level_I",
            ObesityClass::OverweightLevelII => "Overweight_Level_II",
            ObesityClass::ObesityTypeI => "Obesity_Type_I",
            ObesityClass::ObesityTypeII => "Obesity_Type_II",
            ObesityClass::ObesityTypeIII => "Obesity_Type_III",
        }
    }
}
