//! Survey data: raw records, CSV loading, feature matrices and splitting.
//!
//! - [`RawRecord`]: one CSV row with string categories and `f64` numerics
//! - [`DatasetLoader`]: header-normalizing CSV reader
//! - [`FeatureMatrix`]: named `f32` matrix consumed by the learners
//! - [`stratified_split`]: seeded train/test partition preserving class ratios

mod error;
mod loader;
mod matrix;
pub mod raw;
mod split;

pub use error::DatasetLoadError;
pub use loader::DatasetLoader;
pub use matrix::FeatureMatrix;
pub use raw::{
    AlcoholFrequency, Answer, CategoryLevel, Gender, N_CLASSES, ObesityClass, RawRecord,
    SnackFrequency, TransportGroup, TransportMode,
};
pub use split::{SplitError, TrainTestSplit, stratified_split};
