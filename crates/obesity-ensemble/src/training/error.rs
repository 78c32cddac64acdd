//! Training errors.

/// Errors raised by the trainers and the ensemble.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainError {
    #[error("training set is empty")]
    EmptyDataset,

    #[error("{rows} feature rows but {labels} labels")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: u32, n_classes: usize },

    #[error("need at least 2 classes, got {0}")]
    TooFewClasses(usize),

    #[error("ensemble has no members")]
    NoMembers,

    #[error("member '{name}' disagrees on {what}: expected {expected}, got {found}")]
    MemberMismatch {
        name: String,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("duplicate member name '{0}'")]
    DuplicateMember(String),
}

/// Check shapes and labels shared by every trainer.
pub(crate) fn check_training_data(
    n_rows: usize,
    labels: &[u32],
    n_classes: usize,
) -> Result<(), TrainError> {
    if n_rows == 0 {
        return Err(TrainError::EmptyDataset);
    }
    if n_rows != labels.len() {
        return Err(TrainError::ShapeMismatch { rows: n_rows, labels: labels.len() });
    }
    if n_classes < 2 {
        return Err(TrainError::TooFewClasses(n_classes));
    }
    if let Some(&label) = labels.iter().find(|&&l| l as usize >= n_classes) {
        return Err(TrainError::LabelOutOfRange { label, n_classes });
    }
    Ok(())
}
