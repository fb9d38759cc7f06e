use thiserror::Error;

/// Failure reading a dependency out of a [`Values`](crate::Values) snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuesError {
    #[error("dependency index {index} out of range ({len} declared)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("dependency {index} holds `{found}`, read as `{expected}`")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("dependency {index} has never been set")]
    Unset { index: usize },
}
