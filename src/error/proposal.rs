use thiserror::Error;

/// Errors raised while validating a proposal, before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The four parallel action sequences differ in length.
    #[error(
        "mismatched action lengths: {targets} targets, {values} values, {signatures} signatures, {calldatas} calldatas"
    )]
    LengthMismatch {
        /// Number of targets.
        targets: usize,
        /// Number of values.
        values: usize,
        /// Number of signatures.
        signatures: usize,
        /// Number of calldatas.
        calldatas: usize,
    },
}
