//! Errors raised by series construction, mutation, and access.

use thiserror::Error;

/// Errors returned by [`XySeries`](crate::XySeries) and
/// [`SeriesData`](crate::SeriesData).
///
/// All of these are caller-contract violations or empty-state conditions.
/// They are never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    /// A required sequence was not supplied.
    #[error("both x and y values are required")]
    NullArgument,
    /// Paired x/y sequences differ in length.
    #[error("x and y values must have the same length (x: {x_len}, y: {y_len})")]
    LengthMismatch {
        /// Number of x values supplied.
        x_len: usize,
        /// Number of y values supplied.
        y_len: usize,
    },
    /// Interleaved input has an odd number of elements.
    #[error("cannot build xy pairs from an odd-sized interleaved model ({len} values)")]
    OddLengthInterleaved {
        /// Number of values supplied.
        len: usize,
    },
    /// Unknown array format name.
    #[error("unknown array format `{0}`")]
    InvalidFormat(String),
    /// Index outside the addressed sequence.
    ///
    /// `len` is 0 when the x-sequence is addressed in implicit mode.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the addressed sequence.
        len: usize,
    },
    /// Removal from a series with no elements.
    #[error("series is empty")]
    EmptySeries,
}
