use core::fmt;

/// Result alias for `ncut`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction, the eigensolver, and the
/// partitioning pipeline.
///
/// Only hard input-validation failures are errors. Iteration-budget
/// exhaustion is reported through [`Convergence`] on an `Ok` value so that
/// callers can decide whether a degraded result is acceptable.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty (zero-vertex graph or empty embedding).
    EmptyInput,

    /// Array dimension mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of partitions requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Graph carries a negative edge weight.
    NegativeWeight {
        /// Source vertex of the offending entry.
        vertex: usize,
        /// The weight found.
        value: f64,
    },

    /// Graph carries a NaN or infinite edge weight.
    NonFiniteWeight {
        /// Source vertex of the offending entry.
        vertex: usize,
    },

    /// A partition label lies outside `[0, n_parts)`.
    InvalidLabel {
        /// Vertex carrying the label.
        vertex: usize,
        /// The label found.
        label: usize,
        /// Number of partitions the labeling was checked against.
        n_parts: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} partitions from {n_items} vertices")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::NegativeWeight { vertex, value } => {
                write!(f, "negative edge weight {value} at vertex {vertex}")
            }
            Error::NonFiniteWeight { vertex } => {
                write!(f, "non-finite edge weight at vertex {vertex}")
            }
            Error::InvalidLabel { vertex, label, n_parts } => {
                write!(
                    f,
                    "label {label} at vertex {vertex} is outside [0, {n_parts})"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// Outcome tag shared by the iterative solvers.
///
/// Distinguishes "met the tolerance" from "stopped at the iteration budget".
/// The latter still carries the best estimate found so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// Tolerance was met within the iteration budget.
    Converged,
    /// Iteration budget was exhausted first; output is best-effort.
    IterationLimit,
}

impl Convergence {
    /// True if the tolerance was met.
    pub fn is_converged(self) -> bool {
        matches!(self, Convergence::Converged)
    }

    /// Combine two stage outcomes: converged only if both stages converged.
    pub fn and(self, other: Convergence) -> Convergence {
        if self.is_converged() && other.is_converged() {
            Convergence::Converged
        } else {
            Convergence::IterationLimit
        }
    }
}
