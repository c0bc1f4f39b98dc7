//! Error taxonomy for the comparison core.
//!
//! Only genuinely unresolvable situations are errors: a pair of inputs no
//! kernel can compare, or 2D shapes that cannot be reconciled. Running out
//! of a search budget (`max_cost`, `max_calls`) is *not* an error — the
//! engine degrades to a partial result and the caller sees it through the
//! returned ratio/script.

use thiserror::Error;

/// Errors produced by comparator resolution and the 2D aligner.
///
/// Every error is local to the call that produced it; no scratch state
/// survives into subsequent calls.
#[derive(Debug, Error)]
pub enum DiffError {
    /// No comparison kernel exists for the given pair of inputs.
    ///
    /// Raised for heterogeneous view pairs (e.g. a 32-bit buffer against a
    /// 64-bit one) and for callback/object comparisons when the caller
    /// demanded a native buffer kernel.
    #[error("no comparison kernel for input pair: {left} vs {right}")]
    Protocol {
        left: &'static str,
        right: &'static str,
    },

    /// Incompatible 2D shapes: mismatched column counts with nothing to
    /// reconcile them, a weight vector of the wrong length, or a matrix
    /// view whose buffer does not match `rows * cols`.
    #[error("incompatible shapes: {reason}")]
    Shape { reason: String },
}

impl DiffError {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        DiffError::Shape {
            reason: reason.into(),
        }
    }
}
