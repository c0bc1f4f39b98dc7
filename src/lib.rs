//! Structural sequence comparison built on a linear-space Myers search
//! generalized from strict equality to a continuous similarity function.
//!
//! The crate computes minimal-cost alignments between two ordered
//! sequences of arbitrary element type, optionally recursing into
//! aligned-but-unequal elements, and aligns whole matrices row- and
//! column-wise ("align-inflate"). Search budgets (`max_cost`,
//! `max_calls`) and an acceptance threshold make every comparison
//! interruptible: running out of budget degrades the answer instead of
//! failing.

pub mod chunk; // diff tree model: chunks, signatures, coarse transforms
pub mod error; // error taxonomy (protocol/shape)
pub mod matrix; // 2D align-inflate over row-major matrix views
pub mod myers; // the linear-space bidirectional search engine
pub mod score; // typed-buffer kernels and comparator resolution
pub mod sequence; // diff entry points and nested recursion

pub use chunk::{Chunk, ChunkSignature, Diff, Signature, SliceDiff};
pub use error::DiffError;
pub use matrix::{
    align_inflate, diff_aligned_2d, get_row_col_diff, Matrix, MatrixDiff, MatrixDiffOptions,
    MatrixRef,
};
pub use myers::{DiffWorkspace, FnScore, Score, SearchParams};
pub use score::{RowEq, SeqView};
pub use sequence::{
    diff, diff_nested, diff_views, diff_with, nested_ratio, similarity_ratio, DiffOptions, Nested,
};
