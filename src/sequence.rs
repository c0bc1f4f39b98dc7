//! Sequence diff entry points and the nested recursion.
//!
//! [`diff`] compares two slices by element equality, [`diff_with`] scores
//! through a caller closure, [`diff_views`] runs the typed-buffer kernels
//! and [`diff_nested`] recurses into elements that are themselves
//! sequences. All of them fold the engine's edit codes into a chunk tree
//! and report `ratio = 1 - cost / (n + m)`.

use std::cell::RefCell;

use crate::chunk::{Chunk, Diff};
use crate::error::DiffError;
use crate::myers::{search_graph, DiffWorkspace, FnScore, Score, SearchParams};
use crate::score::{resolve, SeqView, SliceEq};

/// Default recursion depth bound for nested inputs.
pub const MAX_DEPTH: usize = 0xFF;

/// Per-call comparison options.
///
/// `accept` is the similarity threshold at which two elements count as
/// aligned (1.0 = exact; must be strictly positive for plain equality
/// comparison to be meaningful). `min_ratio` is the floor under which the
/// whole comparison is abandoned: when the edit cost would push the ratio
/// below it, the result collapses to `ratio = 0` with a single opaque
/// mismatch. `max_cost` / `max_calls` bound the search itself; budget
/// exhaustion degrades the result the same way and is never an error.
///
/// In nested mode, `max_cost_row` replaces `max_cost` below the top level
/// (per-row budgets for table/row diffing), `accept` doubles as the
/// strictness floor of per-element sub-comparisons, and `max_depth`
/// bounds the recursion. `require_kernel` refuses object/callback scoring
/// so that accidental slow paths surface as [`DiffError::Protocol`].
#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub accept: f64,
    pub min_ratio: f64,
    pub max_cost: usize,
    pub max_cost_row: usize,
    pub max_calls: usize,
    pub max_depth: usize,
    pub require_kernel: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            accept: 1.0,
            min_ratio: 0.0,
            max_cost: usize::MAX,
            max_cost_row: usize::MAX,
            max_calls: usize::MAX,
            max_depth: MAX_DEPTH,
            require_kernel: false,
        }
    }
}

/// Strictness floor and cost budget for one nesting level.
#[inline]
fn level_budgets(opts: &DiffOptions, depth: usize) -> (f64, usize) {
    if depth == 0 {
        (opts.min_ratio, opts.max_cost)
    } else {
        (opts.accept, opts.max_cost_row)
    }
}

/// The cost above which `min_ratio` can no longer be met.
#[inline]
fn effective_max_cost(total: usize, min_ratio: f64, max_cost: usize) -> usize {
    let cap = (total as f64 - total as f64 * min_ratio) as usize;
    max_cost.min(cap)
}

/// Compare two slices by element equality.
///
/// Returns the chunk tree and ratio; fails only when `require_kernel`
/// rejects the object comparison path.
pub fn diff<T: PartialEq>(a: &[T], b: &[T], opts: &DiffOptions) -> Result<Diff, DiffError> {
    reject_object_path(opts)?;
    let mut ws = DiffWorkspace::new();
    let scorer = SliceEq { a, b };
    Ok(diff_impl(
        a.len(),
        b.len(),
        &scorer,
        opts.accept,
        opts.min_ratio,
        opts.max_cost,
        opts.max_calls,
        true,
        &mut ws,
    ))
}

/// Similarity ratio between two slices, skipping script recovery.
///
/// Faster than [`diff`] when only the ratio matters: the search stops as
/// soon as the minimal cost is known.
pub fn similarity_ratio<T: PartialEq>(a: &[T], b: &[T], opts: &DiffOptions) -> f64 {
    let mut ws = DiffWorkspace::new();
    let scorer = SliceEq { a, b };
    diff_impl(
        a.len(),
        b.len(),
        &scorer,
        opts.accept,
        opts.min_ratio,
        opts.max_cost,
        opts.max_calls,
        false,
        &mut ws,
    )
    .ratio
}

/// Compare two sequences of lengths `n` and `m` through a caller-supplied
/// similarity callback `(i, j) -> score in [0, 1]`.
pub fn diff_with<F>(n: usize, m: usize, scorer: F, opts: &DiffOptions) -> Result<Diff, DiffError>
where
    F: Fn(usize, usize) -> f64,
{
    if opts.require_kernel {
        return Err(DiffError::Protocol {
            left: "callback",
            right: "callback",
        });
    }
    let mut ws = DiffWorkspace::new();
    Ok(diff_impl(
        n,
        m,
        &FnScore(scorer),
        opts.accept,
        opts.min_ratio,
        opts.max_cost,
        opts.max_calls,
        true,
        &mut ws,
    ))
}

/// Compare two typed buffer views through a resolved kernel.
///
/// Fails with [`DiffError::Protocol`] when no kernel fits the pair.
pub fn diff_views(a: &SeqView<'_>, b: &SeqView<'_>, opts: &DiffOptions) -> Result<Diff, DiffError> {
    let kernel = resolve(a, b)?;
    let mut ws = DiffWorkspace::new();
    Ok(diff_impl(
        a.len(),
        b.len(),
        &kernel,
        opts.accept,
        opts.min_ratio,
        opts.max_cost,
        opts.max_calls,
        true,
        &mut ws,
    ))
}

fn reject_object_path(opts: &DiffOptions) -> Result<(), DiffError> {
    if opts.require_kernel {
        return Err(DiffError::Protocol {
            left: "object",
            right: "object",
        });
    }
    Ok(())
}

/// Run one engine search and fold the outcome into a [`Diff`].
#[allow(clippy::too_many_arguments)]
pub(crate) fn diff_impl<S: Score>(
    n: usize,
    m: usize,
    scorer: &S,
    accept: f64,
    min_ratio: f64,
    max_cost: usize,
    max_calls: usize,
    emit: bool,
    ws: &mut DiffWorkspace,
) -> Diff {
    let total = n + m;
    if total == 0 {
        return Diff {
            ratio: 1.0,
            chunks: emit.then(Vec::new),
        };
    }

    let budget = effective_max_cost(total, min_ratio, max_cost);
    let params = SearchParams {
        accept,
        max_cost: budget,
        max_calls,
    };

    let mut codes = emit.then(|| vec![0xFFu8; total]);
    let mut cost = search_graph(n, m, scorer, &params, codes.as_deref_mut(), ws);
    if let Some(codes) = &codes {
        // sub-searches may have degraded on a shared budget; trust the
        // script over the top-level return so ratio and chunks agree
        cost = codes.iter().filter(|&&c| c % 3 != 0).count();
    }

    if cost > budget {
        log::debug!(
            "similarity floor not met on a {}x{} pair (cost {} > {})",
            n,
            m,
            cost,
            budget
        );
        return Diff {
            ratio: 0.0,
            chunks: emit.then(|| vec![Chunk::new(0..n, 0..m, false)]),
        };
    }

    let ratio = (total - cost) as f64 / total as f64;
    let chunks = codes.map(|mut codes| {
        canonize(&mut codes);
        codes_to_chunks(&codes)
    });
    Diff { ratio, chunks }
}

/// Reorder every mixed delete/insert run into deletions-then-insertions.
///
/// The engine emits moves in search order; canonical scripts keep each
/// mismatch run grouped, which is what the chunk folding expects.
pub(crate) fn canonize(codes: &mut [u8]) {
    let mut n_horizontal = 0usize;
    let mut n_vertical = 0usize;
    let n = codes.len();
    for idx in 0..=n {
        let code = if idx != n { codes[idx] % 4 } else { 0 };
        if code == 1 {
            n_horizontal += 1;
        } else if code == 2 {
            n_vertical += 1;
        } else if n_horizontal + n_vertical > 0 {
            for slot in &mut codes[idx - n_horizontal - n_vertical..idx - n_vertical] {
                *slot = 1;
            }
            for slot in &mut codes[idx - n_vertical..idx] {
                *slot = 2;
            }
            n_horizontal = 0;
            n_vertical = 0;
        }
    }
}

/// Fold canonized edit codes into maximal same-kind chunks.
pub(crate) fn codes_to_chunks(codes: &[u8]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut offset_a = 0usize;
    let mut offset_b = 0usize;
    let mut current: Option<(bool, usize, usize)> = None; // (neq, len_a, len_b)

    let flush = |current: &mut Option<(bool, usize, usize)>,
                     offset_a: &mut usize,
                     offset_b: &mut usize,
                     chunks: &mut Vec<Chunk>| {
        if let Some((neq, len_a, len_b)) = current.take() {
            chunks.push(Chunk::new(
                *offset_a..*offset_a + len_a,
                *offset_b..*offset_b + len_b,
                !neq,
            ));
            *offset_a += len_a;
            *offset_b += len_b;
        }
    };

    for &code in codes {
        if code == 0 {
            continue;
        }
        let neq = code % 3 != 0;
        match &mut current {
            Some((cur_neq, len_a, len_b)) if *cur_neq == neq => {
                *len_a += (code % 2) as usize;
                *len_b += (code / 2) as usize;
            }
            _ => {
                flush(&mut current, &mut offset_a, &mut offset_b, &mut chunks);
                current = Some((neq, (code % 2) as usize, (code / 2) as usize));
            }
        }
    }
    flush(&mut current, &mut offset_a, &mut offset_b, &mut chunks);
    chunks
}

// ============================================================================
// Nested comparison
// ============================================================================

/// Elements that can participate in nested diffing.
///
/// Atoms (numbers, chars, bools) score plain equality and carry no inner
/// structure. Strings compare code-point-wise; slices and vectors recurse
/// element by element. Cyclic inputs are unrepresentable through these
/// types — ownership rules out a slice reachable from itself — so no cycle
/// detection runs; [`DiffOptions::max_depth`] still bounds the recursion.
pub trait Nested: PartialEq {
    /// True for leaf element types with no inner structure to recurse
    /// into. Atom mismatches stay opaque.
    const IS_ATOM: bool = false;

    /// Similarity of two elements at the next nesting level, in `[0, 1]`,
    /// computed in ratio-only mode under the per-row budgets.
    fn nested_ratio(
        &self,
        other: &Self,
        opts: &DiffOptions,
        depth: usize,
        ws: &mut DiffWorkspace,
    ) -> f64;

    /// Full diff between two elements; `None` for atoms.
    fn nested_diff(
        &self,
        other: &Self,
        opts: &DiffOptions,
        depth: usize,
        ws: &mut DiffWorkspace,
    ) -> Option<Diff>;
}

macro_rules! impl_nested_atom {
    ($($ty:ty),* $(,)?) => {$(
        impl Nested for $ty {
            const IS_ATOM: bool = true;

            #[inline]
            fn nested_ratio(
                &self,
                other: &Self,
                _opts: &DiffOptions,
                _depth: usize,
                _ws: &mut DiffWorkspace,
            ) -> f64 {
                (self == other) as u8 as f64
            }

            #[inline]
            fn nested_diff(
                &self,
                _other: &Self,
                _opts: &DiffOptions,
                _depth: usize,
                _ws: &mut DiffWorkspace,
            ) -> Option<Diff> {
                None
            }
        }
    )*};
}

impl_nested_atom!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, f32, f64,
);

impl Nested for &str {
    fn nested_ratio(
        &self,
        other: &Self,
        opts: &DiffOptions,
        _depth: usize,
        ws: &mut DiffWorkspace,
    ) -> f64 {
        str_diff(self, other, opts, false, ws).ratio
    }

    fn nested_diff(
        &self,
        other: &Self,
        opts: &DiffOptions,
        _depth: usize,
        ws: &mut DiffWorkspace,
    ) -> Option<Diff> {
        Some(str_diff(self, other, opts, true, ws))
    }
}

impl Nested for String {
    fn nested_ratio(
        &self,
        other: &Self,
        opts: &DiffOptions,
        _depth: usize,
        ws: &mut DiffWorkspace,
    ) -> f64 {
        str_diff(self, other, opts, false, ws).ratio
    }

    fn nested_diff(
        &self,
        other: &Self,
        opts: &DiffOptions,
        _depth: usize,
        ws: &mut DiffWorkspace,
    ) -> Option<Diff> {
        Some(str_diff(self, other, opts, true, ws))
    }
}

impl<T: Nested> Nested for Vec<T> {
    fn nested_ratio(
        &self,
        other: &Self,
        opts: &DiffOptions,
        depth: usize,
        ws: &mut DiffWorkspace,
    ) -> f64 {
        nested_seq_ratio(self, other, opts, depth, ws)
    }

    fn nested_diff(
        &self,
        other: &Self,
        opts: &DiffOptions,
        depth: usize,
        ws: &mut DiffWorkspace,
    ) -> Option<Diff> {
        Some(nested_seq_diff(self, other, opts, depth, ws))
    }
}

impl<T: Nested> Nested for &[T] {
    fn nested_ratio(
        &self,
        other: &Self,
        opts: &DiffOptions,
        depth: usize,
        ws: &mut DiffWorkspace,
    ) -> f64 {
        nested_seq_ratio(self, other, opts, depth, ws)
    }

    fn nested_diff(
        &self,
        other: &Self,
        opts: &DiffOptions,
        depth: usize,
        ws: &mut DiffWorkspace,
    ) -> Option<Diff> {
        Some(nested_seq_diff(self, other, opts, depth, ws))
    }
}

/// Code-point diff of two strings under the per-row budgets. The byte
/// kernel handles the all-ASCII case without decoding; chunk ranges are
/// code-point indices either way.
fn str_diff(a: &str, b: &str, opts: &DiffOptions, emit: bool, ws: &mut DiffWorkspace) -> Diff {
    if a.is_ascii() && b.is_ascii() {
        let scorer = SliceEq {
            a: a.as_bytes(),
            b: b.as_bytes(),
        };
        diff_impl(
            a.len(),
            b.len(),
            &scorer,
            1.0,
            opts.accept,
            opts.max_cost_row,
            opts.max_calls,
            emit,
            ws,
        )
    } else {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let scorer = SliceEq { a: &a, b: &b };
        diff_impl(
            a.len(),
            b.len(),
            &scorer,
            1.0,
            opts.accept,
            opts.max_cost_row,
            opts.max_calls,
            emit,
            ws,
        )
    }
}

/// Pairwise scorer that rates elements by their own nested similarity.
///
/// Inner searches need front buffers of their own; they share one
/// workspace per nesting level through a `RefCell`, so scoring all
/// `n * m` candidate pairs costs a single allocation.
struct NestedEq<'x, T> {
    a: &'x [T],
    b: &'x [T],
    opts: &'x DiffOptions,
    depth: usize,
    ws: &'x RefCell<DiffWorkspace>,
}

impl<T: Nested> Score for NestedEq<'_, T> {
    fn score(&self, i: usize, j: usize) -> f64 {
        self.a[i].nested_ratio(
            &self.b[j],
            self.opts,
            self.depth + 1,
            &mut self.ws.borrow_mut(),
        )
    }
}

/// Compare two slices, recursing into elements that are themselves
/// sequences.
///
/// A pair of elements aligns when its nested similarity clears
/// `opts.accept`; aligned-but-unequal pairs come back as single-pair
/// mismatch chunks carrying the pair's own diff tree, and delete+insert
/// runs are re-examined as sub-sequences when their provisional ratio
/// clears `min_ratio`.
pub fn diff_nested<T: Nested>(a: &[T], b: &[T], opts: &DiffOptions) -> Result<Diff, DiffError> {
    reject_object_path(opts)?;
    let mut ws = DiffWorkspace::new();
    Ok(nested_seq_diff(a, b, opts, 0, &mut ws))
}

/// Ratio-only nested comparison; see [`diff_nested`].
pub fn nested_ratio<T: Nested>(a: &[T], b: &[T], opts: &DiffOptions) -> f64 {
    let mut ws = DiffWorkspace::new();
    nested_seq_ratio(a, b, opts, 0, &mut ws)
}

pub(crate) fn nested_seq_ratio<T: Nested>(
    a: &[T],
    b: &[T],
    opts: &DiffOptions,
    depth: usize,
    ws: &mut DiffWorkspace,
) -> f64 {
    let (floor, budget) = level_budgets(opts, depth);
    if a.len() + b.len() == 0 {
        return 1.0;
    }
    if depth + 1 < opts.max_depth {
        let inner = RefCell::new(DiffWorkspace::new());
        let scorer = NestedEq {
            a,
            b,
            opts,
            depth,
            ws: &inner,
        };
        diff_impl(
            a.len(),
            b.len(),
            &scorer,
            opts.accept,
            floor,
            budget,
            opts.max_calls,
            false,
            ws,
        )
        .ratio
    } else {
        let scorer = SliceEq { a, b };
        diff_impl(
            a.len(),
            b.len(),
            &scorer,
            1.0,
            floor,
            budget,
            opts.max_calls,
            false,
            ws,
        )
        .ratio
    }
}

pub(crate) fn nested_seq_diff<T: Nested>(
    a: &[T],
    b: &[T],
    opts: &DiffOptions,
    depth: usize,
    ws: &mut DiffWorkspace,
) -> Diff {
    let (floor, budget) = level_budgets(opts, depth);
    let n = a.len();
    let m = b.len();
    if n + m == 0 {
        return Diff {
            ratio: 1.0,
            chunks: Some(Vec::new()),
        };
    }

    let deep = depth + 1 < opts.max_depth;
    if !deep {
        let scorer = SliceEq { a, b };
        return diff_impl(n, m, &scorer, 1.0, floor, budget, opts.max_calls, true, ws);
    }

    let inner = RefCell::new(DiffWorkspace::new());
    let top = {
        let scorer = NestedEq {
            a,
            b,
            opts,
            depth,
            ws: &inner,
        };
        diff_impl(
            n,
            m,
            &scorer,
            opts.accept,
            floor,
            budget,
            opts.max_calls,
            true,
            ws,
        )
    };
    let mut inner = inner.into_inner();

    let chunks = top.chunks.expect("script mode always yields chunks");
    // Mismatched content is re-examined below the alignment threshold:
    // a replaced element may still be mostly similar inside.
    let relaxed = DiffOptions {
        accept: floor,
        min_ratio: floor,
        ..opts.clone()
    };
    let mut out = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if chunk.eq {
            dig_aligned_run(a, b, &chunk, opts, depth, &mut inner, &mut out);
            continue;
        }
        if T::IS_ATOM || chunk.len_a() == 0 || chunk.len_b() == 0 {
            out.push(chunk);
            continue;
        }
        if chunk.len_a() == 1 && chunk.len_b() == 1 {
            // a single replaced element: diff its contents directly
            let ai = chunk.a.start;
            let bi = chunk.b.start;
            let nested = a[ai]
                .nested_diff(&b[bi], &relaxed, depth + 1, &mut inner)
                .filter(|d| d.ratio > floor);
            out.push(Chunk {
                a: chunk.a,
                b: chunk.b,
                eq: false,
                nested,
            });
            continue;
        }
        // Re-examine a longer mismatch run as a pair of sub-sequences.
        // Needs a positive floor to give the re-alignment any signal, and
        // must not span both inputs entirely (no progress in re-diffing).
        let whole = chunk.len_a() == n && chunk.len_b() == m;
        if floor > 0.0 && !whole {
            let side_a = &a[chunk.a.clone()];
            let side_b = &b[chunk.b.clone()];
            let provisional = nested_seq_ratio(side_a, side_b, &relaxed, depth, &mut inner);
            if provisional > floor {
                let sub = nested_seq_diff(side_a, side_b, &relaxed, depth, &mut inner);
                out.push(Chunk {
                    a: chunk.a,
                    b: chunk.b,
                    eq: false,
                    nested: Some(sub),
                });
                continue;
            }
        }
        out.push(chunk);
    }

    Diff {
        ratio: top.ratio,
        chunks: Some(out),
    }
}

/// Split an aligned run into exactly-equal stretches and per-pair nested
/// chunks for the aligned-but-unequal element pairs.
fn dig_aligned_run<T: Nested>(
    a: &[T],
    b: &[T],
    chunk: &Chunk,
    opts: &DiffOptions,
    depth: usize,
    ws: &mut DiffWorkspace,
    out: &mut Vec<Chunk>,
) {
    let (floor, _) = level_budgets(opts, depth);
    let len = chunk.len_a();
    let mut run_start = 0usize;
    for k in 0..len {
        let ai = chunk.a.start + k;
        let bi = chunk.b.start + k;
        if a[ai] == b[bi] {
            continue;
        }
        if k > run_start {
            out.push(Chunk::new(
                chunk.a.start + run_start..ai,
                chunk.b.start + run_start..bi,
                true,
            ));
        }
        let nested = a[ai]
            .nested_diff(&b[bi], opts, depth + 1, ws)
            .filter(|d| d.ratio > floor);
        out.push(Chunk {
            a: ai..ai + 1,
            b: bi..bi + 1,
            eq: false,
            nested,
        });
        run_start = k + 1;
    }
    if len > run_start {
        out.push(Chunk::new(
            chunk.a.start + run_start..chunk.a.end,
            chunk.b.start + run_start..chunk.b.end,
            true,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::SliceDiff;

    #[test]
    fn test_grocery_lists() {
        let a = ["apples", "bananas", "carrots", "dill"];
        let b = ["apples", "carrots", "dill", "eggplant"];
        let diff = diff(&a, &b, &DiffOptions::default()).unwrap();
        assert_eq!(diff.ratio, 0.75);

        let chunks = diff.chunks.as_ref().unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks[0].eq);
        assert_eq!(chunks[0].data_a(&a), &["apples"]);
        assert!(!chunks[1].eq);
        assert_eq!(chunks[1].data_a(&a), &["bananas"]);
        assert_eq!(chunks[1].data_b(&b), &[] as &[&str]);
        assert!(chunks[2].eq);
        assert_eq!(chunks[2].data_a(&a), &["carrots", "dill"]);
        assert!(!chunks[3].eq);
        assert_eq!(chunks[3].data_b(&b), &["eggplant"]);
    }

    #[test]
    fn test_identical_inputs() {
        let a = [1, 2, 3, 4, 5];
        let diff = diff(&a, &a, &DiffOptions::default()).unwrap();
        assert_eq!(diff.ratio, 1.0);
        let chunks = diff.chunks.unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].eq);
        assert_eq!(chunks[0].a, 0..5);
        assert_eq!(chunks[0].b, 0..5);
    }

    #[test]
    fn test_empty_inputs() {
        let a: [u32; 0] = [];
        let diff = diff(&a, &a, &DiffOptions::default()).unwrap();
        assert_eq!(diff.ratio, 1.0);
        assert!(diff.chunks.unwrap().is_empty());
    }

    #[test]
    fn test_reconstruction() {
        let a: Vec<i32> = vec![3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
        let b: Vec<i32> = vec![2, 7, 1, 8, 2, 8, 1, 4, 1, 5, 9];
        let d = diff(&a, &b, &DiffOptions::default()).unwrap();
        let bound = SliceDiff::new(d, &a, &b);
        assert_eq!(bound.get_a(), a);
        assert_eq!(bound.get_b(), b);
    }

    #[test]
    fn test_ratio_bounds() {
        let a = [1, 2, 3];
        let b = [4, 5, 6, 7];
        let d = diff(&a, &b, &DiffOptions::default()).unwrap();
        assert_eq!(d.ratio, 0.0);
        let chunks = d.chunks.unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].eq);
    }

    #[test]
    fn test_min_ratio_strict_fallback() {
        let a = [1, 2, 3, 4, 5, 6, 7, 8];
        let b = [1, 9, 9, 9, 9, 9, 9, 8];
        let lax = diff(&a, &b, &DiffOptions::default()).unwrap();
        assert!(lax.ratio > 0.0);

        let opts = DiffOptions {
            min_ratio: 0.9,
            ..DiffOptions::default()
        };
        let strict = diff(&a, &b, &opts).unwrap();
        assert_eq!(strict.ratio, 0.0);
        let chunks = strict.chunks.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].a, 0..8);
        assert_eq!(chunks[0].b, 0..8);
        assert!(!chunks[0].eq);
    }

    #[test]
    fn test_budget_monotonicity() {
        let a = [5, 1, 2, 9, 8, 3, 3, 0];
        let b = [1, 2, 8, 8, 0, 4];
        let mut previous = 0.0;
        for max_cost in 0..=14 {
            let opts = DiffOptions {
                max_cost,
                ..DiffOptions::default()
            };
            let ratio = similarity_ratio(&a, &b, &opts);
            assert!(ratio >= previous, "ratio dropped at max_cost={max_cost}");
            previous = ratio;
        }
    }

    #[test]
    fn test_similarity_ratio_matches_full_diff() {
        let a = ["x", "y", "z", "w"];
        let b = ["x", "z", "w", "q"];
        let opts = DiffOptions::default();
        let full = diff(&a, &b, &opts).unwrap();
        assert_eq!(similarity_ratio(&a, &b, &opts), full.ratio);
    }

    #[test]
    fn test_diff_with_custom_scorer() {
        // score by parity so 1 aligns with 3, 2 with 4
        let a = [1, 2];
        let b = [3, 4];
        let scorer = |i: usize, j: usize| ((a[i] % 2) == (b[j] % 2)) as u8 as f64;
        let d = diff_with(a.len(), b.len(), &scorer, &DiffOptions::default()).unwrap();
        assert_eq!(d.ratio, 1.0);
    }

    #[test]
    fn test_require_kernel_rejects_object_path() {
        let opts = DiffOptions {
            require_kernel: true,
            ..DiffOptions::default()
        };
        let err = diff(&[1, 2], &[1, 2], &opts).unwrap_err();
        assert!(matches!(err, DiffError::Protocol { .. }));
    }

    #[test]
    fn test_diff_views_text() {
        let d = diff_views(
            &SeqView::from("kitten"),
            &SeqView::from("sitting"),
            &DiffOptions::default(),
        )
        .unwrap();
        // 2 substitutions (4 edits) + 1 insertion over 6 + 7 code points
        assert_eq!(d.ratio, 8.0 / 13.0);
    }

    #[test]
    fn test_canonize_reorders_mixed_runs() {
        let mut codes = vec![2, 1, 3, 0, 1, 2, 1];
        canonize(&mut codes);
        assert_eq!(codes, vec![1, 2, 3, 0, 1, 1, 2]);
    }

    #[test]
    fn test_nested_lines_with_fuzzy_alignment() {
        let a = ["the quick brown fox", "jumps over", "the lazy dog"];
        let b = ["the quick brown cat", "jumps over", "the lazy dog"];
        let opts = DiffOptions {
            accept: 0.6,
            ..DiffOptions::default()
        };
        let d = diff_nested(&a, &b, &opts).unwrap();
        let chunks = d.chunks.as_ref().unwrap();
        // first line pair aligns fuzzily and carries a char-level tree
        assert_eq!(chunks.len(), 2);
        assert!(!chunks[0].eq);
        let nested = chunks[0].nested.as_ref().unwrap();
        assert!(nested.ratio > 0.6);
        let inner = nested.chunks.as_ref().unwrap();
        // "the quick brown " matches, "fox"/"cat" does not
        assert!(inner[0].eq);
        assert_eq!(inner[0].a, 0..16);
        assert!(chunks[1].eq);
        assert_eq!(chunks[1].a, 1..3);
    }

    #[test]
    fn test_nested_exact_lines_stay_merged() {
        let a = ["one", "two", "three"];
        let b = ["one", "two", "three"];
        let opts = DiffOptions {
            accept: 0.6,
            ..DiffOptions::default()
        };
        let d = diff_nested(&a, &b, &opts).unwrap();
        assert_eq!(d.ratio, 1.0);
        let chunks = d.chunks.unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].eq);
        assert!(chunks[0].nested.is_none());
    }

    #[test]
    fn test_nested_vectors() {
        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![1, 2, 9], vec![4, 5, 6]];
        let opts = DiffOptions {
            accept: 0.5,
            ..DiffOptions::default()
        };
        let d = diff_nested(&a, &b, &opts).unwrap();
        let chunks = d.chunks.as_ref().unwrap();
        assert!(!chunks[0].eq);
        let pair = chunks[0].nested.as_ref().unwrap();
        assert!((pair.ratio - 4.0 / 6.0).abs() < 1e-12);
        assert!(chunks[1].eq);
    }

    #[test]
    fn test_nested_strict_alignment_by_default() {
        // with accept = 1.0 similar lines do not align
        let a = ["hello world"];
        let b = ["hello worlds"];
        let d = diff_nested(&a, &b, &DiffOptions::default()).unwrap();
        assert_eq!(d.ratio, 0.0);
    }

    #[test]
    fn test_nested_max_depth_flattens() {
        let a = ["abc", "def"];
        let b = ["abx", "def"];
        let opts = DiffOptions {
            accept: 0.5,
            max_depth: 1,
            ..DiffOptions::default()
        };
        let d = diff_nested(&a, &b, &opts).unwrap();
        let chunks = d.chunks.unwrap();
        // depth exhausted: plain equality, no per-line tree
        assert!(chunks.iter().all(|c| c.nested.is_none()));
    }

    #[test]
    fn test_nested_unicode_lines() {
        let a = ["héllo wörld"];
        let b = ["héllo wörlds"];
        let opts = DiffOptions {
            accept: 0.5,
            ..DiffOptions::default()
        };
        let d = diff_nested(&a, &b, &opts).unwrap();
        let chunks = d.chunks.unwrap();
        let nested = chunks[0].nested.as_ref().unwrap();
        let inner = nested.chunks.as_ref().unwrap();
        // ranges are code-point indices: 11 matched points, 1 insertion
        assert_eq!(inner[0].a, 0..11);
        assert_eq!(inner[1].b, 11..12);
    }
}
