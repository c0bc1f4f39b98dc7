//! 2D alignment: aligning rows and columns of two matrices at once.
//!
//! The aligner reduces a matrix pair to two signature computations — rows
//! first, then a "common" column alignment voted by every aligned row
//! pair — and inflates both matrices with a fill value until aligned
//! regions occupy identical coordinates. The result carries the inflated
//! pair, a cell-level agreement mask and both signatures; removing the
//! fill-inserted rows/columns recovers each original matrix exactly.
//!
//! Row access is a stride view over the caller's row-major buffer; no
//! element is copied until the inflated outputs are materialized.

use crate::chunk::{ChunkSignature, Signature};
use crate::error::DiffError;
use crate::myers::DiffWorkspace;
use crate::score::RowEq;
use crate::sequence::{diff_impl, nested_seq_diff, DiffOptions, Nested};

/// Similarity floor used by the 2D aligner when the caller does not set
/// one. Just below three quarters, so that a row keeping 3 of 4 cells
/// still aligns.
pub const DEFAULT_MIN_RATIO: f64 = 0.749;

/// A borrowed, row-major matrix view with explicit shape.
#[derive(Debug)]
pub struct MatrixRef<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<T> Clone for MatrixRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MatrixRef<'_, T> {}

impl<'a, T> MatrixRef<'a, T> {
    /// Wrap a row-major buffer; its length must equal `rows * cols`.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Result<Self, DiffError> {
        if data.len() != rows * cols {
            return Err(DiffError::shape(format!(
                "buffer of {} elements cannot view as {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(MatrixRef { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, r: usize) -> &'a [T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn get(&self, r: usize, c: usize) -> &T {
        &self.data[r * self.cols + c]
    }

    pub fn to_owned(&self) -> Matrix<T>
    where
        T: Clone,
    {
        Matrix {
            data: self.data.to_vec(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// An owned row-major matrix, used for the inflated outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Matrix<T> {
    /// A matrix with every cell set to `value`.
    pub fn full(rows: usize, cols: usize, value: T) -> Self
    where
        T: Clone,
    {
        Matrix {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [T] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn get(&self, r: usize, c: usize) -> &T {
        &self.data[r * self.cols + c]
    }

    pub fn as_ref(&self) -> MatrixRef<'_, T> {
        MatrixRef {
            data: &self.data,
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> std::ops::Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (r, c): (usize, usize)) -> &T {
        &self.data[r * self.cols + c]
    }
}

/// Options for [`diff_aligned_2d`].
///
/// `min_ratio` is the floor for accepting a partial row match; `max_cost`
/// budgets the row-level search and `max_cost_row` the per-row column
/// searches. `col_sig` short-circuits column alignment when the caller
/// already knows it (e.g. from table headers), and `weights` scores rows
/// by a per-column weight vector instead of plain cell equality.
#[derive(Debug, Clone)]
pub struct MatrixDiffOptions {
    pub min_ratio: f64,
    pub max_cost: usize,
    pub max_cost_row: usize,
    pub max_calls: usize,
    pub col_sig: Option<Signature>,
    pub weights: Option<Vec<f64>>,
}

impl Default for MatrixDiffOptions {
    fn default() -> Self {
        MatrixDiffOptions {
            min_ratio: DEFAULT_MIN_RATIO,
            max_cost: usize::MAX,
            max_cost_row: usize::MAX,
            max_calls: usize::MAX,
            col_sig: None,
            weights: None,
        }
    }
}

/// An aligned matrix diff: the two inflated matrices, the cell agreement
/// mask and the row/column signatures that produced them.
#[derive(Debug, Clone)]
pub struct MatrixDiff<T> {
    /// First matrix, inflated to the common shape.
    pub a: Matrix<T>,
    /// Second matrix, inflated to the common shape.
    pub b: Matrix<T>,
    /// Cell-level agreement; false wherever either side was fill-inserted.
    pub eq: Matrix<bool>,
    pub row_sig: Signature,
    pub col_sig: Signature,
}

impl<T> MatrixDiff<T> {
    /// Fraction of aligned rows in the total row count.
    pub fn ratio(&self) -> f64 {
        let mut eq = 0usize;
        let mut total = 0usize;
        for part in &self.row_sig.parts {
            let n = part.size_a + part.size_b;
            total += n;
            if part.eq {
                eq += n;
            }
        }
        if total == 0 {
            return 1.0;
        }
        eq as f64 / total as f64
    }

    /// Fraction of agreeing cells in the inflated matrices.
    pub fn aligned_ratio(&self) -> f64 {
        let cells = self.eq.rows() * self.eq.cols();
        if cells == 0 {
            return 1.0;
        }
        let hits = self.eq.data.iter().filter(|&&v| v).count();
        hits as f64 / cells as f64
    }

    /// Original shape of the first matrix.
    pub fn a_shape(&self) -> (usize, usize) {
        (self.row_sig.size_a(), self.col_sig.size_a())
    }

    /// Original shape of the second matrix.
    pub fn b_shape(&self) -> (usize, usize) {
        (self.row_sig.size_b(), self.col_sig.size_b())
    }
}

/// Pad both matrices along `dim` (0 = rows, 1 = columns) with `fill`
/// until the signature's chunks occupy a common frame. Within a mismatch
/// chunk the first matrix's rows/columns come first.
pub fn align_inflate<T: Clone>(
    a: MatrixRef<'_, T>,
    b: MatrixRef<'_, T>,
    fill: &T,
    sig: &Signature,
    dim: usize,
) -> Result<(Matrix<T>, Matrix<T>), DiffError> {
    assert!(dim < 2, "dim must be 0 (rows) or 1 (columns)");
    let (size_a, size_b) = if dim == 0 {
        (a.rows, b.rows)
    } else {
        (a.cols, b.cols)
    };
    if sig.size_a() != size_a || sig.size_b() != size_b {
        return Err(DiffError::shape(format!(
            "signature covers {}x{} but inputs have {} and {} along dim {}",
            sig.size_a(),
            sig.size_b(),
            size_a,
            size_b,
            dim
        )));
    }

    let s = sig.len();
    let (mut out_a, mut out_b) = if dim == 0 {
        (
            Matrix::full(s, a.cols, fill.clone()),
            Matrix::full(s, b.cols, fill.clone()),
        )
    } else {
        (
            Matrix::full(a.rows, s, fill.clone()),
            Matrix::full(b.rows, s, fill.clone()),
        )
    };

    let copy_span = |src: MatrixRef<'_, T>, dst: &mut Matrix<T>, from: usize, to: usize, count: usize| {
        if dim == 0 {
            for k in 0..count {
                dst.row_mut(to + k).clone_from_slice(src.row(from + k));
            }
        } else {
            for r in 0..src.rows {
                let dst_row = dst.row_mut(r);
                let src_row = src.row(r);
                for k in 0..count {
                    dst_row[to + k] = src_row[from + k].clone();
                }
            }
        }
    };

    let mut offset_a = 0;
    let mut offset_b = 0;
    let mut offset = 0;
    for part in &sig.parts {
        copy_span(a, &mut out_a, offset_a, offset, part.size_a);
        offset_a += part.size_a;
        if !part.eq {
            offset += part.size_a;
        }
        copy_span(b, &mut out_b, offset_b, offset, part.size_b);
        offset_b += part.size_b;
        offset += part.size_b;
    }
    Ok((out_a, out_b))
}

/// Vote a single column alignment shared by all aligned row pairs.
///
/// Each in-row signature casts one vote per aligned column pair; a
/// max-plus dynamic program then picks the column pairing with the most
/// votes and the traceback folds it into a signature.
pub fn common_diff_sig(n: usize, m: usize, diffs: &[Signature]) -> Signature {
    if n == 0 && m == 0 {
        return Signature { parts: Vec::new() };
    }
    if n == 0 || m == 0 {
        return Signature {
            parts: vec![ChunkSignature::delta(n, m)],
        };
    }

    let mut space = Matrix::full(n, m, 0i64);
    for sig in diffs {
        let mut x = 0usize;
        let mut y = 0usize;
        for part in &sig.parts {
            if part.eq {
                for k in 0..part.size_a {
                    space.data[(x + k) * m + (y + k)] += 1;
                }
            }
            x += part.size_a;
            y += part.size_b;
        }
    }

    for y in 0..m {
        if y == 0 {
            for x in 1..n {
                let prev = space[(x - 1, 0)];
                if prev > space[(x, 0)] {
                    space.data[x * m] = prev;
                }
            }
        } else {
            space.data[y] = space[(0, y)].max(space[(0, y - 1)]);
            for x in 1..n {
                let best = space[(x - 1, y)]
                    .max(space[(x, y - 1)])
                    .max(space[(x - 1, y - 1)] + space[(x, y)]);
                space.data[x * m + y] = best;
            }
        }
    }

    let mut x = n as i64 - 1;
    let mut y = m as i64 - 1;
    let mut is_b = vec![false; n + m];
    let mut is_eq = vec![false; n + m + 2];
    let mut pos = (n + m) as i64;
    while x >= 0 && y >= 0 {
        let (xu, yu) = (x as usize, y as usize);
        if x > 0 && space[(xu, yu)] == space[(xu - 1, yu)] {
            x -= 1;
            pos -= 1;
        } else if y > 0 && space[(xu, yu)] == space[(xu, yu - 1)] {
            y -= 1;
            pos -= 1;
            is_b[pos as usize] = true;
        } else {
            is_eq[pos as usize] = true;
            is_eq[pos as usize - 1] = true;
            x -= 1;
            y -= 1;
            pos -= 2;
            is_b[pos as usize + 1] = true;
        }
    }
    x += 1;
    y += 1;
    for k in x..x + y {
        is_b[k as usize] = true;
    }
    is_eq[0] = !is_eq[1];
    is_eq[n + m + 1] = !is_eq[n + m];

    let boundaries: Vec<usize> = (0..n + m + 1)
        .filter(|&k| is_eq[k] != is_eq[k + 1])
        .collect();
    let parts = boundaries
        .windows(2)
        .map(|w| {
            let (fr, to) = (w[0], w[1]);
            let size_b = is_b[fr..to].iter().filter(|&&v| v).count();
            ChunkSignature {
                size_a: to - fr - size_b,
                size_b,
                eq: is_eq[fr + 1],
            }
        })
        .collect();
    Signature { parts }
}

/// Align rows of two matrices and derive the common column alignment
/// from the row pairs that matched.
pub fn get_row_col_diff<T: Nested>(
    a: MatrixRef<'_, T>,
    b: MatrixRef<'_, T>,
    opts: &MatrixDiffOptions,
) -> Result<(Signature, Signature), DiffError> {
    let a_rows: Vec<&[T]> = (0..a.rows).map(|r| a.row(r)).collect();
    let b_rows: Vec<&[T]> = (0..b.rows).map(|r| b.row(r)).collect();

    let dopts = DiffOptions {
        accept: opts.min_ratio,
        min_ratio: opts.min_ratio,
        max_cost: opts.max_cost,
        max_cost_row: opts.max_cost_row,
        max_calls: opts.max_calls,
        max_depth: 2,
        require_kernel: false,
    };
    let mut ws = DiffWorkspace::new();
    let row_diff = nested_seq_diff(&a_rows, &b_rows, &dopts, 0, &mut ws);
    let row_sig = row_diff
        .signature()
        .expect("script mode always yields chunks");
    log::debug!(
        "row alignment: {} rows vs {} rows, ratio {:.4}",
        a.rows,
        b.rows,
        row_diff.ratio
    );

    let mut in_row_sigs = Vec::new();
    for chunk in row_diff.chunks.unwrap() {
        if chunk.eq {
            for _ in 0..chunk.len_a() {
                in_row_sigs.push(Signature::aligned(a.cols));
            }
        } else if chunk.len_a() == 1 && chunk.len_b() == 1 {
            if let Some(nested) = chunk.nested {
                in_row_sigs.push(
                    nested
                        .signature()
                        .expect("nested nodes carry chunks"),
                );
            }
        }
    }
    let col_sig = common_diff_sig(a.cols, b.cols, &in_row_sigs);
    Ok((row_sig, col_sig))
}

/// Compute an aligned diff between two matrices.
///
/// Generic path: rows align through nested per-row comparisons (column
/// counts may differ), columns through the voted common alignment. With
/// `opts.col_sig` the column alignment is taken as given and a single
/// weighted row-level search replaces the per-row work; with
/// `opts.weights` rows score through the weight vector directly, which
/// requires equal column counts.
///
/// An empty matrix (0 rows) yields a counterpart of the other matrix's
/// shape, all fill, with an all-false mask.
pub fn diff_aligned_2d<T: Nested + Clone>(
    a: MatrixRef<'_, T>,
    b: MatrixRef<'_, T>,
    fill: T,
    opts: &MatrixDiffOptions,
) -> Result<MatrixDiff<T>, DiffError> {
    if a.rows == 0 || b.rows == 0 {
        return Ok(empty_side_diff(a, b, fill));
    }

    let (a2, b2, row_sig, col_sig) = if let Some(col_sig) = &opts.col_sig {
        aligned_2d_with_col_sig(a, b, &fill, col_sig, opts)?
    } else if let Some(weights) = &opts.weights {
        aligned_2d_weighted(a, b, &fill, weights, opts)?
    } else {
        let (row_sig, col_sig) = get_row_col_diff(a, b, opts)?;
        let (a1, b1) = align_inflate(a, b, &fill, &row_sig, 0)?;
        let (a2, b2) = align_inflate(a1.as_ref(), b1.as_ref(), &fill, &col_sig, 1)?;
        (a2, b2, row_sig, col_sig)
    };

    let eq = agreement_mask(&a2, &b2, &row_sig, &col_sig);
    Ok(MatrixDiff {
        a: a2,
        b: b2,
        eq,
        row_sig,
        col_sig,
    })
}

type Inflated<T> = (Matrix<T>, Matrix<T>, Signature, Signature);

/// Fast path: the column alignment is known, so a single row-level search
/// over column-masked rows replaces the per-row nested comparisons.
fn aligned_2d_with_col_sig<T: Nested + Clone>(
    a: MatrixRef<'_, T>,
    b: MatrixRef<'_, T>,
    fill: &T,
    col_sig: &Signature,
    opts: &MatrixDiffOptions,
) -> Result<Inflated<T>, DiffError> {
    let (a1, b1) = align_inflate(a, b, fill, col_sig, 1)?;

    // aligned columns carry double weight: a cell disagreement there is
    // as costly as a column that has no counterpart at all
    let mut mask = Vec::with_capacity(col_sig.len());
    for part in &col_sig.parts {
        let w = if part.eq { 2.0 } else { 1.0 };
        mask.extend(std::iter::repeat(w).take(part.len()));
    }
    let weighted_total: f64 = mask.iter().sum();
    let accept_row = opts
        .min_ratio
        .max((weighted_total - opts.max_cost_row as f64) / weighted_total);
    let scale = mask.len() as f64 / weighted_total;
    for w in &mut mask {
        *w *= scale;
    }
    log::debug!(
        "column-signature fast path: {} masked columns, row accept {:.4}",
        mask.len(),
        accept_row
    );

    let rows = RowEq::new(a1.as_ref(), b1.as_ref(), Some(mask))?;
    let mut ws = DiffWorkspace::new();
    let raw = diff_impl(
        a1.rows(),
        b1.rows(),
        &rows,
        accept_row,
        opts.min_ratio,
        opts.max_cost,
        opts.max_calls,
        true,
        &mut ws,
    );
    let row_sig = raw.signature().expect("script mode always yields chunks");

    let (a2, b2) = align_inflate(a1.as_ref(), b1.as_ref(), fill, &row_sig, 0)?;
    Ok((a2, b2, row_sig, col_sig.clone()))
}

/// Weighted row comparison with columns assumed aligned positionally.
fn aligned_2d_weighted<T: Nested + Clone>(
    a: MatrixRef<'_, T>,
    b: MatrixRef<'_, T>,
    fill: &T,
    weights: &[f64],
    opts: &MatrixDiffOptions,
) -> Result<Inflated<T>, DiffError> {
    let rows = RowEq::new(a, b, Some(weights.to_vec()))?;
    let mut ws = DiffWorkspace::new();
    let raw = diff_impl(
        a.rows,
        b.rows,
        &rows,
        opts.min_ratio,
        opts.min_ratio,
        opts.max_cost,
        opts.max_calls,
        true,
        &mut ws,
    );
    let row_sig = raw.signature().expect("script mode always yields chunks");
    let col_sig = Signature::aligned(a.cols);

    let (a2, b2) = align_inflate(a, b, fill, &row_sig, 0)?;
    Ok((a2, b2, row_sig, col_sig))
}

/// One side has no rows: the counterpart takes the other side's shape.
fn empty_side_diff<T: Nested + Clone>(
    a: MatrixRef<'_, T>,
    b: MatrixRef<'_, T>,
    fill: T,
) -> MatrixDiff<T> {
    if a.rows == 0 && b.rows == 0 {
        let cols = a.cols.max(b.cols);
        let col_sig = if a.cols == b.cols {
            Signature::aligned(a.cols)
        } else {
            Signature {
                parts: vec![ChunkSignature::delta(a.cols, b.cols)],
            }
        };
        return MatrixDiff {
            a: Matrix::full(0, cols, fill.clone()),
            b: Matrix::full(0, cols, fill),
            eq: Matrix::full(0, cols, false),
            row_sig: Signature::aligned(0),
            col_sig,
        };
    }
    if a.rows == 0 {
        MatrixDiff {
            a: Matrix::full(b.rows, b.cols, fill),
            b: b.to_owned(),
            eq: Matrix::full(b.rows, b.cols, false),
            row_sig: Signature {
                parts: vec![ChunkSignature::delta(0, b.rows)],
            },
            col_sig: Signature::aligned(b.cols),
        }
    } else {
        MatrixDiff {
            a: a.to_owned(),
            b: Matrix::full(a.rows, a.cols, fill),
            eq: Matrix::full(a.rows, a.cols, false),
            row_sig: Signature {
                parts: vec![ChunkSignature::delta(a.rows, 0)],
            },
            col_sig: Signature::aligned(a.cols),
        }
    }
}

/// Cell agreement between the inflated matrices, with every span covered
/// by a non-aligned signature part forced to false: a fill-inserted row
/// or column can never agree.
fn agreement_mask<T: PartialEq>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    row_sig: &Signature,
    col_sig: &Signature,
) -> Matrix<bool> {
    let rows = a.rows();
    let cols = a.cols();
    let mut eq = Matrix::full(rows, cols, false);
    for r in 0..rows {
        let (ra, rb) = (a.row(r), b.row(r));
        let re = eq.row_mut(r);
        for c in 0..cols {
            re[c] = ra[c] == rb[c];
        }
    }

    let mut offset = 0;
    for part in &row_sig.parts {
        if part.eq {
            offset += part.size_a;
        } else {
            for r in offset..offset + part.len() {
                eq.row_mut(r).fill(false);
            }
            offset += part.len();
        }
    }
    let mut offset = 0;
    for part in &col_sig.parts {
        if part.eq {
            offset += part.size_a;
        } else {
            for r in 0..rows {
                eq.row_mut(r)[offset..offset + part.len()].fill(false);
            }
            offset += part.len();
        }
    }
    eq
}
