//! Diff output model: chunks, diff trees and signatures.
//!
//! A diff is an ordered list of [`Chunk`]s partitioning both input
//! sequences exhaustively and in index order. Chunks carry half-open index
//! ranges rather than copies of the data, so the tree itself is cheap and
//! the caller slices its own sequences through [`Chunk::data_a`] /
//! [`Chunk::data_b`] (or the [`SliceDiff`] wrapper) without any element
//! being moved.

use std::ops::Range;

/// A maximal run of one kind in an edit script.
///
/// `eq == true` means the two ranges are aligned and element-wise equal.
/// `eq == false` with `nested == None` is an opaque mismatch (one or both
/// ranges may be empty: pure deletions/insertions). `eq == false` with a
/// `nested` node means the two sides aligned under the similarity
/// threshold but differ in content; the node describes how.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Covered range in the first sequence.
    pub a: Range<usize>,
    /// Covered range in the second sequence.
    pub b: Range<usize>,
    /// Whether the two ranges are element-wise equal.
    pub eq: bool,
    /// Content-level diff for aligned-but-unequal ranges.
    pub nested: Option<Diff>,
}

impl Chunk {
    pub(crate) fn new(a: Range<usize>, b: Range<usize>, eq: bool) -> Self {
        Chunk {
            a,
            b,
            eq,
            nested: None,
        }
    }

    /// Number of covered elements in the first sequence.
    pub fn len_a(&self) -> usize {
        self.a.end - self.a.start
    }

    /// Number of covered elements in the second sequence.
    pub fn len_b(&self) -> usize {
        self.b.end - self.b.start
    }

    /// Materialize the covered sub-sequence of `a`.
    ///
    /// `a` must be the same sequence the diff was computed from.
    pub fn data_a<'a, T>(&self, a: &'a [T]) -> &'a [T] {
        &a[self.a.clone()]
    }

    /// Materialize the covered sub-sequence of `b`.
    pub fn data_b<'a, T>(&self, b: &'a [T]) -> &'a [T] {
        &b[self.b.clone()]
    }

    /// The shape of this chunk. A single aligned-but-unequal pair counts
    /// as aligned — its sides pair up positionally — while a re-examined
    /// multi-element mismatch run stays a mismatch shape-wise.
    pub fn signature(&self) -> ChunkSignature {
        let pairwise = self.nested.is_some() && self.len_a() == 1 && self.len_b() == 1;
        ChunkSignature {
            size_a: self.len_a(),
            size_b: self.len_b(),
            eq: self.eq || pairwise,
        }
    }
}

/// A diff tree node: the similarity ratio for the covered pair of
/// (sub-)sequences plus the chunks partitioning them.
///
/// `chunks` is `None` when only the ratio was requested (the fast
/// ratio-only mode). The tree exclusively owns its chunks and nested
/// nodes; nothing is shared or mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Diff {
    /// Normalized similarity in `[0, 1]`: `1 - cost / (n + m)`.
    pub ratio: f64,
    /// Ordered chunks, present unless ratio-only mode was used.
    pub chunks: Option<Vec<Chunk>>,
}

impl Diff {
    pub(crate) fn ratio_only(ratio: f64) -> Self {
        Diff {
            ratio,
            chunks: None,
        }
    }

    /// The run-length shape of this diff, or `None` in ratio-only mode.
    pub fn signature(&self) -> Option<Signature> {
        self.chunks.as_ref().map(|chunks| Signature {
            parts: chunks.iter().map(Chunk::signature).collect(),
        })
    }

    /// True when every chunk is an exact match.
    pub fn is_eq(&self) -> bool {
        match &self.chunks {
            Some(chunks) => chunks.iter().all(|c| c.eq),
            None => self.ratio >= 1.0,
        }
    }

    /// Merge equal runs of `consume_size` elements or fewer into their
    /// mismatching neighborhood, producing a coarser diff.
    ///
    /// Useful when many short matches between large edits are noise.
    /// Chunks carrying nested nodes are kept as-is and act as merge
    /// boundaries.
    pub fn get_coarse(&self, consume_size: usize) -> Diff {
        let chunks = self
            .chunks
            .as_ref()
            .map(|chunks| coarse_chunks(chunks, consume_size));
        Diff {
            ratio: self.ratio,
            chunks,
        }
    }
}

/// The shape of one chunk: side lengths and alignment status, with the
/// data abstracted away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSignature {
    pub size_a: usize,
    pub size_b: usize,
    pub eq: bool,
}

impl ChunkSignature {
    /// An aligned run of `n` element pairs.
    pub fn aligned(n: usize) -> Self {
        ChunkSignature {
            size_a: n,
            size_b: n,
            eq: true,
        }
    }

    /// A mismatch of `n` elements against `m` elements.
    pub fn delta(n: usize, m: usize) -> Self {
        ChunkSignature {
            size_a: n,
            size_b: m,
            eq: false,
        }
    }

    /// The footprint of this chunk once both sides are laid out in a
    /// common frame: aligned pairs overlap, mismatched sides do not.
    pub fn len(&self) -> usize {
        if self.eq {
            self.size_a
        } else {
            self.size_a + self.size_b
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The shape of a whole diff: an ordered run of chunk signatures.
///
/// The 2D aligner uses signatures to carry row/column alignment between
/// stages without touching the data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub parts: Vec<ChunkSignature>,
}

impl Signature {
    /// A signature aligning `n` element pairs with no differences.
    pub fn aligned(n: usize) -> Self {
        if n == 0 {
            return Signature { parts: Vec::new() };
        }
        Signature {
            parts: vec![ChunkSignature::aligned(n)],
        }
    }

    /// Total footprint in the common (inflated) frame.
    pub fn len(&self) -> usize {
        self.parts.iter().map(ChunkSignature::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the first-side lengths: the original size of `a`.
    pub fn size_a(&self) -> usize {
        self.parts.iter().map(|p| p.size_a).sum()
    }

    /// Sum of the second-side lengths: the original size of `b`.
    pub fn size_b(&self) -> usize {
        self.parts.iter().map(|p| p.size_b).sum()
    }
}

/// Merge consecutive chunks with the same `eq` flag into one.
///
/// Chunks with nested nodes are emitted unmerged.
pub(crate) fn compress_chunks(chunks: &[Chunk]) -> Vec<Chunk> {
    let mut out: Vec<Chunk> = Vec::new();
    for chunk in chunks {
        match out.last_mut() {
            Some(last)
                if last.nested.is_none() && chunk.nested.is_none() && last.eq == chunk.eq =>
            {
                last.a.end = chunk.a.end;
                last.b.end = chunk.b.end;
            }
            _ => out.push(chunk.clone()),
        }
    }
    out
}

fn coarse_chunks(chunks: &[Chunk], consume_size: usize) -> Vec<Chunk> {
    let mut out: Vec<Chunk> = Vec::new();
    // pending run of chunks to be folded into one mismatch
    let mut buffer: Option<Chunk> = None;

    let flush = |buffer: &mut Option<Chunk>, out: &mut Vec<Chunk>| {
        if let Some(merged) = buffer.take() {
            out.push(merged);
        }
    };

    for chunk in compress_chunks(chunks) {
        let keep = (chunk.eq && chunk.len_a() > consume_size) || chunk.nested.is_some();
        if keep {
            flush(&mut buffer, &mut out);
            out.push(chunk);
        } else {
            match &mut buffer {
                Some(merged) => {
                    merged.a.end = chunk.a.end;
                    merged.b.end = chunk.b.end;
                    merged.eq = merged.eq && chunk.eq;
                }
                None => buffer = Some(chunk),
            }
        }
    }
    flush(&mut buffer, &mut out);
    out
}

/// A diff bound to the two slices it was computed from, for ergonomic
/// chunk-data access.
#[derive(Debug, Clone)]
pub struct SliceDiff<'a, T> {
    pub diff: Diff,
    pub a: &'a [T],
    pub b: &'a [T],
}

impl<'a, T> SliceDiff<'a, T> {
    pub fn new(diff: Diff, a: &'a [T], b: &'a [T]) -> Self {
        SliceDiff { diff, a, b }
    }

    pub fn ratio(&self) -> f64 {
        self.diff.ratio
    }

    /// Iterate chunks together with their materialized sides.
    pub fn iter<'s>(&'s self) -> impl Iterator<Item = (&'s Chunk, &'a [T], &'a [T])> + 's {
        let a = self.a;
        let b = self.b;
        self.diff
            .chunks
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(move |c| (c, c.data_a(a), c.data_b(b)))
    }

    /// Reassemble the first sequence from the chunk ranges.
    pub fn get_a(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().flat_map(|(_, da, _)| da.iter().cloned()).collect()
    }

    /// Reassemble the second sequence from the chunk ranges.
    pub fn get_b(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().flat_map(|(_, _, db)| db.iter().cloned()).collect()
    }
}
