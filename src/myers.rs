//! Linear-space Myers edit-graph search, generalized to fuzzy similarity.
//!
//! The diff problem is a shortest-path search on the `n x m` edit graph:
//! horizontal edges delete an element of the first sequence, vertical edges
//! insert an element of the second, and a diagonal edge `(x, y) -> (x+1,
//! y+1)` exists iff `score(x, y) >= accept`. Diagonals are free; the cost
//! of a path is the number of horizontal/vertical edges it takes, and the
//! cheapest path from `(0, 0)` to `(n, m)` is the edit script.
//!
//! A breadth-first search needs `O(n * m)` memory to recover the path.
//! Instead, the search tracks only the furthest progress reached on each
//! anti-diagonal — the "front" — which costs `O(min(n, m))`. Two fronts
//! run simultaneously, one from `(0, 0)` and one from `(n, m)`, advancing
//! in alternating rounds of one extra edit each. The round where they
//! cross fixes the minimal cost, and the crossing point splits the problem
//! into two independent halves that are solved recursively, which recovers
//! the full script in linear memory.
//!
//! Budgets make the search give up gracefully: `max_cost` bounds the
//! number of rounds and `max_calls` the number of scorer invocations
//! across the entire recursion. On exhaustion the unresolved remainder is
//! reported as a pure delete+insert block — a normal outcome, not an
//! error.

/// Edit code: element present only in the first sequence (horizontal move).
pub(crate) const CODE_DEL: u8 = 1;
/// Edit code: element present only in the second sequence (vertical move).
pub(crate) const CODE_INS: u8 = 2;
/// Edit code: aligned pair (diagonal move); occupies two slots, the second
/// holding zero.
pub(crate) const CODE_DIAG: u8 = 3;

/// Similarity scoring between positions of two sequences.
///
/// `score(i, j)` returns a value in `[0, 1]`; `1` means "treat as
/// identical". Implementations must be side-effect-free: the engine calls
/// them repeatedly and out of order, and a score must not depend on call
/// history.
pub trait Score {
    fn score(&self, i: usize, j: usize) -> f64;
}

/// Adapter scoring through a plain closure `(i, j) -> similarity`.
pub struct FnScore<F>(pub F);

impl<F> Score for FnScore<F>
where
    F: Fn(usize, usize) -> f64,
{
    #[inline]
    fn score(&self, i: usize, j: usize) -> f64 {
        (self.0)(i, j)
    }
}

/// Search tunables, fixed for one engine call.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Minimal score for two elements to count as aligned.
    pub accept: f64,
    /// Maximal allowed edit cost; the search gives up beyond it.
    pub max_cost: usize,
    /// Maximal scorer invocations across the whole recursion.
    pub max_calls: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            accept: 1.0,
            max_cost: usize::MAX,
            max_calls: usize::MAX,
        }
    }
}

/// Scratch buffers for one top-level search call.
///
/// The two front arrays are allocated once here and shared by every
/// recursive sub-call: a sub-call starts only after its parent has
/// finished searching, so it can re-initialize the prefix it needs
/// without stepping on live state. Buffers only ever grow; reusing a
/// workspace across many diffs amortizes the allocations away.
#[derive(Debug, Default)]
pub struct DiffWorkspace {
    forward: Vec<i64>,
    reverse: Vec<i64>,
    calls: usize,
}

impl DiffWorkspace {
    pub fn new() -> Self {
        DiffWorkspace::default()
    }

    /// Total scorer invocations made by the most recent search.
    pub fn calls(&self) -> usize {
        self.calls
    }

    fn reset_fronts(&mut self, nm: usize, n_m: i64) {
        if self.forward.len() < nm {
            self.forward.resize(nm, 0);
            self.reverse.resize(nm, 0);
        }
        self.forward[..nm].fill(0);
        // the reverse front starts at full progress
        self.reverse[..nm].fill(n_m);
    }

    #[inline]
    fn front(&self, reverse: bool) -> &[i64] {
        if reverse {
            &self.reverse
        } else {
            &self.forward
        }
    }

    #[inline]
    fn front_mut(&mut self, reverse: bool) -> &mut [i64] {
        if reverse {
            &mut self.reverse
        } else {
            &mut self.forward
        }
    }
}

/// Search the edit graph for the cheapest script turning `n` elements into
/// `m` elements under `scorer`.
///
/// When `out` is given it must be a buffer of length `n + m`; the engine
/// fills it with edit codes ([`CODE_DEL`]/[`CODE_INS`]/[`CODE_DIAG`]).
/// When `out` is `None` the search stops at the first front crossing and
/// returns the minimal cost alone, skipping script recovery entirely —
/// this is the fast ratio-only mode.
///
/// Returns the edit cost of the region it resolved; if a budget ran out,
/// the unresolved remainder is encoded as delete+insert and its full
/// length is counted into the cost.
pub fn search_graph<S: Score>(
    n: usize,
    m: usize,
    scorer: &S,
    params: &SearchParams,
    out: Option<&mut [u8]>,
    ws: &mut DiffWorkspace,
) -> usize {
    if let Some(buf) = &out {
        assert_eq!(buf.len(), n + m, "out buffer must hold n + m codes");
    }
    ws.calls = 0;
    let max_cost = params.max_cost.min(n + m) as i64;
    search_recursive(
        n as i64,
        m as i64,
        scorer,
        params.accept,
        max_cost,
        params.max_calls,
        out,
        ws,
        0,
        0,
    ) as usize
}

/// One divide-and-conquer step on the sub-problem of size `n x m` rooted
/// at offsets `(i, j)`.
#[allow(clippy::too_many_arguments)]
fn search_recursive<S: Score>(
    mut n: i64,
    mut m: i64,
    scorer: &S,
    accept: f64,
    max_cost: i64,
    max_calls: usize,
    mut out: Option<&mut [u8]>,
    ws: &mut DiffWorkspace,
    mut i: i64,
    mut j: i64,
) -> i64 {
    let max_cost = max_cost.min(n + m);

    // Strip matching prefixes and suffixes first. This fast-paths the
    // common mostly-equal case and guarantees that recursion only ever
    // happens with non-zero cost, so it terminates.
    while n > 0 && m > 0 {
        ws.calls += 1;
        if scorer.score((i) as usize, (j) as usize) < accept {
            break;
        }
        if let Some(buf) = out.as_deref_mut() {
            let ix = (i + j) as usize;
            buf[ix] = CODE_DIAG;
            buf[ix + 1] = 0;
        }
        i += 1;
        j += 1;
        n -= 1;
        m -= 1;
    }
    while n > 0 && m > 0 {
        ws.calls += 1;
        if scorer.score((i + n - 1) as usize, (j + m - 1) as usize) < accept {
            break;
        }
        if let Some(buf) = out.as_deref_mut() {
            let ix = (i + j + n + m - 2) as usize;
            buf[ix] = CODE_DIAG;
            buf[ix + 1] = 0;
        }
        n -= 1;
        m -= 1;
    }

    if n == 0 || m == 0 {
        write_leftover(out.as_deref_mut(), i, j, n, m);
        return n + m;
    }

    // Anti-diagonal coordinates: diag = x - y + m and progress = x + y,
    // both in 0..=n+m. Each front stores one progress value per relevant
    // diagonal in a circular buffer indexed by (diag / 2) mod nm.
    let nm = (n.min(m) + 1) as usize;
    let n_m = n + m;
    ws.reset_fronts(nm, n_m);

    // Each round advances one of the fronts by one edit. The round
    // counter doubles as the cost explored so far.
    for cost in 0..=max_cost {
        let is_rev = cost % 2 == 1;
        let rev = cost % 2; // 1 on reverse rounds
        let sign = 1 - 2 * rev; // +1 forward, -1 reverse

        // diagonal ranges from the point of view of the updated front
        let (diag_src, diag_dst) = if is_rev { (n, m) } else { (m, n) };
        let p = cost / 2;
        let diag_updated_from = (diag_src - p).abs();
        let diag_updated_to = n_m - (diag_dst - p).abs();
        // the range the other front occupies, to test for a crossing
        let p = (cost - 1).div_euclid(2) + 1;
        let diag_facing_from = (diag_dst - p).abs();
        let diag_facing_to = n_m - (diag_src - p).abs();

        // Phase 1: slide every second diagonal as far as cheap diagonal
        // moves allow.
        let mut diag = diag_updated_from;
        while diag <= diag_updated_to + 1 {
            let ix = ((diag / 2) % nm as i64) as usize;
            let progress_start = ws.front(is_rev)[ix];
            let mut progress = progress_start;

            // (diag, progress) -> (x, y); the reverse front polls the
            // pair one step behind its position
            let mut x = (progress + diag - m).div_euclid(2) - rev;
            let mut y = (progress - diag + m).div_euclid(2) - rev;

            while 0 <= x && x < n && 0 <= y && y < m {
                ws.calls += 1;
                if scorer.score((x + i) as usize, (y + j) as usize) < accept {
                    break;
                }
                progress += 2 * sign;
                x += sign;
                y += sign;
            }
            ws.front_mut(is_rev)[ix] = progress;

            // The fronts cross once the forward progress on a shared
            // diagonal catches up with the reverse one; the first
            // crossing fixes the minimal cost and the split point.
            let facing =
                diag_facing_from <= diag && diag <= diag_facing_to && (diag - diag_facing_from) % 2 == 0;
            if facing && ws.forward[ix] >= ws.reverse[ix] {
                if out.is_some() {
                    {
                        let buf = out.as_deref_mut().unwrap();
                        let mut pos = progress_start - 2 * rev;
                        let end = progress - 2 * rev;
                        while (sign > 0 && pos < end) || (sign < 0 && pos > end) {
                            let base = (i + j + pos) as usize;
                            buf[base] = CODE_DIAG;
                            buf[base + 1] = 0;
                            pos += 2 * sign;
                        }
                    }

                    // Split at the two ends of the crossing snake and
                    // solve both quadrants with tightened budgets.
                    let mut x = (progress_start + diag - m).div_euclid(2);
                    let mut y = (progress_start - diag + m).div_euclid(2);
                    let mut x2 = (progress + diag - m).div_euclid(2);
                    let mut y2 = (progress - diag + m).div_euclid(2);
                    if is_rev {
                        std::mem::swap(&mut x, &mut x2);
                        std::mem::swap(&mut y, &mut y2);
                    }

                    search_recursive(
                        x,
                        y,
                        scorer,
                        accept,
                        cost / 2 + cost % 2,
                        max_calls,
                        out.as_deref_mut(),
                        ws,
                        i,
                        j,
                    );
                    search_recursive(
                        n - x2,
                        m - y2,
                        scorer,
                        accept,
                        cost / 2,
                        max_calls,
                        out.as_deref_mut(),
                        ws,
                        i + x2,
                        j + y2,
                    );
                }
                return cost;
            }

            diag += 2;
        }

        if ws.calls > max_calls {
            log::trace!(
                "giving up after {} scorer calls on a {}x{} block",
                ws.calls,
                n,
                m
            );
            break;
        }

        // Phase 2: step each remaining diagonal sideways from its best
        // neighbor. Writes are delayed by one iteration so the update
        // reads only pre-round values; the two edge diagonals fall back
        // to their single available neighbor.
        let p = cost / 2 + 1;
        let phase2_from = (diag_src - p).abs();
        let phase2_to = n_m - (diag_dst - p).abs();

        let mut pending: Option<(usize, i64)> = None;
        let mut diag = phase2_from;
        while diag <= phase2_to + 1 {
            let front = ws.front(is_rev);
            let left = front[(diag - 1).div_euclid(2).rem_euclid(nm as i64) as usize];
            let right = front[(diag + 1).div_euclid(2).rem_euclid(nm as i64) as usize];

            let progress = if diag == diag_updated_from - 1 {
                right
            } else if diag == diag_updated_to + 1 {
                left
            } else if is_rev {
                left.min(right)
            } else {
                left.max(right)
            };

            if let Some((ix, value)) = pending {
                ws.front_mut(is_rev)[ix] = value + sign;
            }
            pending = Some((((diag / 2) % nm as i64) as usize, progress));
            diag += 2;
        }
        if let Some((ix, value)) = pending {
            ws.front_mut(is_rev)[ix] = value + sign;
        }
    }

    // Budget exhausted before the fronts met: report the remainder as a
    // plain delete+insert block.
    log::trace!("cost budget {} exhausted on a {}x{} block", max_cost, n, m);
    write_leftover(out, i, j, n, m);
    n + m
}

fn write_leftover(out: Option<&mut [u8]>, i: i64, j: i64, n: i64, m: i64) {
    if let Some(buf) = out {
        for ix in (i + j)..(i + j + n) {
            buf[ix as usize] = CODE_DEL;
        }
        for ix in (i + j + n)..(i + j + n + m) {
            buf[ix as usize] = CODE_INS;
        }
    }
}
