//! Myers O(ND) line diff
//!
//! Produces a list of [`Edit`] regions between two sequences. Common prefix
//! and suffix are stripped before the search so typical formatter diffs
//! (a handful of changed lines in a large file) stay cheap. The search gives
//! up past [`MAX_EDIT_DISTANCE`] and reports a single replace.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Delete,
    Replace,
}

/// Half-open ranges `a[begin_a..end_a]` replaced by `b[begin_b..end_b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub begin_a: usize,
    pub end_a: usize,
    pub begin_b: usize,
    pub end_b: usize,
}

impl Edit {
    #[must_use]
    pub fn len_a(&self) -> usize {
        self.end_a - self.begin_a
    }

    #[must_use]
    pub fn len_b(&self) -> usize {
        self.end_b - self.begin_b
    }

    #[must_use]
    pub fn kind(&self) -> EditKind {
        match (self.len_a(), self.len_b()) {
            (0, _) => EditKind::Insert,
            (_, 0) => EditKind::Delete,
            _ => EditKind::Replace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// Edit scripts longer than this are not searched for. The differing region
/// between the common prefix and suffix becomes one replace instead, which
/// keeps the backtracking trace at O(D²) entries for huge rewrites.
pub const MAX_EDIT_DISTANCE: usize = 1024;

/// Compute the edits that turn `a` into `b`, in ascending order.
pub fn diff<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Edit> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];
    let ops = shortest_edit_script(mid_a, mid_b, MAX_EDIT_DISTANCE)
        .unwrap_or_else(|| replace_all(mid_a.len(), mid_b.len()));
    group(&ops, prefix)
}

fn replace_all(deleted: usize, inserted: usize) -> Vec<Op> {
    let mut ops = vec![Op::Delete; deleted];
    ops.resize(deleted + inserted, Op::Insert);
    ops
}

/// `None` when the script needs more than `limit` inserts and deletes.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn shortest_edit_script<T: PartialEq>(a: &[T], b: &[T], limit: usize) -> Option<Vec<Op>> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    if n == 0 {
        return Some(vec![Op::Insert; b.len()]);
    }
    if m == 0 {
        return Some(vec![Op::Delete; a.len()]);
    }

    let bound = (n + m).min(limit as isize);
    let idx = |k: isize| (k + bound + 1) as usize;
    let mut v = vec![0isize; 2 * bound as usize + 4];
    // trace[d] holds v[-d-1..=d+1] as it was before round d.
    let mut trace: Vec<Vec<isize>> = Vec::new();
    let mut reached = false;

    'search: for d in 0..=bound {
        trace.push(v[idx(-d - 1)..=idx(d + 1)].to_vec());
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]) {
                v[idx(k + 1)]
            } else {
                v[idx(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx(k)] = x;
            if x >= n && y >= m {
                reached = true;
                break 'search;
            }
            k += 2;
        }
    }
    if !reached {
        return None;
    }

    // Walk the trace backwards from (n, m) to (0, 0).
    let mut ops = Vec::with_capacity(a.len() + b.len());
    let (mut x, mut y) = (n, m);
    for (d, window) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let at = |k: isize| window[(k + d + 1) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;
        while x > prev_x && y > prev_y {
            ops.push(Op::Equal);
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(Op::Insert);
            } else {
                ops.push(Op::Delete);
            }
        }
        x = prev_x;
        y = prev_y;
    }
    ops.reverse();
    Some(ops)
}

fn group(ops: &[Op], offset: usize) -> Vec<Edit> {
    let mut edits = Vec::new();
    let (mut ia, mut ib) = (offset, offset);
    let mut current: Option<Edit> = None;

    for op in ops {
        match op {
            Op::Equal => {
                if let Some(edit) = current.take() {
                    edits.push(edit);
                }
                ia += 1;
                ib += 1;
            }
            Op::Delete | Op::Insert => {
                let edit = current.get_or_insert(Edit {
                    begin_a: ia,
                    end_a: ia,
                    begin_b: ib,
                    end_b: ib,
                });
                if *op == Op::Delete {
                    ia += 1;
                    edit.end_a = ia;
                } else {
                    ib += 1;
                    edit.end_b = ib;
                }
            }
        }
    }
    if let Some(edit) = current {
        edits.push(edit);
    }
    edits
}
