//! Entry-level edit script between two files.
//!
//! Runs a Myers LCS diff where the element is a whole entry and equality
//! is byte equality, then walks the result into the domain model: a
//! complete position mapping plus an ordered script of addition, removal
//! and change runs. Order is what distinguishes a change from an
//! unrelated removal/addition pair; the fuzzy correspondence of
//! [`crate::merge::mapping`] deliberately ignores it, this module
//! deliberately keeps it.

use similar::{Algorithm, DiffOp, capture_diff_slices};
use tracing::trace;

use crate::entry::EntryLog;
use crate::merge::types::{Differences, Edit};

/// Compute the differences from `file1` to `file2`.
#[must_use]
pub fn compute_differences(file1: &EntryLog<'_>, file2: &EntryLog<'_>) -> Differences {
    let n1 = file1.len();
    let n2 = file2.len();

    // Mark removed and added positions from the LCS edit ops.
    let ops = capture_diff_slices(Algorithm::Myers, file1.entries(), file2.entries());
    let mut deleted = vec![false; n1];
    let mut inserted = vec![false; n2];
    for op in &ops {
        match *op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                deleted[old_index..old_index + old_len].fill(true);
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                inserted[new_index..new_index + new_len].fill(true);
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                deleted[old_index..old_index + old_len].fill(true);
                inserted[new_index..new_index + new_len].fill(true);
            }
        }
    }

    // Surviving positions pair up in order.
    let mut fwd: Vec<Option<usize>> = vec![None; n1];
    let mut rev: Vec<Option<usize>> = vec![None; n2];
    let (mut i, mut j) = (0, 0);
    loop {
        while i < n1 && deleted[i] {
            i += 1;
        }
        while j < n2 && inserted[j] {
            j += 1;
        }
        debug_assert_eq!(i < n1, j < n2);
        if i >= n1 || j >= n2 {
            break;
        }
        fwd[i] = Some(j);
        rev[j] = Some(i);
        i += 1;
        j += 1;
    }

    // Walk again and group the marks into edit runs. A removed run
    // abutting an added run becomes a single change.
    let mut edits = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n1 || j < n2 {
        if i == n1 {
            edits.push(Edit::Addition { j1: j, j2: n2 - 1 });
            break;
        }
        if j == n2 {
            edits.push(Edit::Removal { i1: i, i2: n1 - 1 });
            break;
        }
        match (fwd[i].is_some(), rev[j].is_some()) {
            (true, true) => {
                debug_assert_eq!(fwd[i], Some(j));
                i += 1;
                j += 1;
            }
            (true, false) => {
                let j1 = j;
                while j < n2 && rev[j].is_none() {
                    j += 1;
                }
                edits.push(Edit::Addition { j1, j2: j - 1 });
            }
            (false, true) => {
                let i1 = i;
                while i < n1 && fwd[i].is_none() {
                    i += 1;
                }
                edits.push(Edit::Removal { i1, i2: i - 1 });
            }
            (false, false) => {
                let i1 = i;
                while i < n1 && fwd[i].is_none() {
                    i += 1;
                }
                let j1 = j;
                while j < n2 && rev[j].is_none() {
                    j += 1;
                }
                edits.push(Edit::Change {
                    i1,
                    i2: i - 1,
                    j1,
                    j2: j - 1,
                });
            }
        }
    }

    trace!(edits = edits.len(), "computed edit script");
    Differences { fwd, rev, edits }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
