//! Core types for the entry merge engine.
//!
//! Defines the data structures that flow through the
//! mapping → diff → resolve pipeline.

use std::fmt;

use crate::entry::Entry;

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// One edit of the script transforming an ancestor file into a modified
/// file. Ranges are inclusive entry positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Entries `j1..=j2` of the modified file have no counterpart in the
    /// ancestor.
    Addition { j1: usize, j2: usize },
    /// Entries `i1..=i2` of the ancestor have no counterpart in the
    /// modified file.
    Removal { i1: usize, i2: usize },
    /// Entries `i1..=i2` of the ancestor were replaced by entries
    /// `j1..=j2` of the modified file at the same logical position. The
    /// two ranges need not have the same length.
    Change {
        i1: usize,
        i2: usize,
        j1: usize,
        j2: usize,
    },
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addition { j1, j2 } => write!(f, "addition of {j1}..={j2}"),
            Self::Removal { i1, i2 } => write!(f, "removal of {i1}..={i2}"),
            Self::Change { i1, i2, j1, j2 } => {
                write!(f, "change of {i1}..={i2} into {j1}..={j2}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Differences
// ---------------------------------------------------------------------------

/// The differences from one file to another: a complete position mapping
/// plus the ordered edit script.
///
/// Unlike the fuzzy correspondence of [`crate::merge::mapping`], this is
/// order-preserving and exact: it distinguishes a change from an adjacent
/// removal/addition pair, which is what lets the merge recognise simple
/// in-place edits.
#[derive(Debug)]
pub struct Differences {
    /// For each position of file 1, its counterpart in file 2 (`None` when
    /// the entry was removed).
    pub fwd: Vec<Option<usize>>,
    /// For each position of file 2, its counterpart in file 1 (`None` when
    /// the entry was added).
    pub rev: Vec<Option<usize>>,
    /// The edits transforming file 1 into file 2, in file order. Every
    /// position of either file is covered by exactly one edit or mapped.
    pub edits: Vec<Edit>,
}

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

/// A pair of entry runs whose reconciliation needs human judgement.
///
/// Either side may be empty (a removal conflict has no modified side, an
/// addition conflict has no ancestor side) but never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict<'a> {
    /// Entries from the ancestor file.
    pub ancestor: Vec<Entry<'a>>,
    /// Entries from the user-modified file.
    pub modified: Vec<Entry<'a>>,
}

// ---------------------------------------------------------------------------
// MergeOutcome
// ---------------------------------------------------------------------------

/// Result of a three-way entry merge.
#[derive(Debug)]
pub struct MergeOutcome<'a> {
    /// The merged entries, in output order.
    pub entries: Vec<Entry<'a>>,
    /// Unresolved edits, in the order they were encountered. Written ahead
    /// of the entries so they cannot be overlooked.
    pub conflicts: Vec<Conflict<'a>>,
}

impl MergeOutcome<'_> {
    /// Returns `true` if the merge resolved without conflicts.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
