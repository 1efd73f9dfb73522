//! The entry-aware three-way merge engine.
//!
//! The pipeline, leaves first:
//!
//! 1. [`mapping`] computes the fuzzy correspondence between the ancestor
//!    and the mainstream file;
//! 2. [`diff`] computes the exact, ordered edit script from the ancestor
//!    to the user-modified file;
//! 3. [`resolve`] applies the script to the mainstream entries, collecting
//!    a conflict for every edit that cannot be carried over.
//!
//! [`merge`] wires the three together over raw file buffers.

pub mod diff;
pub mod mapping;
pub mod resolve;
pub mod split;
pub mod types;

use crate::entry::EntryLog;
use crate::merge::mapping::EntryMapping;
pub use crate::merge::types::{Conflict, MergeOutcome};

/// Merge `modified`'s changes relative to `ancestor` into `mainstream`.
///
/// All three buffers are parsed into entry logs; the returned outcome
/// borrows entries from them. The ancestor↔mainstream correspondence is
/// resolved lazily, so fuzzy similarity is only paid for where an edit
/// actually probes it.
#[must_use]
pub fn merge<'a>(
    ancestor: &'a [u8],
    mainstream: &'a [u8],
    modified: &'a [u8],
) -> MergeOutcome<'a> {
    let ancestor = EntryLog::parse(ancestor);
    let mainstream = EntryLog::parse(mainstream);
    let modified = EntryLog::parse(modified);
    let mut mapping = EntryMapping::build(&ancestor, &mainstream, false);
    let diffs = diff::compute_differences(&ancestor, &modified);
    resolve::apply_edits(&ancestor, &mainstream, &modified, &mut mapping, &diffs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
