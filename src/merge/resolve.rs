//! Applying the edit script to the mainstream file.
//!
//! The executor seeds the output with the mainstream entries, then walks
//! the ancestor→modified edit script and carries each edit over:
//!
//! - additions at the top of the modified file go to the top of the
//!   output; interior additions are spliced in when the bracketing
//!   entries are still adjacent in the mainstream file;
//! - removals delete the corresponding mainstream entry when it is still
//!   byte-identical to the ancestor's;
//! - changes are classified, in order: split of an accidentally merged
//!   entry at the top, simple change (insertions plus in-place edits of
//!   recognisably-similar entries), big change applied en bloc when the
//!   replaced run survived untouched in the mainstream file.
//!
//! Whatever cannot be carried over becomes a [`Conflict`]; conflicts
//! never abort the merge.

use tracing::debug;

use crate::entry::{Entry, EntryLog};
use crate::merge::mapping::EntryMapping;
use crate::merge::split::try_split_merged_entry;
use crate::merge::types::{Conflict, Differences, Edit, MergeOutcome};
use crate::similarity::{SIMILARITY_THRESHOLD, similarity};

// ---------------------------------------------------------------------------
// MergedLog
// ---------------------------------------------------------------------------

/// The output sequence under construction.
///
/// Mainstream entries keep their identity as slots addressed by their
/// original position: a slot can be overwritten or deleted in place, and
/// entries can be inserted before it, without invalidating any other slot
/// address. Prepended runs live above all slots, appended runs below.
#[derive(Debug)]
struct MergedLog<'a> {
    top: Vec<Entry<'a>>,
    slots: Vec<Slot<'a>>,
    tail: Vec<Entry<'a>>,
}

#[derive(Debug)]
struct Slot<'a> {
    before: Vec<Entry<'a>>,
    value: Option<Entry<'a>>,
}

impl<'a> MergedLog<'a> {
    fn seed(mainstream: &EntryLog<'a>) -> Self {
        Self {
            top: Vec::new(),
            slots: mainstream
                .entries()
                .iter()
                .map(|entry| Slot {
                    before: Vec::new(),
                    value: Some(entry.clone()),
                })
                .collect(),
            tail: Vec::new(),
        }
    }

    /// Place `run` above everything placed so far.
    fn prepend(&mut self, run: &[Entry<'a>]) {
        self.top.splice(0..0, run.iter().cloned());
    }

    /// Splice `run` immediately before slot `k`, after anything already
    /// inserted there.
    fn insert_before(&mut self, k: usize, run: &[Entry<'a>]) {
        self.slots[k].before.extend(run.iter().cloned());
    }

    /// Place `run` after the last slot.
    fn append(&mut self, run: &[Entry<'a>]) {
        self.tail.extend(run.iter().cloned());
    }

    /// Overwrite slot `k`.
    fn set(&mut self, k: usize, entry: Entry<'a>) {
        self.slots[k].value = Some(entry);
    }

    /// Delete slot `k`. Insertions anchored to it are unaffected.
    fn clear(&mut self, k: usize) {
        self.slots[k].value = None;
    }

    fn into_entries(self) -> Vec<Entry<'a>> {
        let mut entries = self.top;
        for slot in self.slots {
            entries.extend(slot.before);
            if let Some(value) = slot.value {
                entries.push(value);
            }
        }
        entries.extend(self.tail);
        entries
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Apply the `ancestor`→`modified` edit script to `mainstream`.
///
/// `mapping` must be the ancestor↔mainstream correspondence and `diffs`
/// the ancestor→modified differences.
#[must_use]
pub fn apply_edits<'a>(
    ancestor: &EntryLog<'a>,
    mainstream: &EntryLog<'a>,
    modified: &EntryLog<'a>,
    mapping: &mut EntryMapping<'_, 'a>,
    diffs: &Differences,
) -> MergeOutcome<'a> {
    let mut executor = Executor {
        ancestor,
        mainstream,
        modified,
        mapping,
        diffs,
        out: MergedLog::seed(mainstream),
        conflicts: Vec::new(),
    };
    for edit in &diffs.edits {
        executor.apply(edit);
    }
    MergeOutcome {
        entries: executor.out.into_entries(),
        conflicts: executor.conflicts,
    }
}

struct Executor<'e, 'm, 'a> {
    ancestor: &'e EntryLog<'a>,
    mainstream: &'e EntryLog<'a>,
    modified: &'e EntryLog<'a>,
    mapping: &'e mut EntryMapping<'m, 'a>,
    diffs: &'e Differences,
    out: MergedLog<'a>,
    conflicts: Vec<Conflict<'a>>,
}

impl<'a> Executor<'_, '_, 'a> {
    fn apply(&mut self, edit: &Edit) {
        debug!(%edit, "applying");
        match *edit {
            Edit::Addition { j1, j2 } => self.addition(j1, j2),
            Edit::Removal { i1, i2 } => self.removal(i1, i2),
            Edit::Change { i1, i2, j1, j2 } => self.change(i1, i2, j1, j2),
        }
    }

    // -----------------------------------------------------------------------
    // Additions
    // -----------------------------------------------------------------------

    fn addition(&mut self, j1: usize, j2: usize) {
        let run = &self.modified.entries()[j1..=j2];
        if j1 == 0 {
            // New entries at the top of the modified file go to the top of
            // the output.
            self.out.prepend(run);
            return;
        }
        match self.addition_anchor(j1, j2) {
            Some(k_after) if k_after == self.mainstream.len() => self.out.append(run),
            Some(k_after) => self.out.insert_before(k_after, run),
            None => {
                // No longer clear where the run belongs; let the user
                // place it.
                self.conflicts.push(Conflict {
                    ancestor: Vec::new(),
                    modified: run.to_vec(),
                });
            }
        }
    }

    /// The mainstream slot an interior addition goes in front of.
    ///
    /// The addition sits between two ancestor entries (the second may be
    /// the end of file). It can be applied only when both still exist in
    /// the mainstream file and are still adjacent there.
    fn addition_anchor(&mut self, j1: usize, j2: usize) -> Option<usize> {
        let i_before = self.diffs.rev[j1 - 1]?;
        let i_after = if j2 + 1 == self.modified.len() {
            self.ancestor.len()
        } else {
            self.diffs.rev[j2 + 1]?
        };
        debug_assert_eq!(i_after, i_before + 1);
        let k_before = self.mapping.get(i_before)?;
        let k_after = if i_after == self.ancestor.len() {
            self.mainstream.len()
        } else {
            self.mapping.get(i_after)?
        };
        (k_after == k_before + 1).then_some(k_after)
    }

    // -----------------------------------------------------------------------
    // Removals
    // -----------------------------------------------------------------------

    fn removal(&mut self, i1: usize, i2: usize) {
        // Removals apply one entry at a time; each one either still exists
        // untouched in the mainstream file or conflicts on its own.
        for i in i1..=i2 {
            let removed = self.ancestor.entry(i);
            match self.mapping.get(i) {
                Some(k) if self.mainstream.entry(k) == removed => self.out.clear(k),
                _ => self.conflicts.push(Conflict {
                    ancestor: vec![removed.clone()],
                    modified: Vec::new(),
                }),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Changes
    // -----------------------------------------------------------------------

    fn change(&mut self, i1: usize, i2: usize, j1: usize, j2: usize) {
        let num_changed = i2 - i1 + 1;
        if i2 - i1 <= j2 - j1 {
            let num_added = (j2 - j1 + 1) - num_changed;

            // An entry at the top that absorbed unrelated paragraphs under
            // the same title: split it, treat the glued-on part as an
            // addition and the rest as an in-place edit.
            if j1 == 0 {
                let split = try_split_merged_entry(
                    self.ancestor.entry(i1),
                    self.modified.entry(j1 + num_added),
                );
                if let Some((head, tail)) = split {
                    if self.pairs_similar(i1 + 1, i2, j2) {
                        let mut run = self.modified.entries()[j1..j1 + num_added].to_vec();
                        run.push(head);
                        self.out.prepend(&run);
                        self.apply_pairwise(i2, j1 + num_added, j2, Some(tail));
                        return;
                    }
                }
            }

            // A simple change: insertions followed by in-place edits of
            // entries that are each still recognisably the old one.
            if self.pairs_similar(i1, i2, j2) {
                if j1 == 0 {
                    let run = &self.modified.entries()[j1..j1 + num_added];
                    self.out.prepend(run);
                    self.apply_pairwise(i2, j1 + num_added, j2, None);
                    return;
                }
                if let Some(k_before) = self.linear_anchor(j1, num_changed) {
                    let run = &self.modified.entries()[j1..j1 + num_added];
                    self.out.insert_before(k_before + 1, run);
                    self.apply_pairwise(i2, j1 + num_added, j2, None);
                    return;
                }
                // The changed run moved or lost members in the mainstream
                // file; the whole range conflicts.
                self.change_conflict(i1, i2, j1, j2);
                return;
            }
        }

        // A big change. If the replaced run survived untouched and
        // consecutive in the mainstream file, swap it out en bloc.
        if let Some(k1) = self.unchanged_run(i1, i2) {
            let run = &self.modified.entries()[j1..=j2];
            self.out.insert_before(k1, run);
            for i in i1..=i2 {
                self.out.clear(k1 + (i - i1));
            }
            return;
        }

        self.change_conflict(i1, i2, j1, j2);
    }

    /// Give up on a change: conflict on the full ancestor and modified
    /// ranges.
    fn change_conflict(&mut self, i1: usize, i2: usize, j1: usize, j2: usize) {
        self.conflicts.push(Conflict {
            ancestor: self.ancestor.entries()[i1..=i2].to_vec(),
            modified: self.modified.entries()[j1..=j2].to_vec(),
        });
    }

    /// Whether every ancestor entry of `i_lo..=i2` is similar to its
    /// aligned counterpart in the modified file.
    fn pairs_similar(&self, i_lo: usize, i2: usize, j2: usize) -> bool {
        (i_lo..=i2).all(|i| {
            let counterpart = self.modified.entry(i + j2 - i2);
            similarity(
                self.ancestor.entry(i).bytes(),
                counterpart.bytes(),
                SIMILARITY_THRESHOLD,
            ) >= SIMILARITY_THRESHOLD
        })
    }

    /// Apply the in-place edits of a simple change, one entry at a time.
    ///
    /// `first_replacement` substitutes for the first changed entry's new
    /// content when the top entry was split.
    fn apply_pairwise(
        &mut self,
        i2: usize,
        j_lo: usize,
        j2: usize,
        mut first_replacement: Option<Entry<'a>>,
    ) {
        for j in j_lo..=j2 {
            let changed = first_replacement
                .take()
                .unwrap_or_else(|| self.modified.entry(j).clone());
            self.single_change(j + i2 - j2, changed);
        }
    }

    /// Carry one in-place edit over to the mainstream file.
    fn single_change(&mut self, i: usize, changed: Entry<'a>) {
        let old = self.ancestor.entry(i);
        match self.mapping.get(i) {
            Some(k) if self.mainstream.entry(k) == old => self.out.set(k, changed),
            _ if *old == changed => {
                // Not an actual change; nothing to carry over.
            }
            _ => self.conflicts.push(Conflict {
                ancestor: vec![old.clone()],
                modified: vec![changed],
            }),
        }
    }

    /// The mainstream slot right before a simple interior change, provided
    /// the changed run still follows it contiguously there.
    fn linear_anchor(&mut self, j1: usize, num_changed: usize) -> Option<usize> {
        let i_before = self.diffs.rev[j1 - 1]?;
        let k_before = self.mapping.get(i_before)?;
        for i in i_before + 1..=i_before + num_changed {
            if self.mapping.get(i) != Some(k_before + (i - i_before)) {
                return None;
            }
        }
        Some(k_before)
    }

    /// The mainstream position of `i1` when the whole run `i1..=i2` is
    /// still present byte-identical and consecutive in the mainstream
    /// file.
    fn unchanged_run(&mut self, i1: usize, i2: usize) -> Option<usize> {
        let k1 = self.mapping.get(i1)?;
        if self.mainstream.entry(k1) != self.ancestor.entry(i1) {
            return None;
        }
        for i in i1 + 1..=i2 {
            let k = self.mapping.get(i)?;
            if k != k1 + (i - i1) || self.mainstream.entry(k) != self.ancestor.entry(i) {
                return None;
            }
        }
        Some(k1)
    }
}
