//! Correspondence between the entries of two files.
//!
//! The mapping is a partial bijection between entry positions: exact
//! matches are paired up front, and everything else is matched lazily by
//! fuzzy similarity so a slightly reworded entry still finds its
//! original. Both passes walk positions in descending order. That bias
//! matters: new entries pile up at the top of these files, so starting
//! from the bottom pairs old entries with their originals instead of
//! letting a newer, similar entry capture them.

use ahash::AHashMap;
use tracing::trace;

use crate::entry::{Entry, EntryLog};
use crate::similarity::{SIMILARITY_THRESHOLD, similarity};

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// State of one position in the mapping.
///
/// Bindings are monotonic: a slot moves past `Uncomputed` at most once and
/// is never re-bound afterwards, so lazy lookups are stable regardless of
/// probe order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Not yet looked at; a lazy lookup will resolve it.
    Uncomputed,
    /// Looked at and found no counterpart.
    Unmatched,
    /// Bound to the given position of the other file.
    Matched(usize),
}

impl Binding {
    /// The bound position, if any.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Matched(index) => Some(index),
            Self::Uncomputed | Self::Unmatched => None,
        }
    }

    /// Returns `true` while the slot can still be bound.
    #[must_use]
    pub const fn is_free(self) -> bool {
        !matches!(self, Self::Matched(_))
    }
}

// ---------------------------------------------------------------------------
// EntryMapping
// ---------------------------------------------------------------------------

/// A partial bijection between the entry positions of two files.
///
/// Invariant: whenever `fwd[i]` is `Matched(j)`, `rev[j]` is `Matched(i)`,
/// and vice versa.
#[derive(Debug)]
pub struct EntryMapping<'m, 'a> {
    file1: &'m EntryLog<'a>,
    file2: &'m EntryLog<'a>,
    fwd: Vec<Binding>,
    rev: Vec<Binding>,
}

impl<'m, 'a> EntryMapping<'m, 'a> {
    /// Compute the correspondence between `file1` and `file2`.
    ///
    /// Exact matches are paired immediately. Fuzzy matches are resolved
    /// lazily through [`EntryMapping::get`], or up front when `full` is
    /// set.
    #[must_use]
    pub fn build(file1: &'m EntryLog<'a>, file2: &'m EntryLog<'a>, full: bool) -> Self {
        let mut mapping = Self {
            file1,
            file2,
            fwd: vec![Binding::Uncomputed; file1.len()],
            rev: vec![Binding::Uncomputed; file2.len()],
        };
        mapping.pair_exact_matches();
        if full {
            for i in (0..file1.len()).rev() {
                mapping.get(i);
            }
        }
        mapping
    }

    /// The counterpart in file 2 of position `i` of file 1, resolving the
    /// binding fuzzily if it has not been computed yet.
    pub fn get(&mut self, i: usize) -> Option<usize> {
        if self.fwd[i] == Binding::Uncomputed {
            self.resolve_fuzzy(i);
        }
        self.fwd[i].index()
    }

    /// The current binding of position `i` of file 1, without resolving it.
    #[must_use]
    pub fn forward(&self, i: usize) -> Binding {
        self.fwd[i]
    }

    /// The current binding of position `j` of file 2, without resolving it.
    #[must_use]
    pub fn reverse(&self, j: usize) -> Binding {
        self.rev[j]
    }

    /// Pair up byte-identical entries, latest first.
    ///
    /// When an entry occurs several times in both files, the last
    /// occurrences are paired and earlier occurrences are matched walking
    /// backwards as long as both files still have one. Surplus duplicates
    /// on either side stay unmapped.
    fn pair_exact_matches(&mut self) {
        let (file1, file2) = (self.file1, self.file2);
        let occurrences1 = occurrence_index(file1);
        let occurrences2 = occurrence_index(file2);
        for i in (0..file1.len()).rev() {
            if self.fwd[i] != Binding::Uncomputed {
                continue;
            }
            let entry = file1.entry(i);
            let Some(in_file2) = occurrences2.get(entry) else {
                continue;
            };
            let Some(&last_j) = in_file2.last() else {
                continue;
            };
            if !self.rev[last_j].is_free() {
                // More occurrences in file 1 than in file 2; the surplus
                // stays unmapped.
                continue;
            }
            let Some(in_file1) = occurrences1.get(entry) else {
                continue;
            };
            debug_assert_eq!(in_file1.last(), Some(&i));
            let pairs = in_file1.len().min(in_file2.len());
            for t in 1..=pairs {
                let i_t = in_file1[in_file1.len() - t];
                let j_t = in_file2[in_file2.len() - t];
                debug_assert!(self.fwd[i_t].is_free());
                debug_assert!(self.rev[j_t].is_free());
                self.fwd[i_t] = Binding::Matched(j_t);
                self.rev[j_t] = Binding::Matched(i_t);
            }
        }
    }

    /// Resolve position `i` of file 1 by fuzzy similarity.
    ///
    /// `i` is bound to the still-free position of file 2 most similar to
    /// it, but only when the match is mutual: the chosen entry's own best
    /// still-free match in file 1 must be `i` again. The mutual check
    /// prevents asymmetric bindings when several entries look alike.
    fn resolve_fuzzy(&mut self, i: usize) {
        let (file1, file2) = (self.file1, self.file2);
        let entry_i = file1.entry(i);
        let (best_j, best_j_similarity) = best_match(entry_i, file2, |j| self.rev[j].is_free());
        if best_j_similarity >= SIMILARITY_THRESHOLD {
            if let Some(best_j) = best_j {
                let entry_j = file2.entry(best_j);
                let (best_i, best_i_similarity) =
                    best_match(entry_j, file1, |ii| self.fwd[ii].is_free());
                if best_i_similarity >= SIMILARITY_THRESHOLD && best_i == Some(i) {
                    trace!(i, j = best_j, similarity = best_j_similarity, "fuzzy match");
                    self.fwd[i] = Binding::Matched(best_j);
                    self.rev[best_j] = Binding::Matched(i);
                }
            }
        }
        if self.fwd[i] == Binding::Uncomputed {
            self.fwd[i] = Binding::Unmatched;
        }
    }
}

/// The most similar still-free entry of `candidates`, scanned latest
/// first. The running best similarity doubles as the lower bound, so
/// hopeless candidates are dismissed cheaply.
fn best_match(
    entry: &Entry<'_>,
    candidates: &EntryLog<'_>,
    is_free: impl Fn(usize) -> bool,
) -> (Option<usize>, f64) {
    let mut best = None;
    let mut best_similarity = 0.0;
    for index in (0..candidates.len()).rev() {
        if !is_free(index) {
            continue;
        }
        let score = similarity(
            entry.bytes(),
            candidates.entry(index).bytes(),
            best_similarity,
        );
        if score > best_similarity {
            best = Some(index);
            best_similarity = score;
        }
    }
    (best, best_similarity)
}

/// Positions of each distinct entry, in ascending order.
fn occurrence_index<'m, 'a>(file: &'m EntryLog<'a>) -> AHashMap<&'m Entry<'a>, Vec<usize>> {
    let mut index: AHashMap<&Entry<'_>, Vec<usize>> = AHashMap::new();
    for (position, entry) in file.entries().iter().enumerate() {
        index.entry(entry).or_default().push(position);
    }
    index
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn log(input: &[u8]) -> EntryLog<'_> {
        EntryLog::parse(input)
    }

    #[test]
    fn identical_files_map_positionally() {
        let a = log(b"one\n\ntwo\n\nthree\n");
        let b = log(b"one\n\ntwo\n\nthree\n");
        let mut mapping = EntryMapping::build(&a, &b, false);
        for i in 0..3 {
            assert_eq!(mapping.get(i), Some(i));
        }
    }

    #[test]
    fn prepended_entry_shifts_the_mapping() {
        let a = log(b"one\n\ntwo\n");
        let b = log(b"new\n\none\n\ntwo\n");
        let mut mapping = EntryMapping::build(&a, &b, false);
        assert_eq!(mapping.get(0), Some(1));
        assert_eq!(mapping.get(1), Some(2));
        assert_eq!(mapping.reverse(0), Binding::Uncomputed);
    }

    #[test]
    fn surplus_duplicates_stay_unmapped() {
        // "dup" occurs twice in file 1 but once in file 2: the later
        // occurrence pairs, the earlier one finds no exact partner.
        let a = log(b"dup\n\nmid\n\ndup\n\n");
        let b = log(b"dup\n\nmid\n\n");
        let mut mapping = EntryMapping::build(&a, &b, false);
        assert_eq!(mapping.get(2), Some(0));
        assert_eq!(mapping.get(1), Some(1));
        assert_eq!(mapping.get(0), None);
    }

    #[test]
    fn duplicate_chains_pair_backwards() {
        let a = log(b"dup\n\ndup\n\nend\n");
        let b = log(b"dup\n\ndup\n\nend\n");
        let mut mapping = EntryMapping::build(&a, &b, false);
        assert_eq!(mapping.get(0), Some(0));
        assert_eq!(mapping.get(1), Some(1));
        assert_eq!(mapping.get(2), Some(2));
    }

    #[test]
    fn edited_entry_matches_fuzzily() {
        let a = log(b"2024-05-01  Jane\n\n\t* parser: handle empty files\n\nolder\n");
        let b = log(b"2024-05-01  Jane\n\n\t* parser: handle empty inputs\n\nolder\n");
        let mut mapping = EntryMapping::build(&a, &b, false);
        assert_eq!(mapping.get(0), Some(0));
        assert_eq!(mapping.get(1), Some(1));
    }

    #[test]
    fn dissimilar_entry_stays_unmatched() {
        let a = log(b"an entry about the parser\n");
        let b = log(b"1970-01-01\n");
        let mut mapping = EntryMapping::build(&a, &b, false);
        assert_eq!(mapping.get(0), None);
        assert_eq!(mapping.forward(0), Binding::Unmatched);
    }

    #[test]
    fn full_build_resolves_everything_up_front() {
        let a = log(b"one alpha\n\ntwo beta\n");
        let b = log(b"one alphas\n\ntwo betas\n");
        let mapping = EntryMapping::build(&a, &b, true);
        assert_ne!(mapping.forward(0), Binding::Uncomputed);
        assert_ne!(mapping.forward(1), Binding::Uncomputed);
    }

    #[test]
    fn bindings_stay_bijective() {
        let a = log(b"one\n\ntwo edited slightly\n\nthree\n");
        let b = log(b"zero\n\none\n\ntwo edited slightl\n\nthree\n");
        let mut mapping = EntryMapping::build(&a, &b, false);
        for i in 0..a.len() {
            if let Some(j) = mapping.get(i) {
                assert_eq!(mapping.reverse(j), Binding::Matched(i));
            }
        }
    }
}
