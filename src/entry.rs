//! Entries and entry logs.
//!
//! An [`Entry`] is one paragraph-delimited record of a changelog-style file;
//! it is the atomic unit of comparison and placement for the whole merge.
//! An [`EntryLog`] is a parsed file: an ordered sequence of entries whose
//! concatenation reproduces the file bytes exactly.
//!
//! Entries borrow from the file buffer they were parsed out of; the only
//! owned entries are the ones synthesized when an accidentally merged
//! entry is split back apart.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use bstr::BStr;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One entry of a changelog-style file.
///
/// The bytes are opaque: they may contain NUL and are preserved verbatim,
/// including the terminating newline(s). Two entries are equal iff their
/// byte sequences are equal. The content hash is computed on first use and
/// memoised, so repeated hash-map probes don't rescan the bytes.
#[derive(Clone)]
pub struct Entry<'a> {
    bytes: Cow<'a, [u8]>,
    hash: OnceCell<u64>,
}

impl<'a> Entry<'a> {
    /// Create an entry borrowing a region of a file buffer.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: Cow::Borrowed(bytes),
            hash: OnceCell::new(),
        }
    }

    /// Create an entry owning freshly assembled bytes.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Cow::Owned(bytes),
            hash: OnceCell::new(),
        }
    }

    /// The raw bytes of the entry.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte length of the entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-length entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Memoised hash of the entry bytes.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = ahash::AHasher::default();
            hasher.write(&self.bytes);
            hasher.finish()
        })
    }

    /// A sub-entry sharing this entry's backing buffer where possible.
    #[must_use]
    pub(crate) fn slice(&self, range: Range<usize>) -> Self {
        match &self.bytes {
            Cow::Borrowed(bytes) => Self::new(&bytes[range]),
            Cow::Owned(bytes) => Self::from_vec(bytes[range].to_vec()),
        }
    }
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for Entry<'_> {}

impl Hash for Entry<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl PartialOrd for Entry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes().cmp(other.bytes())
    }
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First line only; whole entries are routinely hundreds of bytes.
        let first_line = self
            .bytes
            .split(|&b| b == b'\n')
            .next()
            .unwrap_or_default();
        f.debug_struct("Entry")
            .field("len", &self.len())
            .field("head", &BStr::new(first_line))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EntryLog
// ---------------------------------------------------------------------------

/// A parsed changelog-style file: an ordered sequence of entries.
#[derive(Debug)]
pub struct EntryLog<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> EntryLog<'a> {
    /// Split a file buffer into entries.
    ///
    /// An entry starts at a line that follows a blank line and begins with a
    /// non-whitespace character, or at the beginning of the file. Blank lines
    /// and continuation lines (leading tab or space) are swallowed into the
    /// current entry, so the trailing blank line belongs to the entry it
    /// terminates. The parse is lossless: concatenating the entries in order
    /// reproduces `input` byte for byte. An empty input yields no entries.
    #[must_use]
    pub fn parse(input: &'a [u8]) -> Self {
        let mut entries = Vec::new();
        let mut start = 0;
        while start < input.len() {
            let mut pos = start;
            let end = loop {
                match memchr::memchr(b'\n', &input[pos..]) {
                    None => break input.len(),
                    Some(offset) => {
                        pos += offset + 1;
                        if input.len() - pos >= 2
                            && input[pos] == b'\n'
                            && !matches!(input[pos + 1], b'\n' | b'\t' | b' ')
                        {
                            // The blank line closes the current entry; the
                            // next entry starts at the non-whitespace line.
                            break pos + 1;
                        }
                    }
                }
            };
            entries.push(Entry::new(&input[start..end]));
            start = end;
        }
        Self { entries }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the file had no entries (i.e. was empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn entry(&self, index: usize) -> &Entry<'a> {
        &self.entries[index]
    }

    /// All entries, in file order.
    #[must_use]
    pub fn entries(&self) -> &[Entry<'a>] {
        &self.entries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
