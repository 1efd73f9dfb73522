//! Splitting an accidentally merged entry.
//!
//! Users who land several changes on the same date sometimes glue a new
//! paragraph into an existing entry instead of writing a fresh one. Seen
//! naively that is one opaque big change; recognising the seam turns it
//! into "new entry prepended" plus "old entry kept", which merges
//! cleanly.

use crate::entry::Entry;
use crate::similarity::{STRICT_SIMILARITY_THRESHOLD, similarity};

/// Offset of the end of the paragraph containing `offset`.
///
/// The returned offset points at the newline that begins a blank line, or
/// at the end of the bytes when no paragraph break follows.
fn paragraph_end(bytes: &[u8], mut offset: usize) -> usize {
    loop {
        match memchr::memchr(b'\n', &bytes[offset..]) {
            None => return bytes.len(),
            Some(newline) => {
                offset += newline + 1;
                if offset < bytes.len() && bytes[offset] == b'\n' {
                    return offset;
                }
            }
        }
    }
}

/// Try to split `new` back into the entry that was glued on and the
/// original `old` entry.
///
/// Given an old entry `TITLE BODY` and a new entry `TITLE BODY1 BODY'`
/// where both titles are byte-equal and `BODY'` closely resembles `BODY`,
/// returns `(head, tail)` where `head` is `TITLE BODY1` and `tail` is
/// `TITLE BODY'`. The split offset is chosen among paragraph breaks of
/// `new` by maximising the similarity between `BODY` and the candidate
/// `BODY'`. Returns `None` when the titles differ, when the best split
/// would leave `BODY1` or `BODY'` empty, or when the best similarity
/// stays below [`STRICT_SIMILARITY_THRESHOLD`].
#[must_use]
pub fn try_split_merged_entry<'a>(
    old: &Entry<'a>,
    new: &Entry<'a>,
) -> Option<(Entry<'a>, Entry<'a>)> {
    let old_title_len = paragraph_end(old.bytes(), 0);
    let new_title_len = paragraph_end(new.bytes(), 0);
    if old_title_len != new_title_len
        || old.bytes()[..old_title_len] != new.bytes()[..new_title_len]
    {
        return None;
    }
    let old_body = &old.bytes()[old_title_len..];

    // Pick the paragraph break that leaves a tail most similar to the old
    // body; a perfect match cannot be improved on.
    let mut best_offset = new_title_len;
    let mut best = 0.0_f64;
    let mut offset = new_title_len;
    loop {
        let score = similarity(old_body, &new.bytes()[offset..], best);
        if score > best {
            best_offset = offset;
            best = score;
        }
        if best >= 1.0 {
            break;
        }
        if offset >= new.len() {
            break;
        }
        offset = paragraph_end(new.bytes(), offset + 1);
    }

    if best_offset == new.len() {
        // The split would leave nothing of the old body.
        return None;
    }
    if best_offset == new_title_len {
        // Nothing was glued on: the new entry is just an edit of the old
        // one. Splitting would shear off a title-only stub.
        return None;
    }
    debug_assert_eq!(new.bytes()[best_offset], b'\n');
    if best < STRICT_SIMILARITY_THRESHOLD {
        return None;
    }

    let head = new.slice(0..best_offset + 1);
    let mut combined = Vec::with_capacity(new_title_len + new.len() - best_offset);
    combined.extend_from_slice(&new.bytes()[..new_title_len]);
    combined.extend_from_slice(&new.bytes()[best_offset..]);
    Some((head, Entry::from_vec(combined)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
