//! Writing the merge result.
//!
//! Conflicts come first, with the same marker syntax the stock merge
//! driver uses, so they sit at the top of the file where nobody can miss
//! them. The merged entries follow byte for byte. Conflict contents are
//! not indented or decorated; decorations would just be more text for
//! the user to strip while resolving.

use std::io::{self, Write};

use crate::merge::types::{Conflict, MergeOutcome};

const CONFLICT_BEGIN: &[u8] = b"<<<<<<<\n";
const CONFLICT_SEPARATOR: &[u8] = b"=======\n";
const CONFLICT_END: &[u8] = b">>>>>>>\n";

/// Write one conflict block.
fn write_conflict<W: Write>(writer: &mut W, conflict: &Conflict<'_>) -> io::Result<()> {
    writer.write_all(CONFLICT_BEGIN)?;
    for entry in &conflict.ancestor {
        writer.write_all(entry.bytes())?;
    }
    writer.write_all(CONFLICT_SEPARATOR)?;
    for entry in &conflict.modified {
        writer.write_all(entry.bytes())?;
    }
    writer.write_all(CONFLICT_END)
}

/// Write the whole outcome: conflict blocks in order, then the merged
/// entries.
pub fn write_outcome<W: Write>(writer: &mut W, outcome: &MergeOutcome<'_>) -> io::Result<()> {
    for conflict in &outcome.conflicts {
        write_conflict(writer, conflict)?;
    }
    for entry in &outcome.entries {
        writer.write_all(entry.bytes())?;
    }
    Ok(())
}

/// The outcome as a byte buffer.
#[must_use]
pub fn render(outcome: &MergeOutcome<'_>) -> Vec<u8> {
    let mut buffer = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_outcome(&mut buffer, outcome);
    buffer
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
