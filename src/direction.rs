//! Guessing the pull direction.
//!
//! Whether the destination file is the user's copy or the mainstream one
//! decides which side's new entries end up on top. Version control has no
//! inherent notion of upstream and downstream, so this is a heuristic
//! over environment variables set by the invoking tool; it is kept a pure
//! function of an injected lookup so it stays testable and replaceable.
//!
//! `GIT_DOWNSTREAM` and `GIT_UPSTREAM` let the user state the direction
//! outright. Failing those, `GIT_REFLOG_ACTION` distinguishes a plain
//! `git pull` (downstream) from stash applies, rebases and cherry-picks
//! (upstream).

/// Which way entries are flowing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Pulling published history into the user's copy: the destination
    /// file carries the user's modifications.
    Downstream,
    /// Replaying the user's work on top of published history: the
    /// destination file is the mainstream one.
    Upstream,
}

/// Determine the direction from an environment lookup.
pub fn detect(lookup: impl Fn(&str) -> Option<String>) -> Direction {
    if lookup("GIT_DOWNSTREAM").is_some_and(|value| !value.is_empty()) {
        return Direction::Downstream;
    }
    if lookup("GIT_UPSTREAM").is_some_and(|value| !value.is_empty()) {
        return Direction::Upstream;
    }
    match lookup("GIT_REFLOG_ACTION") {
        Some(action)
            if (action.starts_with("pull") && !action.contains(" --rebase"))
                || action.starts_with("merge origin") =>
        {
            Direction::Downstream
        }
        // Stash applies, rebases, cherry-picks and everything else.
        _ => Direction::Upstream,
    }
}

/// Determine the direction from the process environment.
#[must_use]
pub fn from_env() -> Direction {
    detect(|name| std::env::var(name).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
