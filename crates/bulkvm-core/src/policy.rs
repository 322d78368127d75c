//! Recovery policy over operation error payloads
//!
//! A deliberate replacement for "inspect only the first error": the
//! policy is a pure function over the full ordered entry list, so it can
//! be tested without I/O and callers cannot accidentally discard
//! diagnostics.

use crate::compute::types::{ErrorCode, ErrorEntry};

/// What a caller should do about a terminal operation's error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Empty error list: the operation succeeded.
    Proceed,
    /// Every entry is a naming collision: the requested resources already
    /// exist, treat the request as satisfied and move on.
    AlreadySatisfied,
    /// Capacity or quota exhaustion: retrying with different parameters
    /// (another zone, machine family, or region) can succeed.
    TryAlternative,
    /// At least one entry is not covered by a recovery rule; surface the
    /// whole list to the caller.
    Fail,
}

fn is_exhaustion(code: &ErrorCode) -> bool {
    matches!(code, ErrorCode::ResourceExhausted | ErrorCode::QuotaExceeded)
}

/// Map the full ordered error-entry list to a recovery action.
///
/// Rules, in order:
/// 1. no entries - `Proceed`;
/// 2. all entries are collisions - `AlreadySatisfied`;
/// 3. at least one exhaustion entry and every entry is either exhaustion
///    or a collision - `TryAlternative`;
/// 4. anything else - `Fail`.
#[must_use]
pub fn classify(entries: &[ErrorEntry]) -> RecoveryAction {
    if entries.is_empty() {
        return RecoveryAction::Proceed;
    }

    let all_collisions = entries
        .iter()
        .all(|e| e.code == ErrorCode::ResourceAlreadyExists);
    if all_collisions {
        return RecoveryAction::AlreadySatisfied;
    }

    let any_exhaustion = entries.iter().any(|e| is_exhaustion(&e.code));
    let all_recoverable = entries
        .iter()
        .all(|e| is_exhaustion(&e.code) || e.code == ErrorCode::ResourceAlreadyExists);
    if any_exhaustion && all_recoverable {
        return RecoveryAction::TryAlternative;
    }

    RecoveryAction::Fail
}
