//! Match history bookkeeping
//!
//! A candidate's `matches_played` holds everyone it was shown against in the
//! current review round. Both sides of a pairing are always recorded together.

use crate::types::Candidate;

/// Record that `a` and `b` have been shown together
pub fn record_pairing(a: &mut Candidate, b: &mut Candidate) {
    a.matches_played.insert(b.id.clone());
    b.matches_played.insert(a.id.clone());
}

/// Whether two candidates were already shown together in this round.
///
/// Both sides are checked so an asymmetric history written by another
/// process still blocks the repeat.
pub fn already_paired(a: &Candidate, b: &Candidate) -> bool {
    a.has_played(&b.id) || b.has_played(&a.id)
}

/// Clear every candidate's history, preserving rating and tallies
pub fn reset_all_histories(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    for candidate in candidates.iter_mut() {
        candidate.matches_played.clear();
    }
    candidates
}

/// Whether every distinct pair in the pool has already been shown
pub fn is_exhausted(candidates: &[Candidate]) -> bool {
    candidates.iter().enumerate().all(|(i, a)| {
        candidates[i + 1..]
            .iter()
            .all(|b| a.id == b.id || already_paired(a, b))
    })
}
